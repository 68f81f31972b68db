//! Resolves a logical page number to the asset that actually depicts it.
//!
//! The resolver enumerates candidates, probes them under the configured
//! strategy, and reports the winner together with any continuation pages.
//! It never touches session state: applying the outcome (coverage, slot
//! re-keying, sibling suppression) is the session's job.

mod race;

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::continuation::ContinuationScanner;
use crate::models::{AssetPath, Candidate, Category};
use crate::patterns::PatternGenerator;
use crate::probe::BoxedProbe;

/// How candidates are probed for one number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStrategy {
    /// One outstanding probe at a time, in generation order; stop at the first hit.
    #[default]
    Sequential,
    /// All probes at once; the first hit to arrive wins.
    Parallel,
}

impl ProbeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Parallel => "parallel",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sequential" => Some(Self::Sequential),
            "parallel" => Some(Self::Parallel),
            _ => None,
        }
    }
}

/// Terminal outcome of resolving one number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub number: u32,
    /// Winning candidate, or `None` when every probe missed.
    pub winner: Option<Candidate>,
    /// Continuation pages found after a single-page win.
    pub continuations: Vec<AssetPath>,
    /// Candidates generated for the number.
    pub candidates: usize,
    pub elapsed_ms: u64,
}

impl Resolution {
    pub fn not_found(number: u32, candidates: usize, elapsed: Duration) -> Self {
        Self {
            number,
            winner: None,
            continuations: Vec::new(),
            candidates,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn is_found(&self) -> bool {
        self.winner.is_some()
    }

    /// Numbers satisfied by this outcome: the winner's range, or `number` alone.
    pub fn covered(&self) -> RangeInclusive<u32> {
        match &self.winner {
            Some(candidate) => candidate.covered(),
            None => self.number..=self.number,
        }
    }

    pub fn is_combined(&self) -> bool {
        self.winner.as_ref().is_some_and(|c| c.is_combined())
    }

    pub fn has_continuation(&self) -> bool {
        !self.continuations.is_empty()
    }
}

/// Drives probes across the generated candidates for one number.
pub struct Resolver {
    probe: BoxedProbe,
    generator: PatternGenerator,
    strategy: ProbeStrategy,
    continuation: ContinuationScanner,
}

impl Resolver {
    pub fn new(probe: BoxedProbe, generator: PatternGenerator, strategy: ProbeStrategy) -> Self {
        Self {
            probe,
            generator,
            strategy,
            continuation: ContinuationScanner::default(),
        }
    }

    pub fn with_continuation(mut self, scanner: ContinuationScanner) -> Self {
        self.continuation = scanner;
        self
    }

    /// Resolve `number` within `category`. Never fails: exhausted or
    /// timed-out candidates produce a not-found resolution.
    pub async fn resolve(&self, category: &Category, number: u32) -> Resolution {
        let start = Instant::now();
        let candidates = self.generator.generate(category, number);

        let hit = match self.strategy {
            ProbeStrategy::Sequential => self.first_found_sequential(&candidates).await,
            ProbeStrategy::Parallel => race::first_found(&self.probe, &candidates).await,
        };

        let Some((index, winner)) = hit else {
            warn!("#{}: no image ({} candidates)", number, candidates.len());
            return Resolution::not_found(number, candidates.len(), start.elapsed());
        };

        info!(
            "#{} [{}/{}] found {} ({}ms)",
            number,
            index + 1,
            candidates.len(),
            winner.path,
            start.elapsed().as_millis()
        );

        let continuations = if winner.is_combined() {
            Vec::new()
        } else {
            self.continuation
                .scan(self.probe.as_ref(), category, number)
                .await
        };

        Resolution {
            number,
            winner: Some(winner),
            continuations,
            candidates: candidates.len(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn first_found_sequential(&self, candidates: &[Candidate]) -> Option<(usize, Candidate)> {
        for (index, candidate) in candidates.iter().enumerate() {
            if self.probe.probe(&candidate.path).await.is_found() {
                return Some((index, candidate.clone()));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::models::{CandidateKind, CategoryRegistry};
    use crate::patterns::PatternPolicy;
    use crate::probe::MemoryProbe;

    fn category() -> Category {
        Category::new("chansongga", "찬송가", 559, "chansongga")
    }

    fn resolver(probe: Arc<MemoryProbe>, strategy: ProbeStrategy) -> Resolver {
        Resolver::new(
            probe,
            PatternGenerator::new(CategoryRegistry::default(), PatternPolicy::Narrow),
            strategy,
        )
    }

    #[tokio::test]
    async fn test_single_page_win_without_continuation() {
        let probe = Arc::new(MemoryProbe::with_assets(["chansongga/100.jpg"]));
        let resolution = resolver(probe.clone(), ProbeStrategy::Sequential)
            .resolve(&category(), 100)
            .await;

        let winner = resolution.winner.as_ref().unwrap();
        assert_eq!(winner.kind, CandidateKind::Single);
        assert_eq!(winner.path.file, "100.jpg");
        assert_eq!(resolution.covered(), 100..=100);
        assert!(!resolution.has_continuation());
        assert_eq!(
            probe.probed_paths(),
            vec![
                "chansongga/100.jpeg",
                "chansongga/100.jpg",
                "chansongga/100-1.jpeg",
                "chansongga/100-1.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn test_combined_win_from_either_end() {
        let probe = Arc::new(MemoryProbe::with_assets(["chansongga/200-201.jpg"]));
        let resolver = resolver(probe, ProbeStrategy::Sequential);

        let first = resolver.resolve(&category(), 200).await;
        let second = resolver.resolve(&category(), 201).await;

        assert_eq!(first.winner, second.winner);
        assert!(first.is_combined());
        assert_eq!(first.covered(), 200..=201);
        assert!(first.continuations.is_empty());
    }

    #[tokio::test]
    async fn test_sequential_prefers_generation_order() {
        let probe = Arc::new(MemoryProbe::with_assets([
            "chansongga/50.jpg",
            "chansongga/49-50.jpeg",
        ]));
        let resolution = resolver(probe, ProbeStrategy::Sequential)
            .resolve(&category(), 50)
            .await;
        assert_eq!(resolution.winner.unwrap().path.file, "50.jpg");
    }

    #[tokio::test]
    async fn test_parallel_finds_only_existing_candidate() {
        let probe = Arc::new(MemoryProbe::with_assets(["chansongga/300-301.jpeg"]));
        let resolution = resolver(probe.clone(), ProbeStrategy::Parallel)
            .resolve(&category(), 301)
            .await;
        assert_eq!(resolution.covered(), 300..=301);
        assert!(probe.probe_count() >= 1);
    }

    #[tokio::test]
    async fn test_not_found_covers_number_alone() {
        let probe = Arc::new(MemoryProbe::new());
        for strategy in [ProbeStrategy::Sequential, ProbeStrategy::Parallel] {
            let resolution = resolver(probe.clone(), strategy)
                .resolve(&category(), 42)
                .await;
            assert!(!resolution.is_found());
            assert_eq!(resolution.covered(), 42..=42);
            assert_eq!(resolution.candidates, 6);
        }
    }

    #[tokio::test]
    async fn test_continuation_collected_after_single_win() {
        let probe = Arc::new(MemoryProbe::with_assets([
            "chansongga/12.jpeg",
            "chansongga/12-1.jpg",
        ]));
        let resolution = resolver(probe, ProbeStrategy::Parallel)
            .resolve(&category(), 12)
            .await;
        assert_eq!(
            resolution.continuations,
            vec![AssetPath::new("chansongga", "12-1.jpg")]
        );
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(ProbeStrategy::from_str("parallel"), Some(ProbeStrategy::Parallel));
        assert_eq!(ProbeStrategy::from_str("fast"), None);
    }
}
