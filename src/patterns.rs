//! Candidate filename generation for a logical page number.
//!
//! Filenames on the asset server follow several conventions and nothing
//! enumerates them, so the resolver probes a generated list instead:
//!
//! - `<n>.<ext>` single page
//! - `<a>-<b>.<ext>` combined pages
//! - `<name> <n>.<ext>` / `<name> <a>-<b>.<ext>` category-prefixed variants
//!
//! Candidates come out most-specific first so sequential probing stops early.
//! Combined ranges are ordered narrowest first, except for irregular ranges
//! listed in the registry, which always lead.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{AssetPath, Candidate, Category, CategoryRegistry, ImageExtension};

/// Default widest combined file considered by the wide policy.
pub const DEFAULT_MAX_COMBINED_WIDTH: u32 = 6;

/// How much of the filename space to enumerate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternPolicy {
    /// Irregular ranges, single page, and two-page pairs only.
    #[default]
    Narrow,
    /// Narrow set plus combined files up to `max_width` pages and
    /// category-name-prefixed variants.
    Wide,
}

impl PatternPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Wide => "wide",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "narrow" => Some(Self::Narrow),
            "wide" => Some(Self::Wide),
            _ => None,
        }
    }
}

/// Produces the ordered candidate list for one number.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    registry: CategoryRegistry,
    policy: PatternPolicy,
    max_width: u32,
}

impl PatternGenerator {
    pub fn new(registry: CategoryRegistry, policy: PatternPolicy) -> Self {
        Self {
            registry,
            policy,
            max_width: DEFAULT_MAX_COMBINED_WIDTH,
        }
    }

    /// Set the widest combined file the wide policy considers (minimum 2).
    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width.max(2);
        self
    }

    /// Enumerate candidates for `number` in probe order.
    ///
    /// Never empty: the unprefixed single-page candidate is always present.
    pub fn generate(&self, category: &Category, number: u32) -> Vec<Candidate> {
        let mut out = CandidateList::new(&category.folder);

        for range in self.registry.irregular_for(&category.id, number) {
            out.push_combined("", range.first, range.last);
        }

        out.push_single("", number);

        if number > 1 {
            out.push_combined("", number - 1, number);
        }
        if number < category.total {
            out.push_combined("", number, number + 1);
        }

        if self.policy == PatternPolicy::Wide {
            for width in 3..=self.max_width {
                for (first, last) in windows(number, width, category.total) {
                    out.push_combined("", first, last);
                }
            }

            let prefix = format!("{} ", category.name);
            out.push_single(&prefix, number);
            for width in 2..=self.max_width {
                for (first, last) in windows(number, width, category.total) {
                    out.push_combined(&prefix, first, last);
                }
            }
        }

        let candidates = out.finish();
        debug!(
            "{} #{}: {} candidate(s) ({})",
            category.id,
            number,
            candidates.len(),
            self.policy.as_str()
        );
        candidates
    }
}

/// Every `(first, last)` window of `width` pages containing `number`,
/// clipped to `1..=total`, lowest start first.
fn windows(number: u32, width: u32, total: u32) -> impl Iterator<Item = (u32, u32)> {
    let lowest = number.saturating_sub(width - 1).max(1);
    (lowest..=number)
        .map(move |first| (first, first + width - 1))
        .filter(move |&(_, last)| last <= total)
}

/// Accumulates candidates, expanding extensions and dropping repeated filenames.
struct CandidateList<'a> {
    folder: &'a str,
    seen: HashSet<String>,
    candidates: Vec<Candidate>,
}

impl<'a> CandidateList<'a> {
    fn new(folder: &'a str) -> Self {
        Self {
            folder,
            seen: HashSet::new(),
            candidates: Vec::new(),
        }
    }

    fn push_single(&mut self, prefix: &str, number: u32) {
        for ext in ImageExtension::ALL {
            let file = format!("{}{}.{}", prefix, number, ext.as_str());
            if self.seen.insert(file.clone()) {
                self.candidates
                    .push(Candidate::single(AssetPath::new(self.folder, file), number));
            }
        }
    }

    fn push_combined(&mut self, prefix: &str, first: u32, last: u32) {
        for ext in ImageExtension::ALL {
            let file = format!("{}{}-{}.{}", prefix, first, last, ext.as_str());
            if self.seen.insert(file.clone()) {
                self.candidates.push(Candidate::combined(
                    AssetPath::new(self.folder, file),
                    first,
                    last,
                ));
            }
        }
    }

    fn finish(self) -> Vec<Candidate> {
        self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateKind;

    fn files(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.path.file.as_str()).collect()
    }

    fn chansongga() -> Category {
        Category::new("chansongga", "찬송가", 559, "chansongga")
    }

    #[test]
    fn test_narrow_order_for_middle_number() {
        let generator = PatternGenerator::new(CategoryRegistry::default(), PatternPolicy::Narrow);
        let candidates = generator.generate(&chansongga(), 100);
        assert_eq!(
            files(&candidates),
            vec![
                "100.jpeg",
                "100.jpg",
                "99-100.jpeg",
                "99-100.jpg",
                "100-101.jpeg",
                "100-101.jpg",
            ]
        );
        assert_eq!(candidates[0].kind, CandidateKind::Single);
        assert_eq!(candidates[2].covered(), 99..=100);
        assert_eq!(candidates[4].covered(), 100..=101);
        assert!(candidates.iter().all(|c| c.path.folder == "chansongga"));
    }

    #[test]
    fn test_first_number_has_no_backward_pair() {
        let generator = PatternGenerator::new(CategoryRegistry::default(), PatternPolicy::Narrow);
        let candidates = generator.generate(&chansongga(), 1);
        assert_eq!(
            files(&candidates),
            vec!["1.jpeg", "1.jpg", "1-2.jpeg", "1-2.jpg"]
        );
    }

    #[test]
    fn test_last_number_has_no_forward_pair() {
        let generator = PatternGenerator::new(CategoryRegistry::default(), PatternPolicy::Narrow);
        let candidates = generator.generate(&chansongga(), 559);
        assert_eq!(
            files(&candidates),
            vec!["559.jpeg", "559.jpg", "558-559.jpeg", "558-559.jpg"]
        );
    }

    #[test]
    fn test_single_page_category_yields_only_single() {
        let registry = CategoryRegistry::empty();
        let category = Category::new("solo", "Solo", 1, "solo");
        let generator = PatternGenerator::new(registry, PatternPolicy::Wide);
        let candidates = generator.generate(&category, 1);
        assert_eq!(files(&candidates), vec!["1.jpeg", "1.jpg", "Solo 1.jpeg", "Solo 1.jpg"]);
    }

    #[test]
    fn test_irregular_range_leads_inside_its_span() {
        let generator = PatternGenerator::new(CategoryRegistry::default(), PatternPolicy::Narrow);
        let candidates = generator.generate(&chansongga(), 553);
        assert_eq!(candidates[0].path.file, "551-556.jpeg");
        assert_eq!(candidates[1].path.file, "551-556.jpg");
        assert_eq!(candidates[0].covered(), 551..=556);
        assert_eq!(candidates[2].path.file, "553.jpeg");

        let outside = generator.generate(&chansongga(), 550);
        assert!(outside.iter().all(|c| !c.path.file.starts_with("551-556")));
    }

    #[test]
    fn test_irregular_range_ignored_for_other_category() {
        let generator = PatternGenerator::new(CategoryRegistry::default(), PatternPolicy::Narrow);
        let eunhae = Category::new("eunhae", "은혜찬송", 559, "eunhae");
        let candidates = generator.generate(&eunhae, 553);
        assert_eq!(candidates[0].path.file, "553.jpeg");
    }

    #[test]
    fn test_wide_policy_adds_widths_and_prefixes() {
        let generator = PatternGenerator::new(CategoryRegistry::default(), PatternPolicy::Wide)
            .with_max_width(3);
        let candidates = generator.generate(&chansongga(), 2);
        assert_eq!(
            files(&candidates),
            vec![
                "2.jpeg",
                "2.jpg",
                "1-2.jpeg",
                "1-2.jpg",
                "2-3.jpeg",
                "2-3.jpg",
                "1-3.jpeg",
                "1-3.jpg",
                "2-4.jpeg",
                "2-4.jpg",
                "찬송가 2.jpeg",
                "찬송가 2.jpg",
                "찬송가 1-2.jpeg",
                "찬송가 1-2.jpg",
                "찬송가 2-3.jpeg",
                "찬송가 2-3.jpg",
                "찬송가 1-3.jpeg",
                "찬송가 1-3.jpg",
                "찬송가 2-4.jpeg",
                "찬송가 2-4.jpg",
            ]
        );
    }

    #[test]
    fn test_wide_policy_does_not_repeat_irregular_range() {
        let generator = PatternGenerator::new(CategoryRegistry::default(), PatternPolicy::Wide);
        let candidates = generator.generate(&chansongga(), 556);
        let count = candidates
            .iter()
            .filter(|c| c.path.file == "551-556.jpg")
            .count();
        assert_eq!(count, 1);
        assert!(candidates.iter().all(|c| c.last() <= 559));
    }

    #[test]
    fn test_windows_clip_to_bounds() {
        let all: Vec<_> = windows(2, 3, 3).collect();
        assert_eq!(all, vec![(1, 3)]);
        let all: Vec<_> = windows(5, 2, 10).collect();
        assert_eq!(all, vec![(4, 5), (5, 6)]);
    }
}
