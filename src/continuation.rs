//! Trailing pages attached to a single-page hymn (`<n>-1.jpg`, `<n>-2.jpg`, ...).

use tracing::debug;

use crate::models::{AssetPath, Category, ImageExtension};
use crate::probe::Probe;

/// Default number of continuation pages looked for after a single-page win.
pub const DEFAULT_CONTINUATION_DEPTH: u32 = 2;

/// Probes `<n>-<page>.<ext>` for `page = 1, 2, ...` while pages keep turning up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationScanner {
    max_depth: u32,
    prefixed: bool,
}

impl Default for ContinuationScanner {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_CONTINUATION_DEPTH,
            prefixed: false,
        }
    }
}

impl ContinuationScanner {
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    /// Also try `<category name> <n>-<page>.<ext>`.
    pub fn with_prefixed(mut self, prefixed: bool) -> Self {
        self.prefixed = prefixed;
        self
    }

    /// Filenames tried for one page index, in probe order.
    pub fn page_candidates(&self, category: &Category, number: u32, page: u32) -> Vec<AssetPath> {
        let mut files: Vec<String> = ImageExtension::ALL
            .iter()
            .map(|ext| format!("{}-{}.{}", number, page, ext.as_str()))
            .collect();
        if self.prefixed {
            files.extend(
                ImageExtension::ALL
                    .iter()
                    .map(|ext| format!("{} {}-{}.{}", category.name, number, page, ext.as_str())),
            );
        }
        files
            .into_iter()
            .map(|file| AssetPath::new(category.folder.as_str(), file))
            .collect()
    }

    /// Collect continuation pages for `number`, stopping at the first page
    /// index with no hit or at the depth ceiling.
    pub async fn scan(&self, probe: &dyn Probe, category: &Category, number: u32) -> Vec<AssetPath> {
        let mut found = Vec::new();

        for page in 1..=self.max_depth {
            let mut hit = None;
            for path in self.page_candidates(category, number, page) {
                if probe.probe(&path).await.is_found() {
                    hit = Some(path);
                    break;
                }
            }

            match hit {
                Some(path) => {
                    debug!("#{} continuation page {} found: {}", number, page, path);
                    found.push(path);
                }
                None => break,
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::MemoryProbe;

    fn category() -> Category {
        Category::new("chansongga", "찬송가", 559, "chansongga")
    }

    #[tokio::test]
    async fn test_no_continuation() {
        let probe = MemoryProbe::with_assets(["chansongga/100.jpg"]);
        let pages = ContinuationScanner::default()
            .scan(&probe, &category(), 100)
            .await;
        assert!(pages.is_empty());
        assert_eq!(
            probe.probed_paths(),
            vec!["chansongga/100-1.jpeg", "chansongga/100-1.jpg"]
        );
    }

    #[tokio::test]
    async fn test_chain_stops_at_gap() {
        let probe = MemoryProbe::with_assets([
            "chansongga/7-1.jpg",
            "chansongga/7-3.jpg",
        ]);
        let pages = ContinuationScanner::new(5).scan(&probe, &category(), 7).await;
        assert_eq!(pages, vec![AssetPath::new("chansongga", "7-1.jpg")]);
    }

    #[tokio::test]
    async fn test_chain_bounded_by_depth() {
        let probe = MemoryProbe::with_assets([
            "chansongga/7-1.jpeg",
            "chansongga/7-2.jpg",
            "chansongga/7-3.jpg",
        ]);
        let pages = ContinuationScanner::default().scan(&probe, &category(), 7).await;
        assert_eq!(
            pages,
            vec![
                AssetPath::new("chansongga", "7-1.jpeg"),
                AssetPath::new("chansongga", "7-2.jpg"),
            ]
        );
    }

    #[tokio::test]
    async fn test_prefixed_variant() {
        let probe = MemoryProbe::with_assets(["chansongga/찬송가 9-1.jpg"]);
        let scanner = ContinuationScanner::new(1).with_prefixed(true);
        let pages = scanner.scan(&probe, &category(), 9).await;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].file, "찬송가 9-1.jpg");
    }

    #[tokio::test]
    async fn test_zero_depth_probes_nothing() {
        let probe = MemoryProbe::with_assets(["chansongga/7-1.jpg"]);
        let pages = ContinuationScanner::new(0).scan(&probe, &category(), 7).await;
        assert!(pages.is_empty());
        assert_eq!(probe.probe_count(), 0);
    }
}
