//! Probe against a local mirror of the asset server.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::{Probe, ProbeOutcome, SNIFF_LEN};
use crate::models::AssetPath;

/// Resolves `<root>/<images_dir>/<folder>/<file>` on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsProbe {
    root: PathBuf,
    images_dir: String,
}

impl FsProbe {
    pub fn new(root: impl Into<PathBuf>, images_dir: &str) -> Self {
        Self {
            root: root.into(),
            images_dir: images_dir.trim_matches('/').to_string(),
        }
    }

    fn full_path(&self, path: &AssetPath) -> PathBuf {
        let mut full = self.root.clone();
        if !self.images_dir.is_empty() {
            full.push(&self.images_dir);
        }
        full.push(&path.folder);
        full.push(&path.file);
        full
    }
}

#[async_trait]
impl Probe for FsProbe {
    async fn check(&self, path: &AssetPath) -> ProbeOutcome {
        let full = self.full_path(path);

        let mut file = match tokio::fs::File::open(&full).await {
            Ok(f) => f,
            Err(_) => return ProbeOutcome::NotFound,
        };

        let mut buf = [0u8; SNIFF_LEN];
        let read = match file.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                debug!("Failed to read {}: {}", full.display(), e);
                return ProbeOutcome::NotFound;
            }
        };

        if infer::is_image(&buf[..read]) {
            ProbeOutcome::Found
        } else {
            debug!("{} exists but is not an image", full.display());
            ProbeOutcome::NotFound
        }
    }

    fn locate(&self, path: &AssetPath) -> String {
        self.full_path(path).display().to_string()
    }
}
