//! Candidate asset filenames and the logical numbers they would satisfy.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Raster image suffixes the asset server is known to use.
///
/// Both suffixes carry the same content; every filename variant is still
/// probed separately since only one of them exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageExtension {
    Jpeg,
    Jpg,
}

impl ImageExtension {
    /// Probe order for every filename variant.
    pub const ALL: [ImageExtension; 2] = [ImageExtension::Jpeg, ImageExtension::Jpg];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Jpg => "jpg",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" => Some(Self::Jpeg),
            "jpg" => Some(Self::Jpg),
            _ => None,
        }
    }
}

/// Asset location relative to the images directory: `<folder>/<file>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPath {
    pub folder: String,
    pub file: String,
}

impl AssetPath {
    pub fn new(folder: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            file: file.into(),
        }
    }

    /// Path relative to the server root, e.g. `images/chansongga/100.jpg`.
    pub fn under(&self, images_dir: &str) -> String {
        let images_dir = images_dir.trim_matches('/');
        if images_dir.is_empty() {
            self.to_string()
        } else {
            format!("{}/{}", images_dir, self)
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.folder, self.file)
    }
}

/// Whether a candidate file depicts one logical page or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Single,
    Combined,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Combined => "combined",
        }
    }
}

/// A hypothesized asset filename plus the logical numbers it covers.
///
/// The covered range is contiguous and never empty; `first <= last` is
/// enforced by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub path: AssetPath,
    pub kind: CandidateKind,
    first: u32,
    last: u32,
}

impl Candidate {
    /// A file holding exactly one logical page.
    pub fn single(path: AssetPath, number: u32) -> Self {
        Self {
            path,
            kind: CandidateKind::Single,
            first: number,
            last: number,
        }
    }

    /// A file holding the consecutive pages `first..=last`.
    ///
    /// Bounds given in the wrong order are swapped.
    pub fn combined(path: AssetPath, first: u32, last: u32) -> Self {
        let (first, last) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        Self {
            path,
            kind: CandidateKind::Combined,
            first,
            last,
        }
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }

    pub fn covered(&self) -> RangeInclusive<u32> {
        self.first..=self.last
    }

    pub fn covers(&self, number: u32) -> bool {
        self.covered().contains(&number)
    }

    pub fn is_combined(&self) -> bool {
        self.kind == CandidateKind::Combined
    }

    /// Human-readable label for the rendered image (`"551-556"` or `"100"`).
    pub fn label(&self) -> String {
        if self.first == self.last {
            self.first.to_string()
        } else {
            format!("{}-{}", self.first, self.last)
        }
    }
}
