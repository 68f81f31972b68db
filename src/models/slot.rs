//! Display slots: one per rendered logical unit.

use serde::{Deserialize, Serialize};

use super::AssetPath;

/// A resolved image shown inside a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotImage {
    pub path: AssetPath,
    /// Alt text, e.g. `"100"`, `"200-201"`, `"100 (page 2)"`.
    pub label: String,
}

/// What a slot currently renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SlotContent {
    /// Resolution not finished yet.
    Placeholder,
    /// Main image followed by any continuation pages.
    Images { images: Vec<SlotImage> },
    /// Every candidate was probed and none exists.
    NotFound,
}

/// A layout slot created before probing starts so visual order stays stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySlot {
    /// Logical number the slot was created for.
    pub number: u32,
    /// Identity of the slot. Re-keyed to the lower bound of a combined range
    /// when `number` joined a range starting earlier.
    pub key: u32,
    /// Last logical number this slot renders (equals `key` unless combined).
    pub last: u32,
    pub content: SlotContent,
    /// Slot number of the combined winner that hides this slot, if any.
    pub suppressed_by: Option<u32>,
}

impl DisplaySlot {
    pub fn placeholder(number: u32) -> Self {
        Self {
            number,
            key: number,
            last: number,
            content: SlotContent::Placeholder,
            suppressed_by: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, SlotContent::Placeholder)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.content, SlotContent::NotFound)
    }

    pub fn is_visible(&self) -> bool {
        self.suppressed_by.is_none()
    }

    /// Whether the slot is settled: anything except a pending placeholder,
    /// or hidden under another slot's combined image.
    pub fn is_settled(&self) -> bool {
        !self.is_visible() || !self.is_placeholder()
    }

    pub fn images(&self) -> &[SlotImage] {
        match &self.content {
            SlotContent::Images { images } => images,
            _ => &[],
        }
    }

    /// Whether this visible slot renders logical `number`.
    pub fn renders(&self, number: u32) -> bool {
        self.is_visible() && number >= self.key && number <= self.last
    }
}
