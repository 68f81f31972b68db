//! Outbound notifications for the UI layer.

use serde::{Deserialize, Serialize};

use crate::models::DisplaySlot;

/// Session-level activity signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
}

/// Everything the UI layer needs to mirror session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A category became active; show its name and number range.
    Welcome { category: String, name: String, total: u32 },
    Status { status: SessionStatus },
    SlotCreated { number: u32 },
    SlotResolved { slot: DisplaySlot },
    /// `number` is hidden under the combined image rendered by slot `by`.
    SlotSuppressed { number: u32, by: u32 },
    SlotRevealed { number: u32 },
    /// Bring the slot with this key into view.
    ScrollTo { key: u32 },
    ValidationError { message: String },
}
