//! Domain models for the hymn viewer core.

mod candidate;
mod category;
mod slot;

pub use candidate::{AssetPath, Candidate, CandidateKind, ImageExtension};
pub use category::{Category, CategoryRegistry, IrregularRange};
pub use slot::{DisplaySlot, SlotContent, SlotImage};
