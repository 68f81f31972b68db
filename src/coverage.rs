//! Logical numbers already satisfied within the current session.

use std::collections::BTreeSet;

/// Set of covered logical page numbers.
///
/// Grows monotonically during a session and is cleared only at a session
/// boundary (category switch or fresh search).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageSet {
    numbers: BTreeSet<u32>,
}

impl CoverageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark numbers covered. Returns how many were not covered before.
    pub fn add<I: IntoIterator<Item = u32>>(&mut self, numbers: I) -> usize {
        numbers
            .into_iter()
            .filter(|n| self.numbers.insert(*n))
            .count()
    }

    pub fn contains(&self, number: u32) -> bool {
        self.numbers.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn clear(&mut self) {
        self.numbers.clear();
    }

    /// Covered numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.numbers.iter().copied()
    }
}
