use std::collections::BTreeSet;

use crate::domain::entities::address::AddressRange;

/// Distinct grid regions modified since the last commit or revert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyLedger {
    ranges: BTreeSet<AddressRange>,
}

impl DirtyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the range was already recorded.
    pub fn record(&mut self, range: AddressRange) -> bool {
        self.ranges.insert(range)
    }

    pub fn contains(&self, range: &AddressRange) -> bool {
        self.ranges.contains(range)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AddressRange> {
        self.ranges.iter()
    }

    /// Empty the ledger, handing back what it held.
    pub fn drain(&mut self) -> Vec<AddressRange> {
        std::mem::take(&mut self.ranges).into_iter().collect()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}
