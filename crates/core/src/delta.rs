//! Difference between a participant's stored slots and a new selection.

use std::collections::BTreeSet;

use crate::types::SlotId;

/// Slots whose counters must move when a registration is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotDelta {
    /// In the new selection only; each needs a free seat.
    pub to_add: BTreeSet<SlotId>,
    /// In the old selection only; each gives its seat back.
    pub to_remove: BTreeSet<SlotId>,
}

impl SlotDelta {
    pub fn between(old: &BTreeSet<SlotId>, new: &BTreeSet<SlotId>) -> Self {
        Self {
            to_add: new.difference(old).copied().collect(),
            to_remove: old.difference(new).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
