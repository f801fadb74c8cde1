//! Slot availability as served to clients.

use serde::{Deserialize, Serialize};

use crate::types::{DayIndex, SlotId};

/// One bookable time unit of one day of an event, with its current counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: SlotId,
    pub day: DayIndex,
    pub slot_time: String,
    pub max_capacity: i32,
    pub registration_count: i32,
}

impl AvailabilitySlot {
    /// Seats still free. Never negative.
    pub fn remaining(&self) -> i32 {
        (self.max_capacity - self.registration_count).max(0)
    }

    /// Whether the slot has no seats left.
    pub fn is_full(&self) -> bool {
        self.registration_count >= self.max_capacity
    }
}

/// True when no slot of the event can take another registrant.
///
/// An event without any slots counts as fully booked, which routes
/// submissions to the waitlist.
pub fn no_slots_available(slots: &[AvailabilitySlot]) -> bool {
    slots.iter().all(AvailabilitySlot::is_full)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: SlotId, max_capacity: i32, registration_count: i32) -> AvailabilitySlot {
        AvailabilitySlot {
            id,
            day: 1,
            slot_time: format!("slot {id}"),
            max_capacity,
            registration_count,
        }
    }

    #[test]
    fn remaining_is_clamped() {
        assert_eq!(slot(1, 3, 1).remaining(), 2);
        assert_eq!(slot(1, 2, 2).remaining(), 0);
        assert_eq!(slot(1, 0, 0).remaining(), 0);
    }

    #[test]
    fn full_when_count_reaches_capacity() {
        assert!(slot(5, 2, 2).is_full());
        assert!(!slot(5, 2, 1).is_full());
        assert!(slot(5, 0, 0).is_full());
    }

    #[test]
    fn no_slots_available_requires_every_slot_full() {
        assert!(no_slots_available(&[slot(1, 1, 1), slot(2, 2, 2)]));
        assert!(!no_slots_available(&[slot(1, 1, 1), slot(2, 2, 1)]));
        assert!(no_slots_available(&[]));
    }
}
