//! Slot entity model.

use serde::{Deserialize, Serialize};
use slotbook_core::availability::AvailabilitySlot;
use slotbook_core::types::{DayIndex, DbId, SlotId, Timestamp};
use sqlx::FromRow;

/// A row from the `slots` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Slot {
    pub id: SlotId,
    pub event_id: DbId,
    pub day: DayIndex,
    pub slot_time: String,
    pub sort_order: i32,
    pub max_capacity: i32,
    pub registration_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Slot> for AvailabilitySlot {
    fn from(slot: Slot) -> Self {
        AvailabilitySlot {
            id: slot.id,
            day: slot.day,
            slot_time: slot.slot_time,
            max_capacity: slot.max_capacity,
            registration_count: slot.registration_count,
        }
    }
}

/// DTO for creating a slot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlot {
    pub day: DayIndex,
    pub slot_time: String,
    pub sort_order: Option<i32>,
    pub max_capacity: i32,
}

/// Slot id with its display label.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SlotLabel {
    pub id: SlotId,
    pub slot_time: String,
}
