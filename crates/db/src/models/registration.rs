//! Registration entity models.

use std::collections::BTreeMap;

use serde::Serialize;
use slotbook_core::identity::ParticipantIdentity;
use slotbook_core::selection::PerDaySelection;
use slotbook_core::types::{DayIndex, DbId, SlotId, Timestamp};
use sqlx::FromRow;

/// A row from the `registrations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Registration {
    pub id: DbId,
    pub event_id: DbId,
    #[serde(skip_serializing)]
    pub identity_key: String,
    pub source_reference: Option<DbId>,
    pub member_id: Option<String>,
    pub full_name: String,
    pub country_code: Option<String>,
    pub mobile_number: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `registration_slots` table: one held seat.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RegistrationSlot {
    pub registration_id: DbId,
    pub slot_id: SlotId,
    pub day: DayIndex,
    pub position: i32,
}

/// Rebuild a per-day selection from held seats, keeping submission order.
pub fn selection_from_rows(rows: &[RegistrationSlot]) -> PerDaySelection {
    let mut sorted: Vec<&RegistrationSlot> = rows.iter().collect();
    sorted.sort_by_key(|r| (r.day, r.position));
    PerDaySelection::from_days(sorted.into_iter().map(|r| (r.day, vec![r.slot_id])))
}

/// A registration as returned by search: stored slots plus their labels.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationSummary {
    pub id: DbId,
    pub full_name: String,
    pub mobile_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    #[serde(flatten)]
    pub selection: PerDaySelection,
    /// `dayN` -> comma-joined slot labels, `-` for an empty day.
    pub slot_times: BTreeMap<String, String>,
}

/// Values written when a registration is inserted or its identity updated.
#[derive(Debug, Clone, Copy)]
pub struct NewRegistration<'a> {
    pub event_id: DbId,
    pub identity_key: &'a str,
    pub source_reference: Option<DbId>,
    pub identity: &'a ParticipantIdentity,
}
