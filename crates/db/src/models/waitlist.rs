//! Waitlist entity model.

use serde::Serialize;
use slotbook_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `waitlist_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WaitlistEntry {
    pub id: DbId,
    pub event_id: DbId,
    pub member_id: String,
    pub full_name: String,
    pub country_code: String,
    pub mobile_number: String,
    pub created_at: Timestamp,
}
