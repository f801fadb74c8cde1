//! Event entity model.

use serde::{Deserialize, Serialize};
use slotbook_core::error::CoreError;
use slotbook_core::event::{EventConfig, IdentityKey};
use slotbook_core::types::{DayIndex, DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub slug: String,
    pub label: String,
    pub action_code: String,
    pub day_count: DayIndex,
    pub max_per_day: i32,
    pub identity_kind: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Event {
    /// Typed configuration of the event.
    ///
    /// Fails only if the row holds values the schema checks should have
    /// rejected.
    pub fn config(&self) -> Result<EventConfig, CoreError> {
        let identity: IdentityKey = self.identity_kind.parse()?;
        let max_per_day = usize::try_from(self.max_per_day).map_err(|_| {
            CoreError::Internal(format!(
                "event {} has negative max_per_day {}",
                self.slug, self.max_per_day
            ))
        })?;
        Ok(EventConfig {
            id: self.id,
            slug: self.slug.clone(),
            label: self.label.clone(),
            action_code: self.action_code.clone(),
            day_count: self.day_count,
            max_per_day,
            identity,
        })
    }
}

/// DTO for creating an event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub slug: String,
    pub label: String,
    pub action_code: String,
    pub day_count: DayIndex,
    pub max_per_day: Option<i32>,
    pub identity: Option<IdentityKey>,
}
