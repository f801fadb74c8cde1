//! Repository for the `events` table.

use slotbook_core::constraints::DEFAULT_MAX_PER_DAY;
use slotbook_core::event::IdentityKey;
use sqlx::PgPool;

use crate::models::event::{CreateEvent, Event};

/// Column list for `events` queries.
const COLUMNS: &str = "id, slug, label, action_code, day_count, max_per_day, identity_kind, \
                       created_at, updated_at";

/// Provides read/write operations for configured events.
pub struct EventRepo;

impl EventRepo {
    /// List all events ordered by label.
    pub async fn list(pool: &PgPool) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events ORDER BY label, id");
        sqlx::query_as::<_, Event>(&query).fetch_all(pool).await
    }

    /// Find an event by its URL slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE slug = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Insert a new event.
    pub async fn create(pool: &PgPool, input: &CreateEvent) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (slug, label, action_code, day_count, max_per_day, identity_kind) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let max_per_day = input.max_per_day.unwrap_or(DEFAULT_MAX_PER_DAY as i32);
        let identity = input.identity.unwrap_or(IdentityKey::MobileNumber);
        sqlx::query_as::<_, Event>(&query)
            .bind(&input.slug)
            .bind(&input.label)
            .bind(&input.action_code)
            .bind(input.day_count)
            .bind(max_per_day)
            .bind(identity.as_str())
            .fetch_one(pool)
            .await
    }
}
