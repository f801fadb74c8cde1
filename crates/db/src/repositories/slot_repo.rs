//! Repository for the `slots` table.
//!
//! `registration_count` is only ever changed by [`SlotRepo::try_reserve`] and
//! [`SlotRepo::release`]. Both are single conditional `UPDATE`s, so the
//! capacity check and the counter change happen atomically in the database.

use slotbook_core::types::{DbId, SlotId};
use sqlx::{PgExecutor, PgPool};

use crate::models::slot::{CreateSlot, Slot, SlotLabel};

/// Column list for `slots` queries.
const COLUMNS: &str = "id, event_id, day, slot_time, sort_order, max_capacity, \
                       registration_count, created_at, updated_at";

/// Provides slot reads and the atomic counter operations.
pub struct SlotRepo;

impl SlotRepo {
    /// Insert a new slot for an event.
    pub async fn create(
        pool: &PgPool,
        event_id: DbId,
        input: &CreateSlot,
    ) -> Result<Slot, sqlx::Error> {
        let query = format!(
            "INSERT INTO slots (event_id, day, slot_time, sort_order, max_capacity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(event_id)
            .bind(input.day)
            .bind(&input.slot_time)
            .bind(input.sort_order.unwrap_or(0))
            .bind(input.max_capacity)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: SlotId) -> Result<Option<Slot>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM slots WHERE id = $1");
        sqlx::query_as::<_, Slot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All slots of an event in adjacency order: day, then `sort_order`,
    /// then id.
    pub async fn list_for_event<'e, E>(executor: E, event_id: DbId) -> Result<Vec<Slot>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM slots WHERE event_id = $1 ORDER BY day, sort_order, id"
        );
        sqlx::query_as::<_, Slot>(&query)
            .bind(event_id)
            .fetch_all(executor)
            .await
    }

    /// Take `seats` seats if the slot has that many free.
    ///
    /// Returns `false` when the slot lacks room or does not belong to the
    /// event.
    pub async fn try_reserve(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: DbId,
        slot_id: SlotId,
        seats: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE slots SET registration_count = registration_count + $3 \
             WHERE id = $1 AND event_id = $2 AND registration_count + $3 <= max_capacity",
        )
        .bind(slot_id)
        .bind(event_id)
        .bind(seats)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Give `seats` seats back. The counter never drops below zero.
    ///
    /// Returns `false` when the slot holds fewer registrations than are
    /// being released; the counter is left untouched in that case.
    pub async fn release(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: DbId,
        slot_id: SlotId,
        seats: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE slots SET registration_count = registration_count - $3 \
             WHERE id = $1 AND event_id = $2 AND registration_count >= $3",
        )
        .bind(slot_id)
        .bind(event_id)
        .bind(seats)
        .execute(&mut **tx)
        .await?;

        let released = result.rows_affected() > 0;
        if !released {
            tracing::warn!(event_id, slot_id, seats, "Slot counter below released seats");
        }
        Ok(released)
    }

    /// Display labels for a set of slot ids.
    pub async fn labels(pool: &PgPool, ids: &[SlotId]) -> Result<Vec<SlotLabel>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, SlotLabel>("SELECT id, slot_time FROM slots WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
