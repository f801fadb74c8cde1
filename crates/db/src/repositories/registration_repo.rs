//! Repository for the `registrations` and `registration_slots` tables.

use slotbook_core::selection::PerDaySelection;
use slotbook_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::registration::{NewRegistration, Registration, RegistrationSlot};

/// Column list for `registrations` queries.
const COLUMNS: &str = "id, event_id, identity_key, source_reference, member_id, full_name, \
                       country_code, mobile_number, created_at, updated_at";

/// Column list for `registration_slots` queries.
const SLOT_COLUMNS: &str = "registration_id, slot_id, day, position";

/// Provides registration reads and the writes used by the coordinator.
pub struct RegistrationRepo;

impl RegistrationRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Registration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM registrations WHERE id = $1");
        sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find and lock the registration of a participant.
    pub async fn find_by_identity_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: DbId,
        identity_key: &str,
    ) -> Result<Option<Registration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM registrations \
             WHERE event_id = $1 AND identity_key = $2 \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(identity_key)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Find and lock every registration owned by the given references.
    pub async fn find_by_source_references_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        event_id: DbId,
        source_references: &[DbId],
    ) -> Result<Vec<Registration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM registrations \
             WHERE event_id = $1 AND source_reference = ANY($2) \
             ORDER BY id \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(source_references)
            .fetch_all(&mut **tx)
            .await
    }

    /// Registrations for a mobile number, oldest first.
    pub async fn search_by_mobile(
        pool: &PgPool,
        event_id: DbId,
        mobile_number: &str,
    ) -> Result<Vec<Registration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM registrations \
             WHERE event_id = $1 AND mobile_number = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(mobile_number)
            .fetch_all(pool)
            .await
    }

    /// Seats held by one registration.
    pub async fn list_slots<'e, E>(
        executor: E,
        registration_id: DbId,
    ) -> Result<Vec<RegistrationSlot>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM registration_slots \
             WHERE registration_id = $1 \
             ORDER BY day, position"
        );
        sqlx::query_as::<_, RegistrationSlot>(&query)
            .bind(registration_id)
            .fetch_all(executor)
            .await
    }

    /// Seats held by several registrations at once.
    pub async fn list_slots_for_many(
        pool: &PgPool,
        registration_ids: &[DbId],
    ) -> Result<Vec<RegistrationSlot>, sqlx::Error> {
        let query = format!(
            "SELECT {SLOT_COLUMNS} FROM registration_slots \
             WHERE registration_id = ANY($1) \
             ORDER BY registration_id, day, position"
        );
        sqlx::query_as::<_, RegistrationSlot>(&query)
            .bind(registration_ids)
            .fetch_all(pool)
            .await
    }

    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewRegistration<'_>,
    ) -> Result<Registration, sqlx::Error> {
        let query = format!(
            "INSERT INTO registrations \
                (event_id, identity_key, source_reference, member_id, full_name, country_code, mobile_number) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let identity = input.identity;
        sqlx::query_as::<_, Registration>(&query)
            .bind(input.event_id)
            .bind(input.identity_key)
            .bind(input.source_reference)
            .bind(identity.member_id.as_deref().map(str::trim))
            .bind(identity.full_name.trim())
            .bind(identity.country_code.as_deref().map(str::trim))
            .bind(identity.mobile_number.trim())
            .fetch_one(&mut **tx)
            .await
    }

    /// Overwrite the identity fields of an existing registration.
    pub async fn update_identity(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        input: &NewRegistration<'_>,
    ) -> Result<Registration, sqlx::Error> {
        let query = format!(
            "UPDATE registrations SET \
                source_reference = COALESCE($2, source_reference), \
                member_id = COALESCE($3, member_id), \
                full_name = $4, \
                country_code = COALESCE($5, country_code), \
                mobile_number = $6 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let identity = input.identity;
        sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .bind(input.source_reference)
            .bind(identity.member_id.as_deref().map(str::trim))
            .bind(identity.full_name.trim())
            .bind(identity.country_code.as_deref().map(str::trim))
            .bind(identity.mobile_number.trim())
            .fetch_one(&mut **tx)
            .await
    }

    /// Replace the stored seats of a registration with `selection`.
    pub async fn replace_slots(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        registration_id: DbId,
        selection: &PerDaySelection,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM registration_slots WHERE registration_id = $1")
            .bind(registration_id)
            .execute(&mut **tx)
            .await?;

        for (day, ids) in selection.days() {
            for (position, &slot_id) in ids.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO registration_slots (registration_id, slot_id, day, position) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(registration_id)
                .bind(slot_id)
                .bind(day)
                .bind(position as i32)
                .execute(&mut **tx)
                .await?;
            }
        }

        Ok(())
    }

    /// Delete a registration. Its seats cascade.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
