//! Repository for the `waitlist_entries` table.

use slotbook_core::identity::WaitlistApplicant;
use slotbook_core::types::DbId;
use sqlx::PgPool;

use crate::models::waitlist::WaitlistEntry;

/// Column list for `waitlist_entries` queries.
const COLUMNS: &str =
    "id, event_id, member_id, full_name, country_code, mobile_number, created_at";

/// Provides waitlist reads and inserts.
pub struct WaitlistRepo;

impl WaitlistRepo {
    pub async fn find_by_mobile(
        pool: &PgPool,
        event_id: DbId,
        mobile_number: &str,
    ) -> Result<Option<WaitlistEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM waitlist_entries WHERE event_id = $1 AND mobile_number = $2"
        );
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(event_id)
            .bind(mobile_number)
            .fetch_optional(pool)
            .await
    }

    /// Insert an applicant. A second entry for the same mobile number fails
    /// on `uq_waitlist_entries_event_mobile`.
    pub async fn create(
        pool: &PgPool,
        event_id: DbId,
        applicant: &WaitlistApplicant,
    ) -> Result<WaitlistEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO waitlist_entries (event_id, member_id, full_name, country_code, mobile_number) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WaitlistEntry>(&query)
            .bind(event_id)
            .bind(applicant.member_id.as_deref().map(str::trim))
            .bind(applicant.full_name.trim())
            .bind(applicant.country_code.trim())
            .bind(applicant.mobile_number.trim())
            .fetch_one(pool)
            .await
    }
}
