/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Slots are addressed by their database id.
pub type SlotId = DbId;

/// 1-based day number within an event (SMALLINT in the database).
pub type DayIndex = i16;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
