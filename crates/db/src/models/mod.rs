//! Row models and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts where rows are created through
//!   the repository layer

pub mod event;
pub mod registration;
pub mod slot;
pub mod waitlist;
