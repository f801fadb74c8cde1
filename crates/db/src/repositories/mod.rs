//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! `&PgPool`, or an open transaction for the statements that must run inside
//! a reservation.

pub mod event_repo;
pub mod registration_repo;
pub mod slot_repo;
pub mod waitlist_repo;

pub use event_repo::EventRepo;
pub use registration_repo::RegistrationRepo;
pub use slot_repo::SlotRepo;
pub use waitlist_repo::WaitlistRepo;
