//! Domain core for slot registration.
//!
//! Holds the pure, I/O-free pieces shared by the database layer, the HTTP
//! service and the client: event configuration, per-day selections, the slot
//! constraint engine and the reservation delta.

pub mod availability;
pub mod constraints;
pub mod delta;
pub mod error;
pub mod event;
pub mod identity;
pub mod selection;
pub mod types;
