//! Request handlers.
//!
//! Each submodule provides async handler functions for one area of the API.
//! Handlers delegate to the repositories and the reservation coordinator in
//! `slotbook_db` and map errors via [`AppError`](crate::error::AppError).

pub mod events;
pub mod registrations;
pub mod selection;
pub mod waitlist;
