//! Rust client for the slot registration API.
//!
//! [`RegistrationClient`] talks HTTP; [`SelectionSession`] holds one
//! participant's selection and keeps it consistent with availability.

pub mod client;
pub mod error;
pub mod session;

pub use client::RegistrationClient;
pub use error::ClientError;
pub use session::{Route, SelectionSession, SubmitGuard};
