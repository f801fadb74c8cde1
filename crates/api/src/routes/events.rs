//! Route definitions for events, availability and registrations.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{events, registrations, selection, waitlist};
use crate::state::AppState;

/// Event routes mounted at `/events`.
///
/// ```text
/// GET  /                                 -> list_events
/// GET  /{slug}/slots                     -> get_slots
/// POST /{slug}/selection/evaluate        -> evaluate_selection
/// POST /{slug}/registrations             -> submit (register, bulk, delete)
/// POST /{slug}/registrations/search      -> search
/// POST /{slug}/waitlist                  -> join_waitlist
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events))
        .route("/{slug}/slots", get(events::get_slots))
        .route(
            "/{slug}/selection/evaluate",
            post(selection::evaluate_selection),
        )
        .route("/{slug}/registrations", post(registrations::submit))
        .route("/{slug}/registrations/search", post(registrations::search))
        .route("/{slug}/waitlist", post(waitlist::join_waitlist))
}
