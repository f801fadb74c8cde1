pub mod events;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /events                                          list configured events
/// /events/{slug}/slots                             availability (GET)
/// /events/{slug}/selection/evaluate                run the constraint engine (POST)
/// /events/{slug}/registrations                     register, bulk register, withdraw (POST)
/// /events/{slug}/registrations/search              find registrations by mobile (POST)
/// /events/{slug}/waitlist                          join the waitlist (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/events", events::router())
}
