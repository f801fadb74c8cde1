//! Handlers for event listing and slot availability.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use slotbook_core::availability::{no_slots_available, AvailabilitySlot};
use slotbook_core::constraints::SlotState;
use slotbook_core::event::EventConfig;
use slotbook_db::repositories::{EventRepo, SlotRepo};

use crate::error::AppResult;
use crate::extract::EventSlug;
use crate::response::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EventList {
    pub events: Vec<EventConfig>,
}

#[derive(Debug, Serialize)]
pub struct Availability {
    pub event: EventConfig,
    pub slots: Vec<SlotState>,
    /// True when every slot is full: submissions go to the waitlist.
    pub no_slots_available: bool,
}

/// GET /api/v1/events
pub async fn list_events(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let events = EventRepo::list(&state.pool)
        .await?
        .iter()
        .map(|e| e.config())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(SuccessResponse::new(EventList { events })))
}

/// GET /api/v1/events/{slug}/slots
///
/// Slots in adjacency order with remaining seats and capacity-based
/// `disabled` flags.
pub async fn get_slots(
    State(state): State<AppState>,
    EventSlug(event): EventSlug,
) -> AppResult<impl IntoResponse> {
    let slots: Vec<AvailabilitySlot> = SlotRepo::list_for_event(&state.pool, event.id)
        .await?
        .into_iter()
        .map(AvailabilitySlot::from)
        .collect();

    let no_slots_available = no_slots_available(&slots);
    if no_slots_available {
        tracing::info!(event = %event.slug, "No slots available, waitlist open");
    }

    Ok(Json(SuccessResponse::new(Availability {
        event,
        slots: slots.into_iter().map(SlotState::capacity_only).collect(),
        no_slots_available,
    })))
}
