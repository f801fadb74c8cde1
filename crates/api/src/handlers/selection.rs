//! Handler exposing the slot constraint engine.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use slotbook_core::availability::{no_slots_available, AvailabilitySlot};
use slotbook_core::constraints::{evaluate, SlotState};
use slotbook_core::selection::{day_key, PerDaySelection};
use slotbook_core::types::SlotId;
use slotbook_db::repositories::SlotRepo;

use crate::error::AppResult;
use crate::extract::{AppJson, EventSlug};
use crate::response::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SelectionEvaluation {
    pub slots: Vec<SlotState>,
    /// The repaired selection as `dayN` arrays.
    pub selection: PerDaySelection,
    pub pruned: Vec<SlotId>,
    /// Per `dayN`: a selected pair is adjacent or has a rule-disabled slot
    /// between it.
    pub consecutive_or_disabled_between: BTreeMap<String, bool>,
    pub no_slots_available: bool,
}

/// POST /api/v1/events/{slug}/selection/evaluate
///
/// Runs the constraint engine against current availability. Read-only.
pub async fn evaluate_selection(
    State(state): State<AppState>,
    EventSlug(event): EventSlug,
    AppJson(selection): AppJson<PerDaySelection>,
) -> AppResult<impl IntoResponse> {
    let slots: Vec<AvailabilitySlot> = SlotRepo::list_for_event(&state.pool, event.id)
        .await?
        .into_iter()
        .map(AvailabilitySlot::from)
        .collect();

    let evaluation = evaluate(&slots, &selection, &event.rules());
    let pruned = evaluation.pruned();
    if !pruned.is_empty() {
        tracing::debug!(event = %event.slug, ?pruned, "Selection repaired");
    }

    let consecutive_or_disabled_between = evaluation
        .days
        .iter()
        .map(|(day, eval)| (day_key(*day), eval.has_consecutive_or_disabled_in_between()))
        .collect();

    Ok(Json(SuccessResponse::new(SelectionEvaluation {
        slots: evaluation.slots().cloned().collect(),
        selection: evaluation.selection(),
        pruned,
        consecutive_or_disabled_between,
        no_slots_available: no_slots_available(&slots),
    })))
}
