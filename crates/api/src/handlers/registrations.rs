//! Handlers for registration commands and search.
//!
//! One endpoint accepts the three command shapes participants' forms send:
//!
//! - `{ "mainData": { ... } }` registers or updates one participant;
//! - `{ "action": "REGISTER_<CODE>", "mainData": [ ... ] }` registers a
//!   group in one transaction;
//! - `{ "action": "DELETE_<CODE>", "source_reference": [ ... ] }` withdraws.

use std::collections::{BTreeMap, HashMap};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use slotbook_core::error::CoreError;
use slotbook_core::event::{EventConfig, RegistrationAction};
use slotbook_core::identity::{lenient_id_list, ParticipantSubmission};
use slotbook_core::selection::day_key;
use slotbook_core::types::{DbId, SlotId};
use slotbook_db::models::registration::{selection_from_rows, RegistrationSummary};
use slotbook_db::repositories::{RegistrationRepo, SlotRepo};
use slotbook_db::reservations::ReservationCoordinator;

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, EventSlug};
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Body of `POST /events/{slug}/registrations`.
#[derive(Debug, Deserialize)]
pub struct RegistrationCommand {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, rename = "mainData")]
    pub main_data: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_id_list")]
    pub source_reference: Option<Vec<DbId>>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationCreated {
    pub id: DbId,
    pub created: bool,
    pub added: Vec<SlotId>,
    pub removed: Vec<SlotId>,
}

#[derive(Debug, Serialize)]
pub struct BulkRegistrationCreated {
    pub ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct Withdrawn {
    pub withdrawn: usize,
    pub released: usize,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub mobile_number: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub registrations: Vec<RegistrationSummary>,
}

/// POST /api/v1/events/{slug}/registrations
pub async fn submit(
    State(state): State<AppState>,
    EventSlug(event): EventSlug,
    AppJson(command): AppJson<RegistrationCommand>,
) -> AppResult<Response> {
    let action = match command.action.as_deref() {
        Some(action) => event.parse_action(action)?,
        None => RegistrationAction::Register,
    };

    match (action, command.main_data) {
        (RegistrationAction::Delete, _) => {
            let references = command.source_reference.ok_or_else(|| {
                CoreError::Validation("source_reference is required".into())
            })?;
            withdraw(&state, &event, &references).await
        }
        (RegistrationAction::Register, Some(serde_json::Value::Array(items))) => {
            register_bulk(&state, &event, items).await
        }
        (RegistrationAction::Register, Some(item @ serde_json::Value::Object(_))) => {
            register_one(&state, &event, item).await
        }
        (RegistrationAction::Register, Some(_)) => Err(AppError::BadRequest(
            "mainData must be an object or an array".into(),
        )),
        (RegistrationAction::Register, None) => {
            Err(CoreError::Validation("mainData is required".into()).into())
        }
    }
}

async fn register_one(
    state: &AppState,
    event: &EventConfig,
    item: serde_json::Value,
) -> AppResult<Response> {
    let submission = parse_submission(item)?;
    let outcome = ReservationCoordinator::register(&state.pool, event, &submission).await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let body = RegistrationCreated {
        id: outcome.registration_id,
        created: outcome.created,
        added: outcome.added,
        removed: outcome.removed,
    };
    Ok((status, Json(SuccessResponse::new(body))).into_response())
}

async fn register_bulk(
    state: &AppState,
    event: &EventConfig,
    items: Vec<serde_json::Value>,
) -> AppResult<Response> {
    let submissions = items
        .into_iter()
        .map(parse_submission)
        .collect::<AppResult<Vec<_>>>()?;
    let outcomes =
        ReservationCoordinator::register_bulk(&state.pool, event, &submissions).await?;

    let body = BulkRegistrationCreated {
        ids: outcomes.iter().map(|o| o.registration_id).collect(),
    };
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(body))).into_response())
}

async fn withdraw(
    state: &AppState,
    event: &EventConfig,
    references: &[DbId],
) -> AppResult<Response> {
    let outcome = ReservationCoordinator::withdraw(&state.pool, event, references).await?;

    let body = Withdrawn {
        withdrawn: outcome.registration_ids.len(),
        released: outcome.released.len(),
    };
    Ok(Json(SuccessResponse::new(body)).into_response())
}

fn parse_submission(item: serde_json::Value) -> AppResult<ParticipantSubmission> {
    serde_json::from_value(item).map_err(|e| AppError::BadRequest(format!("Invalid mainData: {e}")))
}

/// POST /api/v1/events/{slug}/registrations/search
///
/// Registrations held under a mobile number, with slot labels per day.
pub async fn search(
    State(state): State<AppState>,
    EventSlug(event): EventSlug,
    AppJson(input): AppJson<SearchRequest>,
) -> AppResult<impl IntoResponse> {
    let mobile_number = input.mobile_number.trim();
    if mobile_number.is_empty() {
        return Err(CoreError::Validation("Mobile number required".into()).into());
    }

    let registrations = RegistrationRepo::search_by_mobile(&state.pool, event.id, mobile_number).await?;
    if registrations.is_empty() {
        return Err(CoreError::NotFound {
            entity: "Participant",
            key: mobile_number.to_string(),
        }
        .into());
    }

    let ids: Vec<DbId> = registrations.iter().map(|r| r.id).collect();
    let rows = RegistrationRepo::list_slots_for_many(&state.pool, &ids).await?;
    let slot_ids: Vec<SlotId> = rows.iter().map(|r| r.slot_id).collect();
    let labels: HashMap<SlotId, String> = SlotRepo::labels(&state.pool, &slot_ids)
        .await?
        .into_iter()
        .map(|l| (l.id, l.slot_time))
        .collect();

    let mut rows_by_registration: HashMap<DbId, Vec<_>> = HashMap::new();
    for row in rows {
        rows_by_registration.entry(row.registration_id).or_default().push(row);
    }

    let summaries = registrations
        .into_iter()
        .map(|registration| {
            let held = rows_by_registration.remove(&registration.id).unwrap_or_default();
            let selection = selection_from_rows(&held);
            let slot_times: BTreeMap<String, String> = event
                .days()
                .map(|day| {
                    let names: Vec<&str> = selection
                        .day(day)
                        .iter()
                        .filter_map(|id| labels.get(id).map(String::as_str))
                        .collect();
                    let joined = if names.is_empty() {
                        "-".to_string()
                    } else {
                        names.join(", ")
                    };
                    (day_key(day), joined)
                })
                .collect();

            RegistrationSummary {
                id: registration.id,
                full_name: registration.full_name,
                mobile_number: registration.mobile_number,
                source_reference: registration.source_reference,
                member_id: registration.member_id,
                selection,
                slot_times,
            }
        })
        .collect();

    Ok(Json(SuccessResponse::new(SearchResults {
        registrations: summaries,
    })))
}
