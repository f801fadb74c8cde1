//! Handler for the waitlist fallback.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use slotbook_core::error::CoreError;
use slotbook_core::identity::WaitlistApplicant;
use slotbook_core::types::DbId;
use slotbook_db::repositories::WaitlistRepo;
use validator::Validate;

use crate::error::AppResult;
use crate::extract::{AppJson, EventSlug};
use crate::response::SuccessResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WaitlistRequest {
    #[serde(rename = "mainData")]
    pub main_data: WaitlistApplicant,
}

#[derive(Debug, Serialize)]
pub struct WaitlistJoined {
    pub id: DbId,
}

/// POST /api/v1/events/{slug}/waitlist
///
/// Does not touch slot capacity. A mobile number may appear once per event.
pub async fn join_waitlist(
    State(state): State<AppState>,
    EventSlug(event): EventSlug,
    AppJson(input): AppJson<WaitlistRequest>,
) -> AppResult<impl IntoResponse> {
    let applicant = input.main_data;
    applicant.validate().map_err(CoreError::from)?;

    let mobile_number = applicant.mobile_number.trim();
    if WaitlistRepo::find_by_mobile(&state.pool, event.id, mobile_number)
        .await?
        .is_some()
    {
        return Err(CoreError::Conflict("Mobile number already exists".into()).into());
    }

    // A concurrent insert for the same number still fails on the unique
    // constraint and maps to 409.
    let entry = WaitlistRepo::create(&state.pool, event.id, &applicant).await?;
    tracing::info!(event = %event.slug, waitlist_id = entry.id, "Waitlist entry created");

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(WaitlistJoined { id: entry.id })),
    ))
}
