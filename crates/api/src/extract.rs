//! Request extractors that reject with [`AppError`], so malformed requests
//! get the same JSON envelope as every other failure.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use slotbook_core::error::CoreError;
use slotbook_core::event::EventConfig;
use slotbook_db::repositories::EventRepo;

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor. Parse failures become `400 BAD_REQUEST`.
#[derive(Debug, Clone)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// The event named by the `{slug}` path segment.
///
/// ```ignore
/// async fn my_handler(EventSlug(event): EventSlug) -> AppResult<Json<()>> {
///     tracing::info!(event = %event.slug, days = event.day_count, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct EventSlug(pub EventConfig);

impl FromRequestParts<AppState> for EventSlug {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(slug) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        let event = EventRepo::find_by_slug(&state.pool, &slug)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "Event",
                    key: slug.clone(),
                })
            })?;

        Ok(EventSlug(event.config()?))
    }
}
