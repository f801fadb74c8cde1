#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use slotbook_core::types::{DayIndex, DbId, SlotId};
use slotbook_db::models::slot::CreateSlot;
use slotbook_db::repositories::{EventRepo, SlotRepo};
use sqlx::PgPool;
use tower::ServiceExt;

use slotbook_api::config::ServerConfig;
use slotbook_api::router::build_app_router;
use slotbook_api::state::AppState;

/// Slug of the seeded three-day event keyed by mobile number.
pub const HAVANAM: &str = "gayathri-havanam";
/// Slug of the seeded two-day event keyed by source reference.
pub const PARAYANA: &str = "vishnu-sahasra-nama-parayana";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:4200".to_string()],
        request_timeout_secs: 30,
        database_url: "postgres://unused".to_string(),
        db_max_connections: 5,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool. Same builder as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    build_app_router(AppState { pool }, &config)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn event_id(pool: &PgPool, slug: &str) -> DbId {
    EventRepo::find_by_slug(pool, slug)
        .await
        .unwrap()
        .unwrap()
        .id
}

/// Create `n` consecutive slots for one day of a seeded event.
pub async fn seed_slots(
    pool: &PgPool,
    slug: &str,
    day: DayIndex,
    n: i32,
    capacity: i32,
) -> Vec<SlotId> {
    let event_id = event_id(pool, slug).await;
    let mut ids = Vec::new();
    for i in 0..n {
        let input = CreateSlot {
            day,
            slot_time: format!("{}:00 AM", 5 + i),
            sort_order: Some(i),
            max_capacity: capacity,
        };
        ids.push(SlotRepo::create(pool, event_id, &input).await.unwrap().id);
    }
    ids
}

pub async fn registration_count(pool: &PgPool, slot_id: SlotId) -> i32 {
    SlotRepo::find_by_id(pool, slot_id)
        .await
        .unwrap()
        .unwrap()
        .registration_count
}
