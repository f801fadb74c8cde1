/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable. Handlers keep no other in-process state, so any number
/// of server instances can share one database.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: slotbook_db::DbPool,
}
