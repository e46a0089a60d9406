//! HTTP API for sneezetracker.
//!
//! Routes:
//! - `GET  /api/sneezes`       all records, newest first
//! - `POST /api/sneezes`       validate and record one sneeze
//! - `GET  /api/sneezes/stats` dashboard aggregates
//! - `GET  /health`            liveness probe
//!
//! Validation failures are returned to the client verbatim with 400. Storage
//! failures are logged and answered with a generic 500 body.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::sneeze::SneezeRecord;
use crate::stats::DashboardStats;
use crate::storage::SneezeStore;
use crate::validation::{validate, SneezeCandidate};

/// Body returned when listing or aggregating fails in storage.
pub const LIST_FAILED_MESSAGE: &str = "Failed to fetch sneezes";

/// Body returned when recording fails in storage.
pub const CREATE_FAILED_MESSAGE: &str = "Failed to record sneeze";

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    /// The record store every handler reads from or writes to.
    pub store: Arc<dyn SneezeStore>,
}

impl AppState {
    /// Wrap a store for use by the router.
    #[must_use]
    pub fn new(store: Arc<dyn SneezeStore>) -> Self {
        Self { store }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Standard error body: `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable description of what went wrong.
    pub error: String,
}

impl ErrorResponse {
    /// Create an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Handler failure, rendered as a JSON error body.
#[derive(Debug)]
pub enum ApiError {
    /// The request was malformed or failed validation.
    BadRequest(String),
    /// Something on our side failed; the message is deliberately generic.
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.to_string()),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Query parameters for the stats route.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    /// Viewer's offset from UTC in minutes, positive east of Greenwich.
    /// The server's local zone is used when absent.
    pub utc_offset_minutes: Option<i32>,
}

/// Build the API router.
#[must_use]
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/sneezes", get(list_sneezes).post(create_sneeze))
        .route("/api/sneezes/stats", get(sneeze_stats))
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(store: Arc<dyn SneezeStore>, addr: SocketAddr) -> Result<()> {
    let app = routes(AppState::new(store)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C, shutdown only by termination: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/sneezes - list all sneezes, newest first
pub async fn list_sneezes(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<SneezeRecord>>, ApiError> {
    let records = fetch_all(&state).await.map_err(|e| {
        error!("Failed to fetch sneezes: {}", e);
        ApiError::Internal(LIST_FAILED_MESSAGE)
    })?;

    Ok(Json(records))
}

/// POST /api/sneezes - record a sneeze
pub async fn create_sneeze(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SneezeCandidate>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<SneezeRecord>), ApiError> {
    let Json(candidate) = payload.map_err(|rejection| {
        debug!("Rejected sneeze body: {}", rejection);
        ApiError::BadRequest(rejection.body_text())
    })?;

    let sneeze = validate(&candidate).map_err(|e| {
        debug!(field = e.field(), "Rejected sneeze: {}", e);
        ApiError::BadRequest(e.to_string())
    })?;

    let store = Arc::clone(&state.store);
    let record = run_blocking(move || store.insert(&sneeze))
        .await
        .map_err(|e| {
            error!("Failed to create sneeze: {}", e);
            ApiError::Internal(CREATE_FAILED_MESSAGE)
        })?;

    info!(id = record.id, intensity = %record.intensity, "Recorded sneeze");
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/sneezes/stats - dashboard aggregates
pub async fn sneeze_stats(
    State(state): State<AppState>,
    query: std::result::Result<Query<StatsQuery>, QueryRejection>,
) -> std::result::Result<Json<DashboardStats>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let offset = match query.utc_offset_minutes {
        Some(minutes) => Some(
            minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    ApiError::BadRequest(
                        "utcOffsetMinutes must be between -1439 and 1439".to_string(),
                    )
                })?,
        ),
        None => None,
    };

    let records = fetch_all(&state).await.map_err(|e| {
        error!("Failed to fetch sneezes for stats: {}", e);
        ApiError::Internal(LIST_FAILED_MESSAGE)
    })?;

    let stats = match offset {
        Some(offset) => DashboardStats::at(&records, &Utc::now().with_timezone(&offset)),
        None => DashboardStats::from_records(&records),
    };
    Ok(Json(stats))
}

async fn fetch_all(state: &AppState) -> Result<Vec<SneezeRecord>> {
    let store = Arc::clone(&state.store);
    run_blocking(move || store.list()).await
}

/// Run a blocking storage call on Tokio's blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::internal(format!("storage task failed: {e}")))?
}
