//! HTTP Controller (Driver Adapter)
//!
//! Axum routes that validate requests, hand goals to the split use case
//! and render the results.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Instrument, Level, error, info_span, warn};
use uuid::Uuid;

use crate::application::use_cases::SplitGoalsUseCase;
use crate::config::ServerConfig;

use super::request::SplitRequest;
use super::response::{ErrorResponse, GoalResultResponse, HealthResponse};
use super::validation::{ValidationError, parse_split_request};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Use case splitting a batch of goals.
    pub split_goals: Arc<SplitGoalsUseCase>,
    /// Application version.
    pub version: String,
}

impl AppState {
    /// Create state around a use case.
    #[must_use]
    pub fn new(split_goals: SplitGoalsUseCase, version: impl Into<String>) -> Self {
        Self {
            split_goals: Arc::new(split_goals),
            version: version.into(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/split", post(split))
        .with_state(state)
}

/// Create the router wrapped in request tracing, a per-request deadline
/// and a body size limit.
pub fn create_app(state: AppState, server: &ServerConfig) -> Router {
    with_middleware(create_router(state), server)
}

/// Requests past the deadline get 408, bodies past the limit 413.
fn with_middleware(router: Router, server: &ServerConfig) -> Router {
    router
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    })
}

/// Split endpoint.
async fn split(
    State(state): State<AppState>,
    payload: Result<Json<SplitRequest>, JsonRejection>,
) -> Response {
    let span = info_span!("split", request_id = %Uuid::new_v4());
    async move {
        let Json(request) = match payload {
            Ok(json) => json,
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                warn!(error = %rejection, "rejected oversized body");
                return error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Request body too large".to_string(),
                );
            }
            Err(rejection) => {
                warn!(error = %rejection, "rejected malformed body");
                return bad_request("Invalid request body".to_string());
            }
        };

        let parsed = match parse_split_request(&request) {
            Ok(parsed) => parsed,
            Err(e) => return e.into_response(),
        };

        let use_case = Arc::clone(&state.split_goals);
        let goals = parsed.goals;
        let results = match tokio::task::spawn_blocking(move || use_case.execute(&goals)).await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "split task failed");
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                );
            }
        };

        let body: Vec<GoalResultResponse> = results
            .iter()
            .map(|r| GoalResultResponse::new(r, parsed.amount_precision, parsed.unit_precision))
            .collect();
        (StatusCode::OK, Json(body)).into_response()
    }
    .instrument(span)
    .await
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        warn!(error = %self, "rejected invalid request");
        bad_request(self.to_string())
    }
}

fn bad_request(message: String) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = ErrorResponse {
        message,
        error: status.canonical_reason().unwrap_or("Error").to_string(),
        status_code: status.as_u16(),
    };
    (status, Json(body)).into_response()
}
