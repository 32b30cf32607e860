use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use ora_monitor::MetricsSnapshot;
use ora_service::{QueryRequest, QueryResponse, ServiceError};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/query", post(query))
		.route("/v1/metrics", get(metrics))
		.route("/v1/metrics/reset", post(reset_metrics))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn query(
	State(state): State<AppState>,
	Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
	let response = state.service.query(payload).await?;

	Ok(Json(response))
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
	Json(state.service.monitor.report())
}

async fn reset_metrics(State(state): State<AppState>) -> StatusCode {
	state.service.monitor.reset();

	StatusCode::NO_CONTENT
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidQuery { message } => Self {
				status: StatusCode::BAD_REQUEST,
				error_code: "invalid_query".to_string(),
				message,
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
