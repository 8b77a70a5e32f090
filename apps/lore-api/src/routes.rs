use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;
use lore_pipeline::{ChatRequest, ChatResponse, Error as PipelineError};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/chat", post(chat))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn chat(
	State(state): State<AppState>,
	Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
	let response = state.service.chat(payload).await?;
	Ok(Json(response))
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

impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

// A 5xx here always means "could not answer"; a low-confidence answer is a
// 200 with its verification attached.
impl From<PipelineError> for ApiError {
	fn from(err: PipelineError) -> Self {
		match &err {
			PipelineError::InvalidRequest { .. } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", err.to_string()),
			PipelineError::Provider { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "provider_unavailable", err.to_string()),
			PipelineError::Index { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "index_unavailable", err.to_string()),
			PipelineError::History { .. } => ApiError::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"history_unavailable",
				err.to_string(),
			),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };
		(self.status, Json(body)).into_response()
	}
}
