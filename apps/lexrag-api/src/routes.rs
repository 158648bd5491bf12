use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use lexrag_domain::Filter;
use lexrag_service::{AskRequest, AskResponse, Error, SearchRequest, SearchResponse};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
	pub query: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let message = err.to_string();
		let api_error = match err {
			Error::InvalidRequest { .. } => {
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message, None)
			},
			Error::EmptyCandidateSet => {
				Self::new(StatusCode::NOT_FOUND, "NO_RESULTS", message, None)
			},
			Error::FilterParse { .. } => {
				Self::new(StatusCode::BAD_GATEWAY, "FILTER_PARSE_ERROR", message, None)
			},
			Error::ProviderUnavailable { stage, provider, .. } => Self::new(
				StatusCode::BAD_GATEWAY,
				"PROVIDER_UNAVAILABLE",
				message,
				Some(vec![stage.to_string(), provider]),
			),
			Error::Synthesis { .. } => {
				Self::new(StatusCode::BAD_GATEWAY, "SYNTHESIS_ERROR", message, None)
			},
			Error::EmbeddingSpaceMismatch { index, .. } => Self::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"EMBEDDING_SPACE_MISMATCH",
				message,
				Some(vec![index]),
			),
			Error::Config { .. } => {
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message, None)
			},
		};

		if api_error.status.is_server_error() {
			tracing::error!(
				error_code = %api_error.error_code,
				error = %api_error.message,
				"Request failed."
			);
		} else {
			tracing::warn!(
				error_code = %api_error.error_code,
				error = %api_error.message,
				"Request rejected."
			);
		}

		api_error
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/filters", post(filters))
		.route("/v1/search", post(search))
		.route("/v1/ask", post(ask))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn filters(
	State(state): State<AppState>,
	Json(payload): Json<FilterRequest>,
) -> Result<Json<Filter>, ApiError> {
	let query = payload.query.trim();

	if query.is_empty() {
		let err = Error::InvalidRequest { message: "query must not be empty.".to_string() };

		return Err(err.into());
	}

	let filter = state.service.extract_filters(query).await?;

	Ok(Json(filter))
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;

	Ok(Json(response))
}

async fn ask(
	State(state): State<AppState>,
	Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
	let response = state.service.ask(payload).await?;

	Ok(Json(response))
}
