use axum::{
	Json, Router,
	extract::State,
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use rh_domain::{Access, ExportRow, Granularity, PassReport, ViewKind};
use rh_service::{Error, Listing, ListingQuery, MetricsReport, StatusUpdate, UpdatedRequest};

#[derive(Debug, Default, Deserialize)]
pub struct ListBody {
	#[serde(default)]
	pub scope_view: ViewKind,
	#[serde(flatten)]
	pub query: ListingQuery,
}

#[derive(Debug, Deserialize)]
pub struct MetricsBody {
	pub granularity: Granularity,
	#[serde(default)]
	pub scope_view: ViewKind,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
	pub rows: Vec<ExportRow>,
	pub report: PassReport,
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

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let status = match &err {
			Error::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
			Error::ScopeDenied { .. } => StatusCode::FORBIDDEN,
			Error::NotFound { .. } => StatusCode::NOT_FOUND,
			Error::Conflict { .. } => StatusCode::CONFLICT,
			Error::WriteFailure { .. } => StatusCode::BAD_GATEWAY,
			Error::LookupUnavailable { .. } | Error::Storage { .. } =>
				StatusCode::SERVICE_UNAVAILABLE,
		};

		if status.is_server_error() {
			tracing::error!(error = %err, "Request failed.");
		}

		Self::new(status, err.code(), err.to_string())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/requests/list", post(list))
		.route("/v1/requests/metrics", post(metrics))
		.route("/v1/requests/export", post(export))
		.route("/v1/requests/status", post(status))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<ListBody>,
) -> Result<Json<Listing>, ApiError> {
	let access = caller_access(&state, &headers, payload.scope_view).await?;
	let view = state.service.aggregate(&access.scope).await?;
	let listing = state.service.listing(&view, &payload.query)?;

	Ok(Json(listing))
}

async fn metrics(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<MetricsBody>,
) -> Result<Json<MetricsReport>, ApiError> {
	let access = caller_access(&state, &headers, payload.scope_view).await?;
	let view = state.service.aggregate(&access.scope).await?;

	Ok(Json(state.service.metrics(&view, payload.granularity)))
}

async fn export(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<ListBody>,
) -> Result<Json<ExportResponse>, ApiError> {
	let access = caller_access(&state, &headers, payload.scope_view).await?;
	let view = state.service.aggregate(&access.scope).await?;
	let mut rows: Vec<ExportRow> = Vec::new();

	state.service.export(&view, &payload.query, &mut rows)?;

	Ok(Json(ExportResponse { rows, report: view.report }))
}

async fn status(
	State(state): State<AppState>,
	headers: HeaderMap,
	Json(payload): Json<StatusUpdate>,
) -> Result<Json<UpdatedRequest>, ApiError> {
	let access = caller_access(&state, &headers, ViewKind::Assigned).await?;
	let updated = state.service.apply_status(&access, payload).await?;

	Ok(Json(updated))
}

async fn caller_access(
	state: &AppState,
	headers: &HeaderMap,
	kind: ViewKind,
) -> Result<Access, ApiError> {
	let identity = headers
		.get(&state.caller_header)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.ok_or_else(|| {
			ApiError::new(
				StatusCode::FORBIDDEN,
				"SCOPE_DENIED",
				format!("Missing {} header.", state.caller_header),
			)
		})?;

	Ok(state.service.access(identity, kind).await?)
}
