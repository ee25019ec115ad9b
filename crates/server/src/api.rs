//! JSON API.
//!
//! - `POST /api/selected-ids` accepts `{"selectedIds": [...]}` and echoes it back
//! - `GET  /api/selected-ids` describes the endpoint
//! - `GET  /api/customers` returns the filtered, scored customers
//! - `GET  /api/grid` returns the filtered customers bucketed into the 5x5 grid
//!
//! The read endpoints take the same query parameters as the dashboard page.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use rfmgrid_core::submission::{
    parse_selection_body, record_selection, EndpointInfo, ErrorBody, SelectionReceipt,
    SELECTED_IDS_PATH,
};
use rfmgrid_core::{
    ApplicationError, DashboardCounts, GridBuckets, InterfaceError, RangeFilters, ScoredCustomer,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::bootstrap::AppState;
use crate::dashboard::{build_state, DashboardQuery};

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

pub fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: ApplicationError, correlation_id: &str) -> (StatusCode, Json<ErrorBody>) {
    let interface = error.into_interface(correlation_id);
    warn!(
        event_name = "api.request_rejected",
        correlation_id,
        error = %interface,
        "request rejected"
    );
    let status = status_for(&interface);
    let error = match interface {
        InterfaceError::BadRequest { message, .. } => message,
        other => other.user_message().to_string(),
    };
    (status, Json(ErrorBody { error }))
}

#[derive(Debug, Serialize)]
pub struct CustomersResponse {
    pub source: &'static str,
    pub seed: Option<u64>,
    pub counts: DashboardCounts,
    pub ranges: RangeFilters,
    pub filters: RangeFilters,
    pub customers: Vec<ScoredCustomer>,
}

#[derive(Debug, Serialize)]
pub struct GridResponse {
    pub source: &'static str,
    pub seed: Option<u64>,
    pub counts: DashboardCounts,
    pub grid: GridBuckets,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(SELECTED_IDS_PATH, get(endpoint_info).post(submit_selected_ids))
        .route("/api/customers", get(customers))
        .route("/api/grid", get(grid))
        .with_state(state)
}

pub async fn endpoint_info() -> Json<EndpointInfo> {
    Json(EndpointInfo::default())
}

/// Parses the raw body itself: a missing `selectedIds` array is a 400, while a body
/// that is not JSON at all is a generic 500, both in the `{error}` shape.
pub async fn submit_selected_ids(body: Bytes) -> ApiResult<SelectionReceipt> {
    let correlation_id = Uuid::new_v4().to_string();

    let payload: Value = serde_json::from_slice(&body).map_err(|error| {
        error_response(ApplicationError::UnreadableBody(error.to_string()), &correlation_id)
    })?;

    let selected_ids = parse_selection_body(&payload)
        .map_err(|error| error_response(error.into(), &correlation_id))?;

    Ok(Json(record_selection(selected_ids, &correlation_id, Utc::now())))
}

pub async fn customers(
    State(app): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<CustomersResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let dashboard =
        build_state(&app, &query).map_err(|error| error_response(error, &correlation_id))?;

    Ok(Json(CustomersResponse {
        source: dashboard.source().name(),
        seed: dashboard.source().seed(),
        counts: dashboard.counts(),
        ranges: dashboard.ranges(),
        filters: dashboard.filters(),
        customers: dashboard.filtered(),
    }))
}

pub async fn grid(
    State(app): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<GridResponse> {
    let correlation_id = Uuid::new_v4().to_string();
    let dashboard =
        build_state(&app, &query).map_err(|error| error_response(error, &correlation_id))?;

    Ok(Json(GridResponse {
        source: dashboard.source().name(),
        seed: dashboard.source().seed(),
        counts: dashboard.counts(),
        grid: dashboard.grid(),
    }))
}

/// Turns a handler panic into a JSON 500.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!(
        event_name = "api.handler_panicked",
        correlation_id = "unknown",
        "request handler panicked"
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody { error: "internal server error".to_string() }),
    )
        .into_response()
}
