//! HTTP handlers.
//!
//! Handlers only translate between HTTP and the services; every rule lives
//! in `taquilla-engine`. The caller identity for join and order placement
//! comes from the `x-client-id` header set by the upstream auth layer.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use taquilla_core::{
    CompletedOrder, EventPricing, OrderDetails, OrderRequest, Queue, QueuePosition, Turn,
};

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

/// Header carrying the authenticated client id.
pub const CLIENT_ID_HEADER: &str = "x-client-id";

type ApiResult<T> = Result<T, ApiError>;

fn client_id(headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ApiError::MissingHeader(CLIENT_ID_HEADER))
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    database: bool,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthPayload {
            status: label,
            database,
        }),
    )
}

// =============================================================================
// Waiting Room
// =============================================================================

pub async fn create_queue(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<(StatusCode, Json<Queue>)> {
    let queue = state.queues.create_queue(&event_id).await?;
    Ok((StatusCode::CREATED, Json(queue)))
}

pub async fn close_queue(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Queue>> {
    Ok(Json(state.queues.close_queue(&event_id).await?))
}

pub async fn join_queue(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<Turn>)> {
    let client_id = client_id(&headers)?;
    let turn = state.queues.join_queue(&client_id, &event_id).await?;
    Ok((StatusCode::CREATED, Json(turn)))
}

pub async fn get_position(
    State(state): State<AppState>,
    Path((queue_id, client_id)): Path<(String, String)>,
) -> ApiResult<Json<QueuePosition>> {
    Ok(Json(state.queues.get_position(&client_id, &queue_id).await?))
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Path((queue_id, client_id)): Path<(String, String)>,
) -> ApiResult<Json<Turn>> {
    Ok(Json(state.queues.heartbeat(&client_id, &queue_id).await?))
}

pub async fn leave_queue(
    State(state): State<AppState>,
    Path((queue_id, client_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.queues.leave_queue(&client_id, &queue_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Orders
// =============================================================================

/// Placement response: the order id up front, then the order with lines.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: String,
    #[serde(flatten)]
    pub details: OrderDetails,
}

pub async fn place_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<OrderRequest>,
) -> ApiResult<(StatusCode, Json<PlacedOrder>)> {
    let client_id = client_id(&headers)?;
    let details = state.orders.place_order(&client_id, &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrder {
            order_id: details.order.id.clone(),
            details,
        }),
    ))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<OrderDetails>> {
    Ok(Json(state.orders.get_order(&order_id).await?))
}

pub async fn confirm_standard(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<CompletedOrder>> {
    Ok(Json(state.orders.confirm_standard(&order_id).await?))
}

pub async fn confirm_preventa(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> ApiResult<Json<CompletedOrder>> {
    Ok(Json(state.orders.confirm_preventa(&order_id).await?))
}

pub async fn event_pricing(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<EventPricing>> {
    Ok(Json(state.orders.event_pricing(&event_id).await?))
}

// =============================================================================
// Tests
// =============================================================================
