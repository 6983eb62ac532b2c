use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::webhook::{StatusUpdateResponse, UpdateOrderStatusRequest},
    error::AppResult,
    response::ApiResponse,
    services::webhook_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/orders", post(update_order_status))
}

#[utoipa::path(
    post,
    path = "/api/webhook/orders",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status applied; cancellation restocks the order's items", body = ApiResponse<StatusUpdateResponse>),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Webhook"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<StatusUpdateResponse>>> {
    let resp = webhook_service::update_status(&state, payload).await?;
    Ok(Json(resp))
}
