use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::coupons::{CouponList, CreateCouponRequest},
    error::AppResult,
    models::Coupon,
    response::ApiResponse,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_coupons).post(create_coupon))
}

#[utoipa::path(
    get,
    path = "/api/coupons",
    responses(
        (status = 200, description = "All coupons", body = ApiResponse<CouponList>),
    ),
    tag = "Coupons"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    let resp = coupon_service::list_coupons(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 200, description = "Coupon created", body = ApiResponse<Coupon>),
        (status = 400, description = "Invalid payload or duplicate code"),
    ),
    tag = "Coupons"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    Json(payload): Json<CreateCouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    let resp = coupon_service::create_coupon(&state, payload).await?;
    Ok(Json(resp))
}
