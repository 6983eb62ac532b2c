use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{
        AddItemRequest, ApplyCouponRequest, CartResponse, RemoveItemQuery, UpdateItemRequest,
    },
    error::AppResult,
    models::Cart,
    response::ApiResponse,
    services::cart_service,
    session::SessionId,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(get_cart).post(add_item).put(update_item).delete(clear_cart),
        )
        .route("/items/{product_id}", delete(remove_item))
        .route("/coupon", post(apply_coupon).delete(remove_coupon))
}

fn cart_response(session_id: String, cart: Cart) -> Json<ApiResponse<CartResponse>> {
    Json(ApiResponse::success(
        "OK",
        CartResponse { session_id, cart },
    ))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("x-session-id" = Option<String>, Header, description = "Cart session id; omit to start a new session")
    ),
    responses(
        (status = 200, description = "Current cart with recalculated totals", body = ApiResponse<CartResponse>)
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = cart_service::get_cart(&state, &session_id).await?;
    Ok(cart_response(session_id, cart))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Item added or merged", body = ApiResponse<CartResponse>),
        (status = 400, description = "Invalid quantity or insufficient stock"),
        (status = 404, description = "Product or variant not found"),
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = cart_service::add_item(&state, &session_id, payload).await?;
    Ok(cart_response(session_id, cart))
}

#[utoipa::path(
    put,
    path = "/api/cart",
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Quantity updated; zero removes the line", body = ApiResponse<CartResponse>),
        (status = 400, description = "Insufficient stock"),
        (status = 404, description = "Product or cart item not found"),
    ),
    tag = "Cart"
)]
pub async fn update_item(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(payload): Json<UpdateItemRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = cart_service::update_item(&state, &session_id, payload).await?;
    Ok(cart_response(session_id, cart))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID"),
        ("variant_id" = Option<Uuid>, Query, description = "Variant ID")
    ),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<CartResponse>),
    ),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Path(product_id): Path<Uuid>,
    Query(query): Query<RemoveItemQuery>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = cart_service::remove_item(&state, &session_id, product_id, query.variant_id).await?;
    Ok(cart_response(session_id, cart))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart reset to empty", body = ApiResponse<CartResponse>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = cart_service::clear(&state, &session_id).await?;
    Ok(cart_response(session_id, cart))
}

#[utoipa::path(
    post,
    path = "/api/cart/coupon",
    request_body = ApplyCouponRequest,
    responses(
        (status = 200, description = "Coupon applied", body = ApiResponse<CartResponse>),
        (status = 400, description = "Empty cart or coupon rejected"),
        (status = 404, description = "Coupon not found"),
    ),
    tag = "Cart"
)]
pub async fn apply_coupon(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = cart_service::apply_coupon(&state, &session_id, payload).await?;
    Ok(cart_response(session_id, cart))
}

#[utoipa::path(
    delete,
    path = "/api/cart/coupon",
    responses(
        (status = 200, description = "Coupon removed", body = ApiResponse<CartResponse>),
    ),
    tag = "Cart"
)]
pub async fn remove_coupon(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> AppResult<Json<ApiResponse<CartResponse>>> {
    let cart = cart_service::remove_coupon(&state, &session_id).await?;
    Ok(cart_response(session_id, cart))
}
