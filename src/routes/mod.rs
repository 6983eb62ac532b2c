use axum::Router;

use crate::state::AppState;

pub mod cart;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod orders;
pub mod products;
pub mod webhook;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/coupons", coupons::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/webhook", webhook::router())
}
