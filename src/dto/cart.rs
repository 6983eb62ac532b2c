use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Cart;

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveItemQuery {
    pub variant_id: Option<Uuid>,
}

/// Every cart endpoint answers with the full recalculated snapshot plus
/// the session id the client should keep sending.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub cart: Cart,
}
