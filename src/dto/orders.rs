use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Order;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_postal_code: Option<String>,
    pub customer_address: Option<String>,
    pub customer_city: Option<String>,
    pub customer_state: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub order_id: Uuid,
}

/// Order line joined with catalog names for display.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub variant_id: Option<Uuid>,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLineView>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}
