use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Coupon;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    pub discount: Decimal,
    pub minimum_order: Option<Decimal>,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CouponList {
    pub items: Vec<Coupon>,
}
