use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::coupons::{CouponList, CreateCouponRequest},
    entity::coupons::{ActiveModel as CouponActive, Column as CouponCol, Entity as Coupons},
    error::{AppError, AppResult, CouponRejection},
    models::{Coupon, CouponRef},
    response::ApiResponse,
    state::AppState,
};

/// Validate a coupon code against an order subtotal. Checks run in a fixed
/// precedence: unknown code, inactive, outside the inclusive date window,
/// below the configured minimum. Runs on every apply and again at order
/// placement; coupon state is never trusted from a cart snapshot.
pub async fn validate(
    conn: &impl ConnectionTrait,
    code: &str,
    subtotal: Decimal,
) -> AppResult<CouponRef> {
    let coupon = Coupons::find()
        .filter(CouponCol::Code.eq(code))
        .one(conn)
        .await?
        .ok_or(AppError::CouponRejected(CouponRejection::NotFound))?;

    if !coupon.active {
        return Err(AppError::CouponRejected(CouponRejection::Inactive));
    }

    // Calendar-date comparison, both bounds inclusive.
    let today = Utc::now().date_naive();
    if today < coupon.starts_on || today > coupon.ends_on {
        return Err(AppError::CouponRejected(CouponRejection::Expired));
    }

    if coupon.minimum_order > Decimal::ZERO && subtotal < coupon.minimum_order {
        return Err(AppError::CouponRejected(CouponRejection::BelowMinimum(
            coupon.minimum_order,
        )));
    }

    Ok(CouponRef {
        id: coupon.id,
        code: coupon.code,
        discount: coupon.discount,
    })
}

pub async fn create_coupon(
    state: &AppState,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    if payload.code.trim().is_empty() {
        return Err(AppError::Validation("coupon code is required".into()));
    }
    if payload.discount <= Decimal::ZERO {
        return Err(AppError::Validation(
            "discount must be greater than zero".into(),
        ));
    }
    if payload.ends_on < payload.starts_on {
        return Err(AppError::Validation(
            "ends_on must not be before starts_on".into(),
        ));
    }

    let code = payload.code.trim().to_string();
    let existing = Coupons::find()
        .filter(CouponCol::Code.eq(code.clone()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("coupon code already exists".into()));
    }

    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        discount: Set(payload.discount),
        minimum_order: Set(payload.minimum_order.unwrap_or(Decimal::ZERO)),
        starts_on: Set(payload.starts_on),
        ends_on: Set(payload.ends_on),
        active: Set(payload.active.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success("Coupon created", coupon_from_entity(coupon)))
}

pub async fn list_coupons(state: &AppState) -> AppResult<ApiResponse<CouponList>> {
    let items = Coupons::find()
        .order_by_desc(CouponCol::StartsOn)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(coupon_from_entity)
        .collect();

    Ok(ApiResponse::success("OK", CouponList { items }))
}

fn coupon_from_entity(model: crate::entity::coupons::Model) -> Coupon {
    Coupon {
        id: model.id,
        code: model.code,
        discount: model.discount,
        minimum_order: model.minimum_order,
        starts_on: model.starts_on,
        ends_on: model.ends_on,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
