use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::response::ApiResponse;

/// Why a coupon code was refused. Checks run in a fixed order; the first
/// failing check wins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CouponRejection {
    #[error("coupon not found")]
    NotFound,

    #[error("coupon is inactive")]
    Inactive,

    #[error("coupon is outside its validity window")]
    Expired,

    #[error("minimum order value for this coupon is {0}")]
    BelowMinimum(Decimal),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("cart is empty")]
    EmptyCart,

    #[error("insufficient stock for {0}")]
    OutOfStock(String),

    #[error("{0}")]
    CouponRejected(CouponRejection),

    #[error("invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_)
            | AppError::EmptyCart
            | AppError::OutOfStock(_)
            | AppError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            AppError::CouponRejected(reason) => match reason {
                CouponRejection::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            },
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Storage failures keep their detail in the logs, not the response body.
        match &self {
            AppError::DbError(err) => tracing::error!(error = %err, "database error"),
            AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
            AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
            _ => {}
        }

        let message = self.to_string();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
