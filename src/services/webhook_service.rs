use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};

use crate::{
    dto::webhook::{StatusUpdateResponse, UpdateOrderStatusRequest},
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Entity as Orders},
        stock::{Column as StockCol, Entity as Stock},
    },
    error::{AppError, AppResult},
    models::OrderStatus,
    notify,
    response::ApiResponse,
    state::AppState,
};

/// Apply a status transition from the fulfilment webhook. Any of the five
/// statuses is accepted as a direct target; moving into `cancelled` credits
/// the order's quantities back to stock in the same transaction, exactly
/// once — re-cancelling is a stock no-op.
pub async fn update_status(
    state: &AppState,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<StatusUpdateResponse>> {
    let target = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::InvalidStatus(payload.status.clone()))?;

    let order = Orders::find_by_id(payload.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("order"))?;

    let customer_email = order.customer_email.clone();

    // Cancelled is terminal; the stock was already credited back and a
    // revived order would desynchronize it.
    if order.status == OrderStatus::Cancelled.as_str() && target != OrderStatus::Cancelled {
        return Err(AppError::Validation(
            "cancelled orders cannot change status".into(),
        ));
    }

    if target == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled.as_str() {
        let txn = state.orm.begin().await?;

        // Re-read under lock; a concurrent cancel must not double-credit.
        let order = Orders::find_by_id(payload.order_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound("order"))?;

        if order.status != OrderStatus::Cancelled.as_str() {
            let items = OrderItems::find()
                .filter(OrderItemCol::OrderId.eq(order.id))
                .all(&txn)
                .await?;

            for item in &items {
                let mut credit = Stock::update_many()
                    .col_expr(
                        StockCol::Quantity,
                        Expr::col(StockCol::Quantity).add(item.quantity),
                    )
                    .filter(StockCol::ProductId.eq(item.product_id));
                credit = match item.variant_id {
                    Some(variant_id) => credit.filter(StockCol::VariantId.eq(variant_id)),
                    None => credit.filter(StockCol::VariantId.is_null()),
                };
                credit.exec(&txn).await?;
            }

            let mut active: OrderActive = order.into();
            active.status = Set(OrderStatus::Cancelled.as_str().to_string());
            active.update(&txn).await?;
        }

        txn.commit().await?;
    } else {
        let mut active: OrderActive = order.into();
        active.status = Set(target.as_str().to_string());
        active.update(&state.orm).await?;
    }

    notify::dispatch(
        state.pool.clone(),
        customer_email,
        "Order status update".to_string(),
        format!("Your order {} is now {}.", payload.order_id, target),
    );

    Ok(ApiResponse::success(
        "Order status updated",
        StatusUpdateResponse {
            order_id: payload.order_id,
            status: target.as_str().to_string(),
        },
    ))
}
