use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderLineView, OrderList, OrderWithItems, PlaceOrderRequest, PlaceOrderResponse},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        stock::{Column as StockCol, Entity as Stock},
        variants::{Column as VariantCol, Entity as Variants},
    },
    error::{AppError, AppResult},
    models::{Cart, CartItem, Order, OrderStatus},
    response::ApiResponse,
    notify, pricing,
    services::{cart_service, coupon_service},
    session,
    state::AppState,
};

struct CustomerInfo {
    name: String,
    email: String,
    postal_code: String,
    address: String,
    city: String,
    state: String,
}

fn required(value: &Option<String>, field: &str) -> AppResult<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

impl CustomerInfo {
    fn from_request(payload: &PlaceOrderRequest) -> AppResult<Self> {
        Ok(Self {
            name: required(&payload.customer_name, "customer_name")?,
            email: required(&payload.customer_email, "customer_email")?,
            postal_code: required(&payload.customer_postal_code, "customer_postal_code")?,
            address: required(&payload.customer_address, "customer_address")?,
            city: required(&payload.customer_city, "customer_city")?,
            state: required(&payload.customer_state, "customer_state")?,
        })
    }
}

fn item_label(item: &CartItem) -> String {
    match &item.variant_name {
        Some(variant) => format!("{} ({variant})", item.name),
        None => item.name.clone(),
    }
}

/// Place an order from the session's cart. The stock re-check, the order
/// header and line inserts, and the stock debits all happen in one
/// transaction; any failure rolls the whole thing back and leaves no
/// partial order. The cart clear and the confirmation notification run
/// after commit and cannot undo the order.
pub async fn place_order(
    state: &AppState,
    session_id: &str,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlaceOrderResponse>> {
    let customer = CustomerInfo::from_request(&payload)?;

    // Fresh prices and totals; get_cart refreshes from the catalog.
    let mut cart = cart_service::get_cart(state, session_id).await?;
    if cart.items.is_empty() {
        return Err(AppError::EmptyCart);
    }

    // Coupon state may have changed since it was applied; re-validate and
    // price against the stored record, not the cart snapshot.
    if let Some(applied) = cart.coupon.clone() {
        let fresh = coupon_service::validate(&state.orm, &applied.code, cart.subtotal).await?;
        cart.coupon = Some(fresh);
        pricing::recalculate(&mut cart);
    }

    // Lock stock rows in a fixed order so two checkouts sharing products
    // cannot deadlock on opposite acquisition orders.
    cart.items
        .sort_by_key(|item| (item.product_id, item.variant_id));

    let txn = state.orm.begin().await?;

    // Stock may have moved since the cart was last read; re-check every
    // line under a row lock before writing anything.
    for item in &cart.items {
        let mut stock_query = Stock::find().filter(StockCol::ProductId.eq(item.product_id));
        stock_query = match item.variant_id {
            Some(variant_id) => stock_query.filter(StockCol::VariantId.eq(variant_id)),
            None => stock_query.filter(StockCol::VariantId.is_null()),
        };
        let available = stock_query
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .map(|row| row.quantity)
            .unwrap_or(0);

        if available < item.quantity {
            return Err(AppError::OutOfStock(item_label(item)));
        }
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_name: Set(customer.name),
        customer_email: Set(customer.email.clone()),
        customer_postal_code: Set(customer.postal_code),
        customer_address: Set(customer.address),
        customer_city: Set(customer.city),
        customer_state: Set(customer.state),
        subtotal: Set(cart.subtotal),
        shipping: Set(cart.shipping),
        discount: Set(cart.discount),
        total: Set(cart.total),
        coupon_id: Set(cart.coupon.as_ref().map(|c| c.id)),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for item in &cart.items {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            variant_id: Set(item.variant_id),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        // Relative decrement guarded by `quantity >= ?`; zero rows touched
        // means a concurrent checkout got there first.
        let mut debit = Stock::update_many()
            .col_expr(
                StockCol::Quantity,
                Expr::col(StockCol::Quantity).sub(item.quantity),
            )
            .filter(StockCol::ProductId.eq(item.product_id))
            .filter(StockCol::Quantity.gte(item.quantity));
        debit = match item.variant_id {
            Some(variant_id) => debit.filter(StockCol::VariantId.eq(variant_id)),
            None => debit.filter(StockCol::VariantId.is_null()),
        };

        let result = debit.exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::OutOfStock(item_label(item)));
        }
    }

    txn.commit().await?;

    // Cart residue after a committed order is a display problem, not a
    // data problem; log and move on.
    if let Err(err) =
        session::save_cart(&state.orm, session_id, &Cart::empty(), state.cart_ttl_hours).await
    {
        tracing::warn!(error = %err, session_id, "failed to clear cart after checkout");
    }

    notify::dispatch(
        state.pool.clone(),
        customer.email,
        "Order confirmation".to_string(),
        format!("Your order {} for {} was received.", order.id, order.total),
    );

    Ok(ApiResponse::success(
        "Order placed",
        PlaceOrderResponse { order_id: order.id },
    ))
}

pub async fn list_orders(state: &AppState) -> AppResult<ApiResponse<OrderList>> {
    let orders = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .all(&state.orm)
        .await?;

    let views = line_views(state, items).await?;
    let mut by_order: HashMap<Uuid, Vec<OrderLineView>> = HashMap::new();
    for (order_id, view) in views {
        by_order.entry(order_id).or_default().push(view);
    }

    let items = orders
        .into_iter()
        .map(|model| {
            let lines = by_order.remove(&model.id).unwrap_or_default();
            OrderWithItems {
                order: order_from_entity(model),
                items: lines,
            }
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderList { items },
    ))
}

pub async fn get_order(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("order"))?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?;

    let lines = line_views(state, items)
        .await?
        .into_iter()
        .map(|(_, view)| view)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items: lines,
        },
    ))
}

/// Join order lines with product and variant names for display.
async fn line_views(
    state: &AppState,
    items: Vec<OrderItemModel>,
) -> AppResult<Vec<(Uuid, OrderLineView)>> {
    let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
    let variant_ids: Vec<Uuid> = items.iter().filter_map(|i| i.variant_id).collect();

    let product_names: HashMap<Uuid, String> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let variant_names: HashMap<Uuid, String> = Variants::find()
        .filter(VariantCol::Id.is_in(variant_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|v| (v.id, v.name))
        .collect();

    Ok(items
        .into_iter()
        .map(|item| {
            let view = OrderLineView {
                id: item.id,
                product_id: item.product_id,
                name: product_names
                    .get(&item.product_id)
                    .cloned()
                    .unwrap_or_default(),
                variant_id: item.variant_id,
                variant_name: item
                    .variant_id
                    .and_then(|id| variant_names.get(&id).cloned()),
                quantity: item.quantity,
                unit_price: item.unit_price,
                subtotal: item.unit_price * Decimal::from(item.quantity),
            };
            (item.order_id, view)
        })
        .collect())
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        customer_postal_code: model.customer_postal_code,
        customer_address: model.customer_address,
        customer_city: model.customer_city,
        customer_state: model.customer_state,
        subtotal: model.subtotal,
        shipping: model.shipping,
        discount: model.discount,
        total: model.total,
        coupon_id: model.coupon_id,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
