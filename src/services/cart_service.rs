use uuid::Uuid;

use crate::{
    dto::cart::{AddItemRequest, ApplyCouponRequest, UpdateItemRequest},
    error::{AppError, AppResult},
    models::{Cart, CartItem},
    pricing,
    services::{coupon_service, product_service},
    session,
    state::AppState,
};

/// Read the session's cart. Line prices and stock annotations are refreshed
/// from the live catalog before recomputing totals, and the refreshed cart
/// is written back so later requests see the same figures.
pub async fn get_cart(state: &AppState, session_id: &str) -> AppResult<Cart> {
    let mut cart = session::load_cart(&state.orm, session_id).await?;

    if !cart.items.is_empty() {
        refresh_from_catalog(state, &mut cart).await?;
        pricing::recalculate(&mut cart);
        session::save_cart(&state.orm, session_id, &cart, state.cart_ttl_hours).await?;
    }

    Ok(cart)
}

pub async fn add_item(
    state: &AppState,
    session_id: &str,
    payload: AddItemRequest,
) -> AppResult<Cart> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than zero".into(),
        ));
    }

    let catalog_item =
        product_service::get_catalog_item(&state.orm, payload.product_id, payload.variant_id)
            .await?
            .ok_or(AppError::NotFound("product"))?;

    let mut cart = session::load_cart(&state.orm, session_id).await?;

    match cart.find_item_mut(payload.product_id, payload.variant_id) {
        Some(item) => {
            // Merging lines: the combined quantity must fit current stock,
            // not just the delta. checked_add keeps an absurd delta from
            // wrapping past the stock guard.
            let combined = match item.quantity.checked_add(payload.quantity) {
                Some(combined) if catalog_item.stock >= combined => combined,
                _ => return Err(AppError::OutOfStock(catalog_item.label())),
            };
            item.quantity = combined;
            item.unit_price = catalog_item.price;
            item.stock = catalog_item.stock;
        }
        None => {
            if catalog_item.stock < payload.quantity {
                return Err(AppError::OutOfStock(catalog_item.label()));
            }
            cart.items.push(CartItem {
                product_id: payload.product_id,
                variant_id: payload.variant_id,
                name: catalog_item.name,
                variant_name: catalog_item.variant_name,
                unit_price: catalog_item.price,
                quantity: payload.quantity,
                stock: catalog_item.stock,
            });
        }
    }

    pricing::recalculate(&mut cart);
    session::save_cart(&state.orm, session_id, &cart, state.cart_ttl_hours).await?;
    Ok(cart)
}

/// Set a line's quantity. Zero or negative removes the line; anything else
/// is validated against current stock and overwrites the quantity.
pub async fn update_item(
    state: &AppState,
    session_id: &str,
    payload: UpdateItemRequest,
) -> AppResult<Cart> {
    let mut cart = session::load_cart(&state.orm, session_id).await?;

    if payload.quantity <= 0 {
        cart.items.retain(|item| {
            item.product_id != payload.product_id || item.variant_id != payload.variant_id
        });
    } else {
        // A key that was never added is a missing line, regardless of what
        // the requested quantity would do to stock.
        if cart
            .find_item(payload.product_id, payload.variant_id)
            .is_none()
        {
            return Err(AppError::NotFound("cart item"));
        }

        let catalog_item =
            product_service::get_catalog_item(&state.orm, payload.product_id, payload.variant_id)
                .await?
                .ok_or(AppError::NotFound("product"))?;

        if catalog_item.stock < payload.quantity {
            return Err(AppError::OutOfStock(catalog_item.label()));
        }

        let item = cart
            .find_item_mut(payload.product_id, payload.variant_id)
            .ok_or(AppError::NotFound("cart item"))?;
        item.quantity = payload.quantity;
        item.unit_price = catalog_item.price;
        item.stock = catalog_item.stock;
    }

    pricing::recalculate(&mut cart);
    session::save_cart(&state.orm, session_id, &cart, state.cart_ttl_hours).await?;
    Ok(cart)
}

pub async fn remove_item(
    state: &AppState,
    session_id: &str,
    product_id: Uuid,
    variant_id: Option<Uuid>,
) -> AppResult<Cart> {
    let mut cart = session::load_cart(&state.orm, session_id).await?;
    cart.items
        .retain(|item| item.product_id != product_id || item.variant_id != variant_id);

    pricing::recalculate(&mut cart);
    session::save_cart(&state.orm, session_id, &cart, state.cart_ttl_hours).await?;
    Ok(cart)
}

pub async fn clear(state: &AppState, session_id: &str) -> AppResult<Cart> {
    let cart = Cart::empty();
    session::save_cart(&state.orm, session_id, &cart, state.cart_ttl_hours).await?;
    Ok(cart)
}

pub async fn apply_coupon(
    state: &AppState,
    session_id: &str,
    payload: ApplyCouponRequest,
) -> AppResult<Cart> {
    if payload.code.trim().is_empty() {
        return Err(AppError::Validation("coupon code is required".into()));
    }

    let mut cart = session::load_cart(&state.orm, session_id).await?;
    if cart.items.is_empty() {
        return Err(AppError::EmptyCart);
    }

    // Validate against the subtotal of current catalog prices, not
    // whatever was last persisted.
    refresh_from_catalog(state, &mut cart).await?;
    pricing::recalculate(&mut cart);

    let coupon = coupon_service::validate(&state.orm, payload.code.trim(), cart.subtotal).await?;
    cart.coupon = Some(coupon);

    pricing::recalculate(&mut cart);
    session::save_cart(&state.orm, session_id, &cart, state.cart_ttl_hours).await?;
    Ok(cart)
}

pub async fn remove_coupon(state: &AppState, session_id: &str) -> AppResult<Cart> {
    let mut cart = session::load_cart(&state.orm, session_id).await?;
    cart.coupon = None;

    pricing::recalculate(&mut cart);
    session::save_cart(&state.orm, session_id, &cart, state.cart_ttl_hours).await?;
    Ok(cart)
}

/// Re-sync line prices and stock annotations with the catalog. Lines whose
/// product vanished keep their last-known snapshot; order placement is
/// where a hard stock check happens.
async fn refresh_from_catalog(state: &AppState, cart: &mut Cart) -> AppResult<()> {
    for item in &mut cart.items {
        if let Some(catalog_item) =
            product_service::get_catalog_item(&state.orm, item.product_id, item.variant_id).await?
        {
            item.name = catalog_item.name;
            item.variant_name = catalog_item.variant_name;
            item.unit_price = catalog_item.price;
            item.stock = catalog_item.stock;
        }
    }
    Ok(())
}
