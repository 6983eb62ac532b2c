use axum_mini_erp::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::{AddItemRequest, ApplyCouponRequest, UpdateItemRequest},
        orders::PlaceOrderRequest,
        products::{
            CreateProductRequest, CreateVariantRequest, UpdateProductRequest, UpdateVariantRequest,
        },
        webhook::UpdateOrderStatusRequest,
    },
    entity::{
        coupons::ActiveModel as CouponActive,
        products::ActiveModel as ProductActive,
        stock::{ActiveModel as StockActive, Column as StockCol, Entity as Stock},
    },
    error::{AppError, CouponRejection},
    services::{cart_service, order_service, product_service, webhook_service},
    state::AppState,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, Set, Statement,
};
use uuid::Uuid;

fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn customer() -> PlaceOrderRequest {
    PlaceOrderRequest {
        customer_name: Some("Jo Silva".into()),
        customer_email: Some("jo@example.com".into()),
        customer_postal_code: Some("01310-100".into()),
        customer_address: Some("Av. Paulista 1000".into()),
        customer_city: Some("São Paulo".into()),
        customer_state: Some("SP".into()),
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    let pool = create_pool(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, carts, notifications, stock, variants, coupons, products RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        cart_ttl_hours: 24 * 7,
    })
}

async fn seed_product(state: &AppState, name: &str, price: Decimal, stock: i32) -> anyhow::Result<Uuid> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.into()),
        price: Set(price),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    StockActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        variant_id: Set(None),
        quantity: Set(stock),
    }
    .insert(&state.orm)
    .await?;

    Ok(product.id)
}

async fn seed_coupon(
    state: &AppState,
    code: &str,
    active: bool,
    starts_on: chrono::NaiveDate,
    ends_on: chrono::NaiveDate,
) -> anyhow::Result<()> {
    CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code.into()),
        discount: Set(dec("5.00")),
        minimum_order: Set(Decimal::ZERO),
        starts_on: Set(starts_on),
        ends_on: Set(ends_on),
        active: Set(active),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(())
}

async fn stock_on_hand(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let row = Stock::find()
        .filter(StockCol::ProductId.eq(product_id))
        .filter(StockCol::VariantId.is_null())
        .one(&state.orm)
        .await?
        .expect("stock row");
    Ok(row.quantity)
}

// Full flow: cart pricing, coupon rejection, checkout with stock debit,
// idempotent cancellation, and a concurrent-checkout oversell check.
#[tokio::test]
async fn cart_checkout_and_cancel_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let product_id = seed_product(&state, "Test Widget", dec("30.00"), 10).await?;

    let today = Utc::now().date_naive();
    CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set("MIN100".into()),
        discount: Set(dec("15.00")),
        minimum_order: Set(dec("100.00")),
        starts_on: Set(today - Duration::days(7)),
        ends_on: Set(today + Duration::days(7)),
        active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let session = "test-session-checkout";

    // Coupon on an empty cart fails fast.
    let err = cart_service::apply_coupon(
        &state,
        session,
        ApplyCouponRequest {
            code: "MIN100".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::EmptyCart));

    // 30.00 x 2 lands in the 52.00..=166.59 shipping band.
    let cart = cart_service::add_item(
        &state,
        session,
        AddItemRequest {
            product_id,
            variant_id: None,
            quantity: 2,
        },
    )
    .await?;
    assert_eq!(cart.subtotal, dec("60.00"));
    assert_eq!(cart.shipping, dec("15.00"));
    assert_eq!(cart.discount, Decimal::ZERO);
    assert_eq!(cart.total, dec("75.00"));

    // Subtotal 60 is below the coupon's 100 minimum.
    let err = cart_service::apply_coupon(
        &state,
        session,
        ApplyCouponRequest {
            code: "MIN100".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::CouponRejected(CouponRejection::BelowMinimum(_))
    ));
    let cart = cart_service::get_cart(&state, session).await?;
    assert_eq!(cart.discount, Decimal::ZERO);

    // Each rejection reason surfaces as its own variant: unknown code,
    // deactivated coupon, coupon outside its date window.
    seed_coupon(
        &state,
        "RETIRED",
        false,
        today - Duration::days(30),
        today + Duration::days(30),
    )
    .await?;
    seed_coupon(
        &state,
        "LASTYEAR",
        true,
        today - Duration::days(60),
        today - Duration::days(30),
    )
    .await?;

    for (code, expected) in [
        ("NOSUCH", CouponRejection::NotFound),
        ("RETIRED", CouponRejection::Inactive),
        ("LASTYEAR", CouponRejection::Expired),
    ] {
        let err = cart_service::apply_coupon(
            &state,
            session,
            ApplyCouponRequest { code: code.into() },
        )
        .await
        .unwrap_err();
        match err {
            AppError::CouponRejected(reason) => assert_eq!(
                std::mem::discriminant(&reason),
                std::mem::discriminant(&expected),
                "coupon {code}"
            ),
            other => panic!("expected coupon rejection for {code}, got {other:?}"),
        }
    }

    // Merging a line with an absurd quantity must not wrap the stock check.
    let err = cart_service::add_item(
        &state,
        session,
        AddItemRequest {
            product_id,
            variant_id: None,
            quantity: i32::MAX,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::OutOfStock(_)));
    let cart = cart_service::get_cart(&state, session).await?;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);

    // Updating a key that was never added reports a missing line, even when
    // the requested quantity also exceeds stock.
    let side_id = seed_product(&state, "Side Widget", dec("10.00"), 5).await?;
    let err = cart_service::update_item(
        &state,
        session,
        UpdateItemRequest {
            product_id: side_id,
            variant_id: None,
            quantity: 99,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound("cart item")));

    // Missing customer field is named in the error.
    let mut incomplete = customer();
    incomplete.customer_email = None;
    let err = order_service::place_order(&state, session, incomplete)
        .await
        .unwrap_err();
    match err {
        AppError::Validation(msg) => assert!(msg.contains("customer_email")),
        other => panic!("expected validation error, got {other:?}"),
    }

    // Checkout debits stock and clears the cart.
    let placed = order_service::place_order(&state, session, customer()).await?;
    let order_id = placed.data.expect("order data").order_id;

    assert_eq!(stock_on_hand(&state, product_id).await?, 8);
    let cart = cart_service::get_cart(&state, session).await?;
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, Decimal::ZERO);

    let fetched = order_service::get_order(&state, order_id).await?;
    let order = fetched.data.expect("order with items");
    assert_eq!(order.order.status, "pending");
    assert_eq!(order.order.subtotal, dec("60.00"));
    assert_eq!(order.order.shipping, dec("15.00"));
    assert_eq!(order.order.discount, Decimal::ZERO);
    assert_eq!(order.order.total, dec("75.00"));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(order.items[0].unit_price, dec("30.00"));

    // Unknown status is rejected.
    let err = webhook_service::update_status(
        &state,
        UpdateOrderStatusRequest {
            order_id,
            status: "refunded".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatus(_)));

    // Cancelling credits the stock back, exactly once.
    webhook_service::update_status(
        &state,
        UpdateOrderStatusRequest {
            order_id,
            status: "cancelled".into(),
        },
    )
    .await?;
    assert_eq!(stock_on_hand(&state, product_id).await?, 10);

    webhook_service::update_status(
        &state,
        UpdateOrderStatusRequest {
            order_id,
            status: "cancelled".into(),
        },
    )
    .await?;
    assert_eq!(stock_on_hand(&state, product_id).await?, 10);

    let fetched = order_service::get_order(&state, order_id).await?;
    assert_eq!(fetched.data.expect("order").order.status, "cancelled");

    // Cancelled is terminal; the order cannot be revived.
    let err = webhook_service::update_status(
        &state,
        UpdateOrderStatusRequest {
            order_id,
            status: "paid".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Setting a line's quantity to zero removes it entirely.
    let zero_session = "test-session-qty-zero";
    cart_service::add_item(
        &state,
        zero_session,
        AddItemRequest {
            product_id,
            variant_id: None,
            quantity: 2,
        },
    )
    .await?;
    let cart = cart_service::update_item(
        &state,
        zero_session,
        UpdateItemRequest {
            product_id,
            variant_id: None,
            quantity: 0,
        },
    )
    .await?;
    assert!(cart.items.is_empty());
    assert_eq!(cart.subtotal, Decimal::ZERO);
    assert_eq!(cart.total, Decimal::ZERO);

    // Two checkouts race for the last units; exactly one may win.
    let scarce_id = seed_product(&state, "Scarce Widget", dec("80.00"), 3).await?;
    for session in ["race-a", "race-b"] {
        cart_service::add_item(
            &state,
            session,
            AddItemRequest {
                product_id: scarce_id,
                variant_id: None,
                quantity: 3,
            },
        )
        .await?;
    }

    let (first, second) = tokio::join!(
        order_service::place_order(&state, "race-a", customer()),
        order_service::place_order(&state, "race-b", customer()),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one racing checkout must succeed");
    let loser = if first.is_err() { first } else { second };
    assert!(matches!(loser.unwrap_err(), AppError::OutOfStock(_)));

    assert_eq!(stock_on_hand(&state, scarce_id).await?, 0);

    // Two checkouts holding the same products in opposite order must both
    // complete; stock rows are locked in a fixed order.
    let alpha_id = seed_product(&state, "Alpha Widget", dec("20.00"), 10).await?;
    let beta_id = seed_product(&state, "Beta Widget", dec("20.00"), 10).await?;
    for (session, first, second) in [
        ("interleave-a", alpha_id, beta_id),
        ("interleave-b", beta_id, alpha_id),
    ] {
        for product_id in [first, second] {
            cart_service::add_item(
                &state,
                session,
                AddItemRequest {
                    product_id,
                    variant_id: None,
                    quantity: 2,
                },
            )
            .await?;
        }
    }

    let (first, second) = tokio::join!(
        order_service::place_order(&state, "interleave-a", customer()),
        order_service::place_order(&state, "interleave-b", customer()),
    );
    first?;
    second?;
    assert_eq!(stock_on_hand(&state, alpha_id).await?, 6);
    assert_eq!(stock_on_hand(&state, beta_id).await?, 6);

    product_management(&state).await?;

    Ok(())
}

// Catalog management: fetch a single product, partial updates of name,
// price, base stock and variants.
async fn product_management(state: &AppState) -> anyhow::Result<()> {
    let created = product_service::create_product(
        state,
        CreateProductRequest {
            name: "Configurable Tee".into(),
            price: dec("45.00"),
            stock: None,
            variants: Some(vec![CreateVariantRequest {
                name: "P".into(),
                stock: Some(5),
            }]),
        },
    )
    .await?
    .data
    .expect("created product");

    let fetched = product_service::get_product(state, created.id)
        .await?
        .data
        .expect("product view");
    assert_eq!(fetched.name, "Configurable Tee");
    assert_eq!(fetched.price, dec("45.00"));
    assert_eq!(fetched.variants.len(), 1);
    assert_eq!(fetched.variants[0].stock, 5);

    // Name and price overwrite; untouched fields survive.
    let updated = product_service::update_product(
        state,
        created.id,
        UpdateProductRequest {
            name: Some("Configurable Tee v2".into()),
            price: Some(dec("55.00")),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("updated product");
    assert_eq!(updated.name, "Configurable Tee v2");
    assert_eq!(updated.price, dec("55.00"));
    assert_eq!(updated.variants.len(), 1);
    assert_eq!(updated.variants[0].stock, 5);

    // Variant payload: restock the existing variant, add a new one.
    let variant_id = updated.variants[0].id;
    let updated = product_service::update_product(
        state,
        created.id,
        UpdateProductRequest {
            variants: Some(vec![
                UpdateVariantRequest {
                    id: Some(variant_id),
                    name: None,
                    stock: Some(12),
                },
                UpdateVariantRequest {
                    id: None,
                    name: Some("G".into()),
                    stock: Some(3),
                },
            ]),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("updated product");
    assert_eq!(updated.variants.len(), 2);
    let by_name = |name: &str| {
        updated
            .variants
            .iter()
            .find(|v| v.name == name)
            .expect("variant")
            .stock
    };
    assert_eq!(by_name("P"), 12);
    assert_eq!(by_name("G"), 3);

    // An empty payload and an unknown product are rejected.
    let err = product_service::update_product(state, created.id, UpdateProductRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = product_service::update_product(
        state,
        Uuid::new_v4(),
        UpdateProductRequest {
            price: Some(dec("10.00")),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound("product")));

    Ok(())
}
