use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use axum_mini_erp::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    seed_products(&pool).await?;
    seed_coupons(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // (name, price, base stock, variants)
    let products: Vec<(&str, Decimal, i32, Vec<(&str, i32)>)> = vec![
        ("Canvas Tote", Decimal::new(49_90, 2), 30, vec![]),
        (
            "Logo T-Shirt",
            Decimal::new(59_90, 2),
            0,
            vec![("S", 10), ("M", 25), ("L", 15)],
        ),
        ("Enamel Mug", Decimal::new(34_50, 2), 80, vec![]),
        (
            "Zip Hoodie",
            Decimal::new(189_00, 2),
            0,
            vec![("M", 12), ("L", 8)],
        ),
    ];

    for (name, price, stock, variants) in products {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM products WHERE name = $1")
                .bind(name)
                .fetch_optional(pool)
                .await?;
        if existing.is_some() {
            continue;
        }

        let product_id = Uuid::new_v4();
        sqlx::query("INSERT INTO products (id, name, price) VALUES ($1, $2, $3)")
            .bind(product_id)
            .bind(name)
            .bind(price)
            .execute(pool)
            .await?;

        if variants.is_empty() {
            sqlx::query(
                "INSERT INTO stock (id, product_id, variant_id, quantity) VALUES ($1, $2, NULL, $3)",
            )
            .bind(Uuid::new_v4())
            .bind(product_id)
            .bind(stock)
            .execute(pool)
            .await?;
        } else {
            for (variant_name, quantity) in variants {
                let variant_id = Uuid::new_v4();
                sqlx::query("INSERT INTO variants (id, product_id, name) VALUES ($1, $2, $3)")
                    .bind(variant_id)
                    .bind(product_id)
                    .bind(variant_name)
                    .execute(pool)
                    .await?;
                sqlx::query(
                    "INSERT INTO stock (id, product_id, variant_id, quantity) VALUES ($1, $2, $3, $4)",
                )
                .bind(Uuid::new_v4())
                .bind(product_id)
                .bind(variant_id)
                .bind(quantity)
                .execute(pool)
                .await?;
            }
        }

        println!("Seeded product {name}");
    }

    Ok(())
}

async fn seed_coupons(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let coupons = vec![
        ("WELCOME10", Decimal::new(10_00, 2), Decimal::ZERO, true),
        ("BULK50", Decimal::new(50_00, 2), Decimal::new(150_00, 2), true),
        ("RETIRED", Decimal::new(25_00, 2), Decimal::ZERO, false),
    ];

    for (code, discount, minimum, active) in coupons {
        sqlx::query(
            r#"
            INSERT INTO coupons (id, code, discount, minimum_order, starts_on, ends_on, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(discount)
        .bind(minimum)
        .bind(today - Duration::days(30))
        .bind(today + Duration::days(30))
        .bind(active)
        .execute(pool)
        .await?;
    }

    println!("Seeded coupons");
    Ok(())
}
