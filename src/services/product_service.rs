use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::products::{
        CreateProductRequest, ProductList, ProductWithVariants, UpdateProductRequest,
        VariantWithStock,
    },
    entity::{
        products::{ActiveModel as ProductActive, Entity as Products},
        stock::{ActiveModel as StockActive, Column as StockCol, Entity as Stock},
        variants::{ActiveModel as VariantActive, Column as VariantCol, Entity as Variants},
    },
    error::{AppError, AppResult},
    response::ApiResponse,
    state::AppState,
};

/// What the cart needs to know about one purchasable (product, variant)
/// pair: display names, the live price and the quantity on hand.
#[derive(Debug, Clone)]
pub struct CatalogItem {
    pub name: String,
    pub variant_name: Option<String>,
    pub price: Decimal,
    pub stock: i32,
}

impl CatalogItem {
    /// Human-readable label used in out-of-stock messages.
    pub fn label(&self) -> String {
        match &self.variant_name {
            Some(variant) => format!("{} ({variant})", self.name),
            None => self.name.clone(),
        }
    }
}

/// Resolve a (product, variant) pair against the live catalog. `Ok(None)`
/// means the product or the requested variant does not exist; a missing
/// stock row reads as zero on hand.
pub async fn get_catalog_item(
    conn: &impl ConnectionTrait,
    product_id: Uuid,
    variant_id: Option<Uuid>,
) -> AppResult<Option<CatalogItem>> {
    let Some(product) = Products::find_by_id(product_id).one(conn).await? else {
        return Ok(None);
    };

    let variant_name = match variant_id {
        Some(variant_id) => {
            let variant = Variants::find_by_id(variant_id)
                .filter(VariantCol::ProductId.eq(product_id))
                .one(conn)
                .await?;
            match variant {
                Some(variant) => Some(variant.name),
                None => return Ok(None),
            }
        }
        None => None,
    };

    let mut stock_query = Stock::find().filter(StockCol::ProductId.eq(product_id));
    stock_query = match variant_id {
        Some(variant_id) => stock_query.filter(StockCol::VariantId.eq(variant_id)),
        None => stock_query.filter(StockCol::VariantId.is_null()),
    };
    let quantity = stock_query
        .one(conn)
        .await?
        .map(|row| row.quantity)
        .unwrap_or(0);

    Ok(Some(CatalogItem {
        name: product.name,
        variant_name,
        price: product.price,
        stock: quantity,
    }))
}

pub async fn create_product(
    state: &AppState,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductWithVariants>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("product name is required".into()));
    }
    if payload.price <= Decimal::ZERO {
        return Err(AppError::Validation(
            "price must be greater than zero".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        price: Set(payload.price),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut variants = Vec::new();
    let mut base_stock = 0;

    match payload.variants {
        Some(requested) if !requested.is_empty() => {
            for variant_req in requested {
                if variant_req.name.trim().is_empty() {
                    continue;
                }
                let variant = VariantActive {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product.id),
                    name: Set(variant_req.name.trim().to_string()),
                }
                .insert(&txn)
                .await?;

                let quantity = variant_req.stock.unwrap_or(0).max(0);
                StockActive {
                    id: Set(Uuid::new_v4()),
                    product_id: Set(product.id),
                    variant_id: Set(Some(variant.id)),
                    quantity: Set(quantity),
                }
                .insert(&txn)
                .await?;

                variants.push(VariantWithStock {
                    id: variant.id,
                    name: variant.name,
                    stock: quantity,
                });
            }
        }
        _ => {
            base_stock = payload.stock.unwrap_or(0).max(0);
            StockActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(product.id),
                variant_id: Set(None),
                quantity: Set(base_stock),
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Product created",
        ProductWithVariants {
            id: product.id,
            name: product.name,
            price: product.price,
            stock: base_stock,
            variants,
        },
    ))
}

pub async fn get_product(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<ProductWithVariants>> {
    let view = product_view(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    Ok(ApiResponse::success("OK", view))
}

/// Partial product update. Name and price overwrite when provided; a bare
/// `stock` value sets the variant-less record; each entry in `variants`
/// either updates an existing variant (by id) or creates a new one. Variants
/// absent from the payload are left alone. All writes share one transaction.
pub async fn update_product(
    state: &AppState,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductWithVariants>> {
    if payload.name.is_none()
        && payload.price.is_none()
        && payload.stock.is_none()
        && payload.variants.is_none()
    {
        return Err(AppError::Validation("no fields to update".into()));
    }
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("product name is required".into()));
        }
    }
    if let Some(price) = payload.price {
        if price <= Decimal::ZERO {
            return Err(AppError::Validation(
                "price must be greater than zero".into(),
            ));
        }
    }

    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("product"))?;

    let txn = state.orm.begin().await?;

    let mut active: ProductActive = product.into();
    if let Some(name) = &payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if active.is_changed() {
        active.update(&txn).await?;
    }

    // A bare stock figure targets the variant-less record and is ignored
    // when a variant payload is present.
    if payload.variants.is_none() {
        if let Some(quantity) = payload.stock {
            set_stock(&txn, id, None, quantity.max(0)).await?;
        }
    }

    if let Some(requested) = payload.variants {
        let existing = Variants::find()
            .filter(VariantCol::ProductId.eq(id))
            .all(&txn)
            .await?;

        for variant_req in requested {
            match variant_req.id {
                Some(variant_id) => {
                    // Ids that do not belong to this product are skipped.
                    let Some(current) = existing.iter().find(|v| v.id == variant_id) else {
                        continue;
                    };
                    if let Some(name) = variant_req
                        .name
                        .as_deref()
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                    {
                        let mut active: VariantActive = current.clone().into();
                        active.name = Set(name.to_string());
                        active.update(&txn).await?;
                    }
                    if let Some(quantity) = variant_req.stock {
                        set_stock(&txn, id, Some(variant_id), quantity.max(0)).await?;
                    }
                }
                None => {
                    let Some(name) = variant_req
                        .name
                        .as_deref()
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                    else {
                        continue;
                    };
                    let variant = VariantActive {
                        id: Set(Uuid::new_v4()),
                        product_id: Set(id),
                        name: Set(name.to_string()),
                    }
                    .insert(&txn)
                    .await?;
                    set_stock(
                        &txn,
                        id,
                        Some(variant.id),
                        variant_req.stock.unwrap_or(0).max(0),
                    )
                    .await?;
                }
            }
        }
    }

    txn.commit().await?;

    let view = product_view(&state.orm, id)
        .await?
        .ok_or(AppError::NotFound("product"))?;
    Ok(ApiResponse::success("Product updated", view))
}

/// Overwrite (or create) the stock record for a (product, variant) pair.
async fn set_stock(
    conn: &impl ConnectionTrait,
    product_id: Uuid,
    variant_id: Option<Uuid>,
    quantity: i32,
) -> AppResult<()> {
    let mut query = Stock::find().filter(StockCol::ProductId.eq(product_id));
    query = match variant_id {
        Some(variant_id) => query.filter(StockCol::VariantId.eq(variant_id)),
        None => query.filter(StockCol::VariantId.is_null()),
    };

    match query.one(conn).await? {
        Some(row) => {
            let mut active: StockActive = row.into();
            active.quantity = Set(quantity);
            active.update(conn).await?;
        }
        None => {
            StockActive {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                variant_id: Set(variant_id),
                quantity: Set(quantity),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

async fn product_view(
    conn: &impl ConnectionTrait,
    product_id: Uuid,
) -> AppResult<Option<ProductWithVariants>> {
    let Some(product) = Products::find_by_id(product_id).one(conn).await? else {
        return Ok(None);
    };

    let variants = Variants::find()
        .filter(VariantCol::ProductId.eq(product_id))
        .order_by_asc(VariantCol::Name)
        .all(conn)
        .await?;

    let stock_rows = Stock::find()
        .filter(StockCol::ProductId.eq(product_id))
        .all(conn)
        .await?;

    let mut variant_stock: HashMap<Uuid, i32> = HashMap::new();
    let mut base_stock = 0;
    for row in stock_rows {
        match row.variant_id {
            Some(variant_id) => {
                variant_stock.insert(variant_id, row.quantity);
            }
            None => base_stock = row.quantity,
        }
    }

    Ok(Some(ProductWithVariants {
        id: product.id,
        name: product.name,
        price: product.price,
        stock: base_stock,
        variants: variants
            .into_iter()
            .map(|v| VariantWithStock {
                id: v.id,
                stock: variant_stock.get(&v.id).copied().unwrap_or(0),
                name: v.name,
            })
            .collect(),
    }))
}

pub async fn list_products(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let products = Products::find()
        .order_by_asc(crate::entity::products::Column::Name)
        .all(&state.orm)
        .await?;

    let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

    let variants = Variants::find()
        .filter(VariantCol::ProductId.is_in(product_ids.clone()))
        .order_by_asc(VariantCol::Name)
        .all(&state.orm)
        .await?;

    let stock_rows = Stock::find()
        .filter(StockCol::ProductId.is_in(product_ids))
        .all(&state.orm)
        .await?;

    let mut variant_stock: HashMap<Uuid, i32> = HashMap::new();
    let mut base_stock: HashMap<Uuid, i32> = HashMap::new();
    for row in stock_rows {
        match row.variant_id {
            Some(variant_id) => {
                variant_stock.insert(variant_id, row.quantity);
            }
            None => {
                base_stock.insert(row.product_id, row.quantity);
            }
        }
    }

    let mut variants_by_product: HashMap<Uuid, Vec<VariantWithStock>> = HashMap::new();
    for variant in variants {
        variants_by_product
            .entry(variant.product_id)
            .or_default()
            .push(VariantWithStock {
                id: variant.id,
                stock: variant_stock.get(&variant.id).copied().unwrap_or(0),
                name: variant.name,
            });
    }

    let items = products
        .into_iter()
        .map(|product| ProductWithVariants {
            stock: base_stock.get(&product.id).copied().unwrap_or(0),
            variants: variants_by_product.remove(&product.id).unwrap_or_default(),
            id: product.id,
            name: product.name,
            price: product.price,
        })
        .collect();

    Ok(ApiResponse::success("OK", ProductList { items }))
}
