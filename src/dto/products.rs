use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    pub name: String,
    pub stock: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Decimal,
    /// Initial stock for a product without variants.
    pub stock: Option<i32>,
    pub variants: Option<Vec<CreateVariantRequest>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVariantRequest {
    /// Present for an existing variant; absent to create a new one.
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub stock: Option<i32>,
}

/// Partial update: omitted fields are left untouched. `stock` applies to
/// the variant-less record and is ignored when `variants` is present.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub variants: Option<Vec<UpdateVariantRequest>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VariantWithStock {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductWithVariants {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    /// Base stock (the variant-less record); zero when stock lives on
    /// variants.
    pub stock: i32,
    pub variants: Vec<VariantWithStock>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    pub items: Vec<ProductWithVariants>,
}
