use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{AddItemRequest, ApplyCouponRequest, CartResponse, UpdateItemRequest},
        coupons::{CouponList, CreateCouponRequest},
        orders::{OrderLineView, OrderList, OrderWithItems, PlaceOrderRequest, PlaceOrderResponse},
        products::{
            CreateProductRequest, CreateVariantRequest, ProductList, ProductWithVariants,
            UpdateProductRequest, UpdateVariantRequest, VariantWithStock,
        },
        webhook::{StatusUpdateResponse, UpdateOrderStatusRequest},
    },
    models::{Cart, CartItem, Coupon, CouponRef, Order, OrderItem, OrderStatus, Product, Variant},
    response::ApiResponse,
    routes::{cart, coupons, health, orders, products, webhook},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        coupons::list_coupons,
        coupons::create_coupon,
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        cart::apply_coupon,
        cart::remove_coupon,
        orders::list_orders,
        orders::place_order,
        orders::get_order,
        webhook::update_order_status
    ),
    components(
        schemas(
            Product,
            Variant,
            Coupon,
            CouponRef,
            Cart,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            AddItemRequest,
            UpdateItemRequest,
            ApplyCouponRequest,
            CartResponse,
            CreateProductRequest,
            CreateVariantRequest,
            UpdateProductRequest,
            UpdateVariantRequest,
            ProductWithVariants,
            VariantWithStock,
            ProductList,
            CreateCouponRequest,
            CouponList,
            PlaceOrderRequest,
            PlaceOrderResponse,
            OrderLineView,
            OrderWithItems,
            OrderList,
            UpdateOrderStatusRequest,
            StatusUpdateResponse,
            ApiResponse<CartResponse>,
            ApiResponse<ProductList>,
            ApiResponse<ProductWithVariants>,
            ApiResponse<CouponList>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Coupons", description = "Coupon endpoints"),
        (name = "Cart", description = "Session cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Webhook", description = "Order status webhook"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
