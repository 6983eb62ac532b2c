pub mod carts;
pub mod coupons;
pub mod notifications;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod stock;
pub mod variants;

pub use carts::Entity as Carts;
pub use coupons::Entity as Coupons;
pub use notifications::Entity as Notifications;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use stock::Entity as Stock;
pub use variants::Entity as Variants;
