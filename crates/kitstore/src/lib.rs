//! Storefront model for Kitshop: customizable products, the designs applied to
//! them, and the persisted shopping cart.

mod cart;
mod currency;
pub mod design;
mod product;
mod rgb;
pub mod storage;

pub use cart::{CART_STORAGE_KEY, CartError, CartItem, CartStore};
pub use currency::{Currency, format_price};
pub use design::{CanvasPosition, Design, DesignElement, DesignError};
pub use product::{CanvasSize, PRODUCT_CATALOG, Product, ProductKind, product_by_id};
pub use rgb::Rgb;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
