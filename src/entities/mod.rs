/// Storefront entities module
pub mod cart;
pub mod cart_item;
pub mod product;
pub mod promo_code;
pub mod saved_item;

// Re-export entities
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use promo_code::{Entity as PromoCode, Model as PromoCodeModel, PromoCodeStatus};
pub use saved_item::{Entity as SavedItem, Model as SavedItemModel};
