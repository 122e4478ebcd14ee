pub mod cart_service;
pub mod promo_service;
pub mod shipping_service;

pub use cart_service::CartService;
pub use promo_service::PromoCodeService;
pub use shipping_service::ShippingTaxService;
