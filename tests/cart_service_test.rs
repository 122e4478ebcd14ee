mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::errors::ServiceError;
use storefront_api::services::cart_service::GuestCartItem;
use uuid::Uuid;

#[tokio::test]
async fn get_cart_creates_empty_cart_on_first_access() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();

    let cart = app.cart.get_cart(user_id).await.unwrap();
    assert_eq!(cart.user_id, user_id);
    assert!(cart.items.is_empty());
    assert!(cart.saved_items.is_empty());
    assert_eq!(cart.subtotal, dec!(0));

    // Second access returns the same cart
    let again = app.cart.get_cart(user_id).await.unwrap();
    assert_eq!(again.id, cart.id);
}

#[tokio::test]
async fn add_item_accumulates_onto_one_line() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(9.99), 10).await;

    app.cart.add_item(user_id, product_id, 1).await.unwrap();
    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.items[0].line_total, dec!(29.97));
    assert_eq!(cart.subtotal, dec!(29.97));
}

#[tokio::test]
async fn add_item_rejects_quantity_over_stock() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(9.99), 3).await;

    let err = app.cart.add_item(user_id, product_id, 5).await.unwrap_err();
    assert!(matches!(err, ServiceError::OutOfStock(_)));
    assert!(err.to_string().contains("Only 3 units available"));

    let cart = app.cart.get_cart(user_id).await.unwrap();
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn add_item_rejects_combined_quantity_over_stock() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(9.99), 3).await;

    app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let err = app.cart.add_item(user_id, product_id, 2).await.unwrap_err();

    assert!(matches!(err, ServiceError::OutOfStock(_)));
    assert!(err.to_string().contains("You already have 2 in your cart."));

    // The first addition survives untouched
    let cart = app.cart.get_cart(user_id).await.unwrap();
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn add_item_unknown_product_is_not_found() {
    let app = TestApp::spawn().await;
    let err = app
        .cart
        .add_item(Uuid::new_v4(), Uuid::new_v4(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProductNotFound(_)));
}

#[tokio::test]
async fn update_item_sets_absolute_quantity() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let item_id = cart.items[0].id;

    let cart = app.cart.update_item(user_id, item_id, 7).await.unwrap();
    assert_eq!(cart.items[0].quantity, 7);
    assert_eq!(cart.subtotal, dec!(35.00));
}

#[tokio::test]
async fn update_item_rejects_quantity_over_stock() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 4).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let item_id = cart.items[0].id;

    let err = app.cart.update_item(user_id, item_id, 5).await.unwrap_err();
    assert!(matches!(err, ServiceError::OutOfStock(_)));

    let cart = app.cart.get_cart(user_id).await.unwrap();
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn update_item_belonging_to_another_user_is_not_found() {
    let app = TestApp::spawn().await;
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    let cart = app.cart.add_item(owner, product_id, 2).await.unwrap();
    let item_id = cart.items[0].id;

    let err = app.cart.update_item(intruder, item_id, 1).await.unwrap_err();
    assert!(matches!(err, ServiceError::CartItemNotFound(_)));
}

#[tokio::test]
async fn remove_item_deletes_the_line() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let cart = app.cart.remove_item(user_id, cart.items[0].id).await.unwrap();
    assert!(cart.items.is_empty());

    let err = app
        .cart
        .remove_item(user_id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::CartItemNotFound(_)));
}

#[tokio::test]
async fn merge_clamps_to_stock_instead_of_failing() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 3).await;

    app.cart.add_item(user_id, product_id, 2).await.unwrap();

    let cart = app
        .cart
        .merge_guest_cart(
            user_id,
            vec![GuestCartItem {
                product_id,
                quantity: 5,
            }],
        )
        .await
        .unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
}

#[tokio::test]
async fn merge_skips_unknown_products() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    // The unknown product is skipped without failing the merge
    let cart = app
        .cart
        .merge_guest_cart(
            user_id,
            vec![
                GuestCartItem {
                    product_id,
                    quantity: 2,
                },
                GuestCartItem {
                    product_id: Uuid::new_v4(),
                    quantity: 4,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn merge_is_idempotent_once_lines_sit_at_the_cap() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 3).await;

    let guest = vec![GuestCartItem {
        product_id,
        quantity: 5,
    }];

    let first = app
        .cart
        .merge_guest_cart(user_id, guest.clone())
        .await
        .unwrap();
    assert_eq!(first.items[0].quantity, 3);

    let second = app.cart.merge_guest_cart(user_id, guest).await.unwrap();
    assert_eq!(second.items[0].quantity, 3);
    assert_eq!(second.items.len(), 1);
}

#[tokio::test]
async fn save_for_later_moves_line_out_of_cart() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let cart = app
        .cart
        .save_for_later(user_id, cart.items[0].id)
        .await
        .unwrap();

    assert!(cart.items.is_empty());
    assert_eq!(cart.saved_items.len(), 1);
    assert_eq!(cart.saved_items[0].quantity, 2);
    assert_eq!(cart.subtotal, dec!(0));
}

#[tokio::test]
async fn saving_same_product_again_overwrites_saved_quantity() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    app.cart
        .save_for_later(user_id, cart.items[0].id)
        .await
        .unwrap();

    let cart = app.cart.add_item(user_id, product_id, 5).await.unwrap();
    let cart = app
        .cart
        .save_for_later(user_id, cart.items[0].id)
        .await
        .unwrap();

    // Overwritten, not summed
    assert_eq!(cart.saved_items.len(), 1);
    assert_eq!(cart.saved_items[0].quantity, 5);
}

#[tokio::test]
async fn restore_returns_saved_item_to_cart() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let cart = app
        .cart
        .save_for_later(user_id, cart.items[0].id)
        .await
        .unwrap();

    let cart = app
        .cart
        .restore_saved_item(user_id, cart.saved_items[0].id)
        .await
        .unwrap();

    assert!(cart.saved_items.is_empty());
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn restore_adds_onto_existing_cart_line() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let cart = app
        .cart
        .save_for_later(user_id, cart.items[0].id)
        .await
        .unwrap();
    let saved_id = cart.saved_items[0].id;

    app.cart.add_item(user_id, product_id, 3).await.unwrap();
    let cart = app.cart.restore_saved_item(user_id, saved_id).await.unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert!(cart.saved_items.is_empty());
}

#[tokio::test]
async fn restore_blocked_by_stock_leaves_saved_item_untouched() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 3).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let cart = app
        .cart
        .save_for_later(user_id, cart.items[0].id)
        .await
        .unwrap();
    let saved_id = cart.saved_items[0].id;

    // Refill the cart so restoring 2 more would exceed stock 3
    app.cart.add_item(user_id, product_id, 2).await.unwrap();

    let err = app
        .cart
        .restore_saved_item(user_id, saved_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::OutOfStock(_)));

    let cart = app.cart.get_cart(user_id).await.unwrap();
    assert_eq!(cart.saved_items.len(), 1);
    assert_eq!(cart.saved_items[0].quantity, 2);
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn remove_saved_item_deletes_it() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let product_id = app.seed_product("Widget", dec!(5.00), 10).await;

    let cart = app.cart.add_item(user_id, product_id, 2).await.unwrap();
    let cart = app
        .cart
        .save_for_later(user_id, cart.items[0].id)
        .await
        .unwrap();

    let cart = app
        .cart
        .remove_saved_item(user_id, cart.saved_items[0].id)
        .await
        .unwrap();
    assert!(cart.saved_items.is_empty());
}

#[tokio::test]
async fn clear_cart_keeps_saved_items() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let widget = app.seed_product("Widget", dec!(5.00), 10).await;
    let gadget = app.seed_product("Gadget", dec!(7.00), 10).await;

    let cart = app.cart.add_item(user_id, widget, 2).await.unwrap();
    app.cart
        .save_for_later(user_id, cart.items[0].id)
        .await
        .unwrap();
    app.cart.add_item(user_id, gadget, 1).await.unwrap();

    app.cart.clear_cart(user_id).await.unwrap();

    let cart = app.cart.get_cart(user_id).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.saved_items.len(), 1);

    // Clearing an empty cart is a no-op
    app.cart.clear_cart(user_id).await.unwrap();
}

#[tokio::test]
async fn subtotal_sums_across_lines() {
    let app = TestApp::spawn().await;
    let user_id = Uuid::new_v4();
    let widget = app.seed_product("Widget", dec!(9.99), 10).await;
    let gadget = app.seed_product("Gadget", dec!(25.50), 10).await;

    app.cart.add_item(user_id, widget, 2).await.unwrap();
    let cart = app.cart.add_item(user_id, gadget, 1).await.unwrap();

    assert_eq!(cart.subtotal, dec!(45.48));
    assert_eq!(cart.items.len(), 2);
}
