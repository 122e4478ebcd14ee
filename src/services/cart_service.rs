use crate::{
    entities::{cart, cart_item, saved_item, Cart, CartItem, Product, SavedItem},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Shopping cart service for managing per-user carts and saved-for-later
/// items.
///
/// Every mutation runs inside a single transaction and enforces the stock
/// ceiling: no operation ever leaves a cart line whose quantity exceeds the
/// product's stock. Direct additions fail loudly when they would breach the
/// ceiling; the guest-cart merge clamps silently instead.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// One line of an anonymous (pre-login) cart submitted for merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuestCartItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A cart line joined with its product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// A saved-for-later line joined with its product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Full cart state returned by every cart endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItemView>,
    pub saved_items: Vec<SavedItemView>,
    pub subtotal: Decimal,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Retrieves the user's cart, creating an empty one on first access.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;
        let view = load_cart_view(&txn, &cart).await?;
        txn.commit().await?;
        Ok(view)
    }

    /// Adds a product to the cart, accumulating quantity onto an existing
    /// line for the same product.
    ///
    /// Fails with `OutOfStock` when the resulting line quantity would exceed
    /// the product's stock; the cart is left unchanged in that case.
    ///
    /// # Returns
    ///
    /// * `Ok(CartView)` - Cart state after the addition
    /// * `Err(ServiceError::ProductNotFound)` - Unknown product
    /// * `Err(ServiceError::OutOfStock)` - Requested quantity exceeds stock
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;

        let product = Product::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ProductNotFound(format!("Product {} not found", product_id))
            })?;

        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        if let Some(item) = existing {
            let combined = item.quantity.saturating_add(quantity);
            if combined > product.stock {
                return Err(ServiceError::OutOfStock(format!(
                    "Only {} units available. You already have {} in your cart.",
                    product.stock, item.quantity
                )));
            }
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(combined);
            item.updated_at = Set(Utc::now());
            item.update(&txn).await?;
        } else {
            if quantity > product.stock {
                return Err(ServiceError::OutOfStock(format!(
                    "Only {} units available",
                    product.stock
                )));
            }
            cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            }
            .insert(&txn)
            .await?;
        }

        let cart = touch_cart(&txn, &cart).await?;
        let view = load_cart_view(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                product_id,
            })
            .await;

        info!("Added item to cart {}: product {} x{}", cart.id, product_id, quantity);
        Ok(view)
    }

    /// Sets a cart line to an absolute quantity.
    ///
    /// Unlike `add_item` this replaces the quantity rather than accumulating.
    /// Removal is a separate, explicit operation; the handler rejects
    /// non-positive quantities before this is called.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;

        let item = CartItem::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|item| item.cart_id == cart.id)
            .ok_or_else(|| {
                ServiceError::CartItemNotFound(format!("Cart item {} not found", item_id))
            })?;

        let product = Product::find_by_id(item.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ProductNotFound(format!("Product {} not found", item.product_id))
            })?;

        if quantity > product.stock {
            return Err(ServiceError::OutOfStock(format!(
                "Only {} units available",
                product.stock
            )));
        }

        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(quantity);
        item.updated_at = Set(Utc::now());
        item.update(&txn).await?;

        let cart = touch_cart(&txn, &cart).await?;
        let view = load_cart_view(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                cart_id: cart.id,
                item_id,
            })
            .await;

        Ok(view)
    }

    /// Removes a line from the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;

        let item = CartItem::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|item| item.cart_id == cart.id)
            .ok_or_else(|| {
                ServiceError::CartItemNotFound(format!("Cart item {} not found", item_id))
            })?;

        item.delete(&txn).await?;

        let cart = touch_cart(&txn, &cart).await?;
        let view = load_cart_view(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id: cart.id,
                item_id,
            })
            .await;

        Ok(view)
    }

    /// Merges an anonymous cart into the user's cart after login.
    ///
    /// Merge semantics differ from `add_item` on purpose: nothing here fails
    /// the whole request. Lines referencing unknown products (or with
    /// non-positive quantities) are skipped, and combined quantities are
    /// silently clamped to the product's stock. Re-submitting the same guest
    /// cart is therefore idempotent once every line sits at its cap.
    ///
    /// Returns the same fully populated view as every other mutation; the
    /// merged/skipped counters surface through `Event::GuestCartMerged`.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn merge_guest_cart(
        &self,
        user_id: Uuid,
        items: Vec<GuestCartItem>,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;

        let mut merged = 0usize;
        let mut skipped = 0usize;

        for line in items {
            if line.quantity <= 0 {
                skipped += 1;
                continue;
            }

            let product = match Product::find_by_id(line.product_id).one(&txn).await? {
                Some(product) => product,
                None => {
                    skipped += 1;
                    continue;
                }
            };

            let existing = CartItem::find()
                .filter(cart_item::Column::CartId.eq(cart.id))
                .filter(cart_item::Column::ProductId.eq(line.product_id))
                .one(&txn)
                .await?;

            match existing {
                Some(item) => {
                    let clamped = item.quantity.saturating_add(line.quantity).min(product.stock);
                    if clamped != item.quantity {
                        let mut item: cart_item::ActiveModel = item.into();
                        item.quantity = Set(clamped);
                        item.updated_at = Set(Utc::now());
                        item.update(&txn).await?;
                    }
                    merged += 1;
                }
                None => {
                    let clamped = line.quantity.min(product.stock);
                    if clamped > 0 {
                        cart_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            cart_id: Set(cart.id),
                            product_id: Set(line.product_id),
                            quantity: Set(clamped),
                            created_at: Set(Utc::now()),
                            updated_at: Set(Utc::now()),
                        }
                        .insert(&txn)
                        .await?;
                        merged += 1;
                    } else {
                        // stock is zero, nothing to carry over
                        skipped += 1;
                    }
                }
            }
        }

        let cart = touch_cart(&txn, &cart).await?;
        let view = load_cart_view(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::GuestCartMerged {
                cart_id: cart.id,
                merged,
                skipped,
            })
            .await;

        info!("Merged guest cart into {}: {} merged, {} skipped", cart.id, merged, skipped);
        Ok(view)
    }

    /// Moves a cart line to the saved-for-later list.
    ///
    /// If the product is already saved, the saved quantity is overwritten by
    /// the cart line's quantity rather than summed. The cart line is removed
    /// in the same transaction.
    #[instrument(skip(self))]
    pub async fn save_for_later(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;

        let item = CartItem::find_by_id(item_id)
            .one(&txn)
            .await?
            .filter(|item| item.cart_id == cart.id)
            .ok_or_else(|| {
                ServiceError::CartItemNotFound(format!("Cart item {} not found", item_id))
            })?;

        let existing_saved = SavedItem::find()
            .filter(saved_item::Column::CartId.eq(cart.id))
            .filter(saved_item::Column::ProductId.eq(item.product_id))
            .one(&txn)
            .await?;

        let product_id = item.product_id;
        match existing_saved {
            Some(saved) => {
                let mut saved: saved_item::ActiveModel = saved.into();
                saved.quantity = Set(item.quantity);
                saved.update(&txn).await?;
            }
            None => {
                saved_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    product_id: Set(product_id),
                    quantity: Set(item.quantity),
                    created_at: Set(Utc::now()),
                }
                .insert(&txn)
                .await?;
            }
        }

        item.delete(&txn).await?;

        let cart = touch_cart(&txn, &cart).await?;
        let view = load_cart_view(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemSaved {
                cart_id: cart.id,
                product_id,
            })
            .await;

        Ok(view)
    }

    /// Moves a saved item back into the active cart.
    ///
    /// The saved quantity is added to any existing cart line for the same
    /// product. If the combined quantity would exceed stock, the restore
    /// fails with `OutOfStock` and the saved item stays untouched so the
    /// user can retry later.
    #[instrument(skip(self))]
    pub async fn restore_saved_item(
        &self,
        user_id: Uuid,
        saved_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;

        let saved = SavedItem::find_by_id(saved_id)
            .one(&txn)
            .await?
            .filter(|saved| saved.cart_id == cart.id)
            .ok_or_else(|| {
                ServiceError::CartItemNotFound(format!("Saved item {} not found", saved_id))
            })?;

        let product = Product::find_by_id(saved.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::ProductNotFound(format!("Product {} not found", saved.product_id))
            })?;

        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::ProductId.eq(saved.product_id))
            .one(&txn)
            .await?;

        let in_cart = existing.as_ref().map(|item| item.quantity).unwrap_or(0);
        let combined = in_cart.saturating_add(saved.quantity);
        if combined > product.stock {
            return Err(ServiceError::OutOfStock(format!(
                "Only {} units available",
                product.stock
            )));
        }

        match existing {
            Some(item) => {
                let mut item: cart_item::ActiveModel = item.into();
                item.quantity = Set(combined);
                item.updated_at = Set(Utc::now());
                item.update(&txn).await?;
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    cart_id: Set(cart.id),
                    product_id: Set(saved.product_id),
                    quantity: Set(combined),
                    created_at: Set(Utc::now()),
                    updated_at: Set(Utc::now()),
                }
                .insert(&txn)
                .await?;
            }
        }

        let product_id = saved.product_id;
        saved.delete(&txn).await?;

        let cart = touch_cart(&txn, &cart).await?;
        let view = load_cart_view(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::SavedItemRestored {
                cart_id: cart.id,
                product_id,
            })
            .await;

        Ok(view)
    }

    /// Removes a saved-for-later item entirely.
    #[instrument(skip(self))]
    pub async fn remove_saved_item(
        &self,
        user_id: Uuid,
        saved_id: Uuid,
    ) -> Result<CartView, ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;

        let saved = SavedItem::find_by_id(saved_id)
            .one(&txn)
            .await?
            .filter(|saved| saved.cart_id == cart.id)
            .ok_or_else(|| {
                ServiceError::CartItemNotFound(format!("Saved item {} not found", saved_id))
            })?;

        saved.delete(&txn).await?;
        let view = load_cart_view(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::SavedItemRemoved {
                cart_id: cart.id,
                saved_id,
            })
            .await;

        Ok(view)
    }

    /// Empties the active cart. Saved-for-later items are kept.
    ///
    /// Clearing an already-empty cart succeeds and is a no-op.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let cart = find_or_create_cart(&txn, user_id, &self.event_sender).await?;

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;

        touch_cart(&txn, &cart).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart.id))
            .await;

        info!("Cleared cart {}", cart.id);
        Ok(())
    }
}

/// Finds the user's cart, creating it on first access.
async fn find_or_create_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    event_sender: &EventSender,
) -> Result<cart::Model, ServiceError> {
    if let Some(cart) = Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(cart);
    }

    let cart = cart::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;

    event_sender.send_or_log(Event::CartCreated(cart.id)).await;
    Ok(cart)
}

async fn touch_cart<C: ConnectionTrait>(
    conn: &C,
    cart: &cart::Model,
) -> Result<cart::Model, ServiceError> {
    let mut active: cart::ActiveModel = cart.clone().into();
    active.updated_at = Set(Utc::now());
    Ok(active.update(conn).await?)
}

/// Loads the full cart view: lines and saved items with their products,
/// oldest first, plus the running subtotal.
async fn load_cart_view<C: ConnectionTrait>(
    conn: &C,
    cart: &cart::Model,
) -> Result<CartView, ServiceError> {
    let items = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .find_also_related(Product)
        .order_by_asc(cart_item::Column::CreatedAt)
        .all(conn)
        .await?;

    let saved = SavedItem::find()
        .filter(saved_item::Column::CartId.eq(cart.id))
        .find_also_related(Product)
        .order_by_asc(saved_item::Column::CreatedAt)
        .all(conn)
        .await?;

    let mut views = Vec::with_capacity(items.len());
    let mut subtotal = Decimal::ZERO;
    for (item, product) in items {
        let product = product.ok_or_else(|| {
            ServiceError::ProductNotFound(format!("Product {} not found", item.product_id))
        })?;
        let line_total = product.price * Decimal::from(item.quantity);
        subtotal += line_total;
        views.push(CartItemView {
            id: item.id,
            product_id: item.product_id,
            product_name: product.name,
            unit_price: product.price,
            quantity: item.quantity,
            line_total,
        });
    }

    let mut saved_views = Vec::with_capacity(saved.len());
    for (item, product) in saved {
        let product = product.ok_or_else(|| {
            ServiceError::ProductNotFound(format!("Product {} not found", item.product_id))
        })?;
        saved_views.push(SavedItemView {
            id: item.id,
            product_id: item.product_id,
            product_name: product.name,
            unit_price: product.price,
            quantity: item.quantity,
        });
    }

    Ok(CartView {
        id: cart.id,
        user_id: cart.user_id,
        items: views,
        saved_items: saved_views,
        subtotal,
        created_at: cart.created_at,
        updated_at: cart.updated_at,
    })
}
