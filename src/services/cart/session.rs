use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{
    storage::{CartStorage, FileCartStorage},
    Cart,
};
use crate::{
    config::AppConfig,
    errors::ServiceError,
    models::{AppliedCoupon, HydratedOrder, OrderDraft},
    services::{coupons::CouponService, orders::OrderService},
};

/// Opens [`CartSession`]s on one storage backend with a shared debounce window.
#[derive(Clone)]
pub struct CartSessions {
    storage: Arc<dyn CartStorage>,
    debounce: Duration,
}

impl CartSessions {
    pub fn new(storage: Arc<dyn CartStorage>, debounce: Duration) -> Self {
        Self { storage, debounce }
    }

    /// File-backed carts under `cart_storage_dir`, saved after `cart_autosave_debounce_ms`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(FileCartStorage::new(&config.cart_storage_dir)),
            config.cart_autosave_debounce(),
        )
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub async fn open(&self, key: &str) -> Result<CartSession, ServiceError> {
        CartSession::load(self.storage.clone(), key, self.debounce).await
    }
}

/// A cart bound to its storage key.
///
/// Changes are kept in memory and marked dirty; they reach storage only at
/// [`CartSession::flush`] or, once the debounce window has passed since the
/// last change, at [`CartSession::flush_if_idle`].
pub struct CartSession {
    key: String,
    cart: Cart,
    storage: Arc<dyn CartStorage>,
    debounce: Duration,
    last_change: Option<Instant>,
}

impl CartSession {
    /// Restores the cart stored under `key`, or starts an empty one.
    #[instrument(skip(storage, debounce))]
    pub async fn load(
        storage: Arc<dyn CartStorage>,
        key: &str,
        debounce: Duration,
    ) -> Result<Self, ServiceError> {
        let mut last_change = None;
        let cart = match storage.get(key).await? {
            Some(payload) => match serde_json::from_str::<Cart>(&payload) {
                Ok(cart) => cart,
                Err(e) => {
                    warn!("Discarding unreadable cart stored under {}: {}", key, e);
                    last_change = Some(Instant::now());
                    Cart::new()
                }
            },
            None => Cart::new(),
        };

        Ok(Self {
            key: key.to_string(),
            cart,
            storage,
            debounce,
            last_change,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn is_dirty(&self) -> bool {
        self.last_change.is_some()
    }

    /// Applies `change` to the cart, marking the session dirty if anything changed.
    pub fn update<F, R>(&mut self, change: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let before = self.cart.clone();
        let result = change(&mut self.cart);
        if self.cart != before {
            self.last_change = Some(Instant::now());
        }
        result
    }

    /// Writes pending changes. Returns whether storage was touched.
    pub async fn flush(&mut self) -> Result<bool, ServiceError> {
        if !self.is_dirty() {
            return Ok(false);
        }

        if self.cart.is_empty() {
            self.storage.remove(&self.key).await?;
        } else {
            let payload = serde_json::to_string(&self.cart)
                .with_context(|| format!("serialising cart {}", self.key))?;
            self.storage.set(&self.key, payload).await?;
        }

        debug!("Persisted cart {}", self.key);
        self.last_change = None;
        Ok(true)
    }

    /// Flushes only when the last change is at least one debounce window old.
    pub async fn flush_if_idle(&mut self) -> Result<bool, ServiceError> {
        match self.last_change {
            Some(changed_at) if changed_at.elapsed() >= self.debounce => self.flush().await,
            _ => Ok(false),
        }
    }

    /// Quotes `code` against the current subtotal and keeps the coupon on
    /// the cart. Usage is not consumed.
    pub async fn apply_coupon(
        &mut self,
        coupons: &CouponService,
        code: &str,
    ) -> Result<AppliedCoupon, ServiceError> {
        if self.cart.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Add items before applying a coupon".to_string(),
            ));
        }

        let applied = coupons.apply(code, self.cart.subtotal()).await?;
        self.update(|cart| cart.apply_coupon(applied.clone()));
        Ok(applied)
    }

    /// Places an order for the cart's contents, then empties and persists it.
    ///
    /// The cart's coupon and quoted discount fill in the draft when it has
    /// none of its own. On failure the cart is left untouched.
    #[instrument(skip(self, orders, draft), fields(cart = %self.key))]
    pub async fn checkout(
        &mut self,
        orders: &OrderService,
        mut draft: OrderDraft,
    ) -> Result<HydratedOrder, ServiceError> {
        if draft.coupon_code.is_none() {
            draft.coupon_code = self.cart.coupon().map(|coupon| coupon.code.clone());
        }
        if draft.discount_amount.is_none() && draft.coupon_code.is_some() {
            draft.discount_amount = Some(self.cart.totals().discount_amount);
        }

        let order = orders.create_order(draft, self.cart.items()).await?;
        info!("Cart {} checked out as order {}", self.key, order.order.id);

        self.update(Cart::clear);
        if let Err(e) = self.flush().await {
            warn!("Order {} placed but cart {} was not cleared in storage: {}", order.order.id, self.key, e);
        }

        Ok(order)
    }
}
