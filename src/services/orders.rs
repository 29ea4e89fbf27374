use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::{abandon, bounded, coupons::CouponService, pricing};
use crate::{
    clock::Clock,
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        AppliedCoupon, HydratedOrder, LineItem, Money, NewOrder, NewOrderItem, NewPayment,
        OrderDraft, OrderStatus, PaymentMethod, PaymentStatus,
    },
    repositories::{CheckoutStore, CheckoutTransaction},
};

/// A cart line whose inventory reference has been resolved.
#[derive(Debug)]
struct ResolvedLine {
    inventory_id: Uuid,
    quantity: u32,
    price_at_order: Money,
}

/// Everything order assembly needs to know before it starts writing.
struct PricedOrder {
    header: NewOrder,
    lines: Vec<ResolvedLine>,
    coupon: Option<AppliedCoupon>,
    payment_method: PaymentMethod,
}

/// Turns a cart and an [`OrderDraft`] into a persisted, priced order.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn CheckoutStore>,
    coupons: CouponService,
    clock: Arc<dyn Clock>,
    event_sender: Option<Arc<EventSender>>,
    store_timeout: Duration,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn CheckoutStore>,
        coupons: CouponService,
        clock: Arc<dyn Clock>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            coupons,
            clock,
            event_sender: None,
            store_timeout,
        }
    }

    pub fn with_event_sender(mut self, sender: Arc<EventSender>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Creates an order from `draft` and the cart's `items`.
    ///
    /// The order header, its items, the coupon redemption and the pending
    /// payment are written in one transaction. If any of them fails nothing
    /// is kept.
    #[instrument(skip(self, draft, items), fields(item_count = items.len()))]
    pub async fn create_order(
        &self,
        draft: OrderDraft,
        items: &[LineItem],
    ) -> Result<HydratedOrder, ServiceError> {
        draft.validate()?;
        let lines = resolve_lines(items)?;

        let subtotal = pricing::subtotal(items);
        let priced = self.price(draft, lines, subtotal).await?;
        let total_amount = priced.header.total_amount;
        let coupon_id = priced.coupon.as_ref().map(AppliedCoupon::coupon_id);

        let mut txn = bounded(self.store_timeout, "transaction begin", self.store.begin()).await?;
        let order_id = match self.write_order(txn.as_mut(), priced).await {
            Ok(order_id) => order_id,
            Err(e) => {
                error!("Order assembly failed, rolling back: {}", e);
                abandon(txn, self.store_timeout).await;
                return Err(e);
            }
        };
        bounded(self.store_timeout, "transaction commit", txn.commit())
            .await
            .map_err(|e| {
                error!("Failed to commit order {}: {}", order_id, e);
                e
            })?;

        info!(order_id = %order_id, total_amount = %total_amount, "Order created");

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::OrderCreated {
                    order_id,
                    total_amount,
                })
                .await;
            if let Some(coupon_id) = coupon_id {
                sender
                    .send_or_log(Event::CouponRedeemed {
                        coupon_id,
                        order_id,
                    })
                    .await;
            }
        }

        self.get_order(order_id).await.map_err(|e| {
            error!("Order {} committed but could not be read back: {}", order_id, e);
            ServiceError::OrderCreationFailed(format!("order {} could not be read back", order_id))
        })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<HydratedOrder, ServiceError> {
        bounded(self.store_timeout, "order lookup", self.store.get_order(order_id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))
    }

    /// Gathers the shipping fee, payment method and coupon, then prices the order.
    async fn price(
        &self,
        draft: OrderDraft,
        lines: Vec<ResolvedLine>,
        subtotal: Money,
    ) -> Result<PricedOrder, ServiceError> {
        let now = self.clock.now();
        let coupon_code = draft
            .coupon_code
            .as_deref()
            .filter(|code| !code.trim().is_empty());

        let shipping_lookup = bounded(
            self.store_timeout,
            "shipping method lookup",
            self.store.get_shipping_method(draft.shipping_method_id),
        );
        let payment_lookup = bounded(
            self.store_timeout,
            "payment method lookup",
            self.store.get_payment_method(draft.payment_method_id),
        );
        let coupon_lookup = async {
            match coupon_code {
                Some(code) => self.coupons.apply_at(code, subtotal, now).await.map(Some),
                None => Ok(None),
            }
        };

        let (shipping, payment_method, coupon) =
            tokio::join!(shipping_lookup, payment_lookup, coupon_lookup);

        let shipping_fee = match shipping {
            Ok(Some(method)) if method.is_active => method.base_fee,
            Ok(Some(_)) => {
                warn!("Shipping method {} is inactive; charging no shipping", draft.shipping_method_id);
                Money::ZERO
            }
            Ok(None) => {
                warn!("Shipping method {} not found; charging no shipping", draft.shipping_method_id);
                Money::ZERO
            }
            Err(e) => {
                warn!(
                    "Could not resolve shipping method {}: {}; charging no shipping",
                    draft.shipping_method_id, e
                );
                Money::ZERO
            }
        };

        let payment_method = match payment_method? {
            Some(method) if method.is_active => method,
            _ => {
                return Err(ServiceError::NotFound(format!(
                    "Payment method {} not found",
                    draft.payment_method_id
                )))
            }
        };

        let coupon = coupon?;
        let discount_amount = coupon
            .as_ref()
            .map(|applied| applied.discount_amount)
            .unwrap_or(Money::ZERO);

        match draft.discount_amount {
            Some(quoted) if quoted != discount_amount => warn!(
                "Quoted discount {} differs from recomputed discount {}; using {}",
                quoted, discount_amount, discount_amount
            ),
            _ => {}
        }

        let total_amount = pricing::grand_total(subtotal, discount_amount, shipping_fee);
        debug!(
            subtotal = %subtotal,
            discount = %discount_amount,
            shipping_fee = %shipping_fee,
            total = %total_amount,
            "Priced order"
        );

        let header = NewOrder {
            user_id: draft.user_id,
            recipient: draft.recipient,
            shipping_address: draft.shipping_address,
            notes: draft.notes,
            shipping_method_id: draft.shipping_method_id,
            coupon_id: coupon.as_ref().map(AppliedCoupon::coupon_id),
            discount_amount,
            total_amount,
            status: OrderStatus::Pending,
            order_date: now,
        };

        Ok(PricedOrder {
            header,
            lines,
            coupon,
            payment_method,
        })
    }

    async fn write_order(
        &self,
        txn: &mut dyn CheckoutTransaction,
        priced: PricedOrder,
    ) -> Result<Uuid, ServiceError> {
        let limit = self.store_timeout;
        let PricedOrder {
            header,
            lines,
            coupon,
            payment_method,
        } = priced;
        let total_amount = header.total_amount;
        let order_date = header.order_date;

        let order_id = bounded(limit, "order insert", txn.insert_order(header))
            .await
            .map_err(|e| match e {
                ServiceError::DatabaseError(db) => ServiceError::OrderCreationFailed(db.to_string()),
                other => other,
            })?;

        let items = lines
            .into_iter()
            .map(|line| NewOrderItem {
                order_id,
                inventory_id: line.inventory_id,
                quantity: line.quantity,
                price_at_order: line.price_at_order,
            })
            .collect();
        bounded(limit, "order items insert", txn.insert_order_items(items)).await?;

        if let Some(applied) = &coupon {
            let redeemed = bounded(
                limit,
                "coupon redemption",
                txn.increment_coupon_usage(applied.coupon_id()),
            )
            .await?;
            if !redeemed {
                return Err(ServiceError::CouponExpired(format!(
                    "Coupon {} has reached its usage limit",
                    applied.coupon.code
                )));
            }
        }

        bounded(
            limit,
            "payment insert",
            txn.insert_payment(NewPayment {
                order_id,
                payment_method_id: payment_method.id,
                amount: total_amount,
                status: PaymentStatus::Pending,
                payment_date: order_date,
                notes: None,
            }),
        )
        .await?;

        Ok(order_id)
    }
}

/// Checks the cart before anything is looked up or written.
fn resolve_lines(items: &[LineItem]) -> Result<Vec<ResolvedLine>, ServiceError> {
    if items.is_empty() {
        return Err(ServiceError::InvalidInput("Cart is empty".to_string()));
    }

    items
        .iter()
        .map(|item| {
            if item.quantity == 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "Cart line {} has a quantity of zero",
                    item.id
                )));
            }
            if item.unit_price.is_negative() {
                return Err(ServiceError::InvalidInput(format!(
                    "Cart line {} has a negative price",
                    item.id
                )));
            }
            let inventory_id = item.inventory_id.ok_or_else(|| {
                error!(
                    line_id = %item.id,
                    product_id = %item.product_id,
                    "Cart line has no inventory reference"
                );
                ServiceError::MissingInventoryReference(item.id)
            })?;

            Ok(ResolvedLine {
                inventory_id,
                quantity: item.quantity,
                price_at_order: item.line_total(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn line(inventory_id: Option<Uuid>, quantity: u32, unit_price: i64) -> LineItem {
        LineItem {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            color_id: Uuid::new_v4(),
            size_id: Uuid::new_v4(),
            inventory_id,
            quantity,
            unit_price: Money::new(unit_price),
        }
    }

    #[test]
    fn empty_cart_is_invalid_input() {
        assert_matches!(resolve_lines(&[]), Err(ServiceError::InvalidInput(_)));
    }

    #[test]
    fn unresolved_inventory_is_reported_by_line() {
        let bad = line(None, 1, 10_000);
        let bad_id = bad.id;
        let items = vec![line(Some(Uuid::new_v4()), 1, 5_000), bad];
        assert_matches!(
            resolve_lines(&items),
            Err(ServiceError::MissingInventoryReference(id)) if id == bad_id
        );
    }

    #[test]
    fn snapshots_line_totals() {
        let items = vec![line(Some(Uuid::new_v4()), 3, 12_500)];
        let resolved = resolve_lines(&items).unwrap();
        assert_eq!(resolved[0].price_at_order, Money::new(37_500));
        assert_eq!(resolved[0].quantity, 3);
    }
}
