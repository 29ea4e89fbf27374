use async_trait::async_trait;
use sea_orm::DbErr;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::{CheckoutStore, CheckoutTransaction};
use crate::errors::ServiceError;
use crate::models::{
    Coupon, HydratedOrder, NewOrder, NewOrderItem, NewPayment, Order, OrderItem, OrderStatus,
    Payment, PaymentMethod, PaymentStatus, ShippingMethod,
};

/// A write step at which [`MemoryCheckoutStore`] can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    InsertOrder,
    InsertOrderItems,
    IncrementCouponUsage,
    InsertPayment,
    UpdateOrderStatus,
    UpdatePaymentStatus,
    Commit,
}

#[derive(Clone, Debug, Default)]
struct MemoryState {
    coupons: HashMap<Uuid, Coupon>,
    shipping_methods: HashMap<Uuid, ShippingMethod>,
    payment_methods: HashMap<Uuid, PaymentMethod>,
    orders: HashMap<Uuid, Order>,
    order_items: HashMap<Uuid, Vec<OrderItem>>,
    payments: HashMap<Uuid, Payment>,
}

impl MemoryState {
    fn hydrate(&self, id: Uuid) -> Option<HydratedOrder> {
        let order = self.orders.get(&id)?.clone();
        let items = self.order_items.get(&id).cloned().unwrap_or_default();
        let shipping_method = self.shipping_methods.get(&order.shipping_method_id).cloned();
        let payment = self
            .payments
            .values()
            .filter(|p| p.order_id == id)
            .min_by_key(|p| p.payment_date)
            .cloned();

        Some(HydratedOrder {
            order,
            items,
            shipping_method,
            payment,
        })
    }
}

/// In-process [`CheckoutStore`].
///
/// Transactions are serialisable: a transaction holds the store lock and
/// works on a copy of the state that replaces the original on commit.
#[derive(Clone, Debug, Default)]
pub struct MemoryCheckoutStore {
    state: Arc<Mutex<MemoryState>>,
    fail_point: Arc<Mutex<Option<FailPoint>>>,
    calls: Arc<AtomicUsize>,
}

impl MemoryCheckoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later transaction fail when it reaches `point`.
    pub async fn fail_on(&self, point: FailPoint) {
        *self.fail_point.lock().await = Some(point);
    }

    pub async fn clear_failures(&self) {
        *self.fail_point.lock().await = None;
    }

    /// Number of collaborator calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn insert_coupon(&self, coupon: Coupon) {
        self.state.lock().await.coupons.insert(coupon.id, coupon);
    }

    pub async fn insert_shipping_method(&self, method: ShippingMethod) {
        self.state
            .lock()
            .await
            .shipping_methods
            .insert(method.id, method);
    }

    pub async fn insert_payment_method(&self, method: PaymentMethod) {
        self.state
            .lock()
            .await
            .payment_methods
            .insert(method.id, method);
    }

    pub async fn coupon(&self, id: Uuid) -> Option<Coupon> {
        self.state.lock().await.coupons.get(&id).cloned()
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    pub async fn order_item_count(&self) -> usize {
        self.state
            .lock()
            .await
            .order_items
            .values()
            .map(Vec::len)
            .sum()
    }

    pub async fn payment_count(&self) -> usize {
        self.state.lock().await.payments.len()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CheckoutStore for MemoryCheckoutStore {
    async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, ServiceError> {
        self.record_call();
        let state = self.state.lock().await;
        Ok(state.coupons.values().find(|c| c.code == code).cloned())
    }

    async fn get_shipping_method(&self, id: Uuid) -> Result<Option<ShippingMethod>, ServiceError> {
        self.record_call();
        Ok(self.state.lock().await.shipping_methods.get(&id).cloned())
    }

    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, ServiceError> {
        self.record_call();
        Ok(self.state.lock().await.payment_methods.get(&id).cloned())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<HydratedOrder>, ServiceError> {
        self.record_call();
        Ok(self.state.lock().await.hydrate(id))
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, ServiceError> {
        self.record_call();
        Ok(self.state.lock().await.payments.get(&id).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn CheckoutTransaction>, ServiceError> {
        self.record_call();
        let fail_point = *self.fail_point.lock().await;
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            fail_point,
            calls: self.calls.clone(),
        }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_point: Option<FailPoint>,
    calls: Arc<AtomicUsize>,
}

impl MemoryTransaction {
    fn step(&self, point: FailPoint) -> Result<(), ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_point == Some(point) {
            return Err(ServiceError::DatabaseError(DbErr::Custom(format!(
                "injected failure at {:?}",
                point
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckoutTransaction for MemoryTransaction {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Uuid, ServiceError> {
        self.step(FailPoint::InsertOrder)?;
        let id = Uuid::new_v4();
        self.working.orders.insert(id, order.into_order(id));
        Ok(id)
    }

    async fn insert_order_items(&mut self, items: Vec<NewOrderItem>) -> Result<(), ServiceError> {
        self.step(FailPoint::InsertOrderItems)?;
        for item in items {
            if !self.working.orders.contains_key(&item.order_id) {
                return Err(ServiceError::DatabaseError(DbErr::Custom(format!(
                    "order {} does not exist",
                    item.order_id
                ))));
            }
            self.working
                .order_items
                .entry(item.order_id)
                .or_default()
                .push(OrderItem {
                    id: Uuid::new_v4(),
                    order_id: item.order_id,
                    inventory_id: item.inventory_id,
                    quantity: item.quantity,
                    price_at_order: item.price_at_order,
                });
        }
        Ok(())
    }

    async fn increment_coupon_usage(&mut self, coupon_id: Uuid) -> Result<bool, ServiceError> {
        self.step(FailPoint::IncrementCouponUsage)?;
        match self.working.coupons.get_mut(&coupon_id) {
            Some(coupon) if coupon.has_remaining_uses() => {
                coupon.usage_count += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(ServiceError::NotFound(format!("Coupon {} not found", coupon_id))),
        }
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<Uuid, ServiceError> {
        self.step(FailPoint::InsertPayment)?;
        let id = Uuid::new_v4();
        self.working.payments.insert(id, payment.into_payment(id));
        Ok(id)
    }

    async fn get_order(&mut self, id: Uuid) -> Result<Option<Order>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.working.orders.get(&id).cloned())
    }

    async fn update_order_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), ServiceError> {
        self.step(FailPoint::UpdateOrderStatus)?;
        let order = self
            .working
            .orders
            .get_mut(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        order.status = status;
        Ok(())
    }

    async fn get_payment(&mut self, id: Uuid) -> Result<Option<Payment>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.working.payments.get(&id).cloned())
    }

    async fn update_payment_status(
        &mut self,
        id: Uuid,
        status: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<(), ServiceError> {
        self.step(FailPoint::UpdatePaymentStatus)?;
        let payment = self
            .working
            .payments
            .get_mut(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", id)))?;
        payment.status = status;
        if transaction_id.is_some() {
            payment.transaction_id = transaction_id;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), ServiceError> {
        self.step(FailPoint::Commit)?;
        let MemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), ServiceError> {
        debug!("Discarding in-memory checkout transaction");
        Ok(())
    }
}
