//! The persistence collaborator the checkout core depends on.
//!
//! Services only see [`CheckoutStore`] and [`CheckoutTransaction`], so any
//! backing store can be injected. Writes that must land together go through
//! one transaction: dropping a transaction without committing it discards
//! everything written through it.

pub mod memory;
pub mod sea_orm_store;

pub use memory::{FailPoint, MemoryCheckoutStore};
pub use sea_orm_store::SeaOrmCheckoutStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    Coupon, HydratedOrder, NewOrder, NewOrderItem, NewPayment, Order, OrderStatus, Payment,
    PaymentMethod, PaymentStatus, ShippingMethod,
};

#[async_trait]
pub trait CheckoutStore: Send + Sync {
    /// Looks a coupon up by its exact, case-significant code.
    async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, ServiceError>;

    async fn get_shipping_method(&self, id: Uuid) -> Result<Option<ShippingMethod>, ServiceError>;

    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, ServiceError>;

    /// Header, items, shipping method and payment in one read.
    async fn get_order(&self, id: Uuid) -> Result<Option<HydratedOrder>, ServiceError>;

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, ServiceError>;

    async fn begin(&self) -> Result<Box<dyn CheckoutTransaction>, ServiceError>;
}

#[async_trait]
pub trait CheckoutTransaction: Send {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Uuid, ServiceError>;

    async fn insert_order_items(&mut self, items: Vec<NewOrderItem>) -> Result<(), ServiceError>;

    /// Atomically bumps `usage_count` while the coupon still has uses left.
    ///
    /// Returns `false` when the guard rejected the increment because the
    /// usage limit was already reached.
    async fn increment_coupon_usage(&mut self, coupon_id: Uuid) -> Result<bool, ServiceError>;

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<Uuid, ServiceError>;

    async fn get_order(&mut self, id: Uuid) -> Result<Option<Order>, ServiceError>;

    async fn update_order_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), ServiceError>;

    async fn get_payment(&mut self, id: Uuid) -> Result<Option<Payment>, ServiceError>;

    async fn update_payment_status(
        &mut self,
        id: Uuid,
        status: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<(), ServiceError>;

    async fn commit(self: Box<Self>) -> Result<(), ServiceError>;

    async fn rollback(self: Box<Self>) -> Result<(), ServiceError>;
}
