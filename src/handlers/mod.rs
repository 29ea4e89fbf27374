pub mod coupons;
pub mod health;
pub mod orders;
pub mod payments;

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::AppConfig,
    events::EventSender,
    repositories::CheckoutStore,
    services::{
        cart::CartSessions,
        coupons::CouponService, order_status::OrderStatusService, orders::OrderService,
        payments::PaymentService,
    },
};

/// Services shared by the HTTP handlers, all wired to one store.
#[derive(Clone)]
pub struct AppServices {
    pub coupons: Arc<CouponService>,
    pub orders: Arc<OrderService>,
    pub order_status: Arc<OrderStatusService>,
    pub payments: Arc<PaymentService>,
    pub carts: Arc<CartSessions>,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn CheckoutStore>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        let timeout = config.store_timeout();
        let policy = config.transition_policy();

        let coupons = CouponService::new(store.clone(), clock.clone(), timeout);
        let mut orders = OrderService::new(store.clone(), coupons.clone(), clock, timeout);
        let mut order_status = OrderStatusService::new(store.clone(), policy, timeout);
        let mut payments = PaymentService::new(store, policy, timeout);

        if let Some(sender) = event_sender {
            orders = orders.with_event_sender(sender.clone());
            order_status = order_status.with_event_sender(sender.clone());
            payments = payments.with_event_sender(sender);
        }

        Self {
            coupons: Arc::new(coupons),
            orders: Arc::new(orders),
            order_status: Arc::new(order_status),
            payments: Arc::new(payments),
            carts: Arc::new(CartSessions::from_config(config)),
        }
    }
}
