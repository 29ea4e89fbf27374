#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use storefront_checkout::{
    clock::{Clock, FixedClock},
    config::AppConfig,
    events::{Event, EventSender},
    models::{
        Coupon, DiscountType, LineItem, Money, OrderDraft, PaymentMethod, Recipient,
        ShippingMethod,
    },
    repositories::{CheckoutStore, MemoryCheckoutStore},
    services::{
        coupons::CouponService,
        order_status::{OrderStatusService, TransitionPolicy},
        orders::OrderService,
        payments::PaymentService,
    },
};
use tokio::sync::mpsc;
use uuid::Uuid;

pub const STORE_TIMEOUT: Duration = Duration::from_secs(2);

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
    cfg.store_timeout_ms = STORE_TIMEOUT.as_millis() as u64;
    cfg
}

/// A memory store seeded with the catalog rows checkout tests rely on.
pub struct Fixture {
    pub store: MemoryCheckoutStore,
    pub clock: Arc<FixedClock>,
    pub standard_shipping: ShippingMethod,
    pub free_shipping: ShippingMethod,
    pub card: PaymentMethod,
    pub summer10: Coupon,
    pub fixed50k: Coupon,
    pub events: mpsc::Receiver<Event>,
    event_sender: Arc<EventSender>,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = MemoryCheckoutStore::new();

        let standard_shipping = ShippingMethod {
            id: Uuid::new_v4(),
            name: "Standard".to_string(),
            base_fee: Money::new(30_000),
            estimated_days: Some("3-5".to_string()),
            is_active: true,
        };
        let free_shipping = ShippingMethod {
            id: Uuid::new_v4(),
            name: "Store pickup".to_string(),
            base_fee: Money::ZERO,
            estimated_days: None,
            is_active: true,
        };
        let card = PaymentMethod {
            id: Uuid::new_v4(),
            name: "Card".to_string(),
            description: Some("Visa / Mastercard".to_string()),
            is_active: true,
        };
        let summer10 = coupon("SUMMER10", DiscountType::Percentage, 10, 0, Some(20_000));
        let fixed50k = coupon("FIXED50K", DiscountType::Fixed, 50_000, 0, None);

        store.insert_shipping_method(standard_shipping.clone()).await;
        store.insert_shipping_method(free_shipping.clone()).await;
        store.insert_payment_method(card.clone()).await;
        store.insert_coupon(summer10.clone()).await;
        store.insert_coupon(fixed50k.clone()).await;

        let (tx, events) = mpsc::channel(64);

        Self {
            store,
            clock: Arc::new(FixedClock(now())),
            standard_shipping,
            free_shipping,
            card,
            summer10,
            fixed50k,
            events,
            event_sender: Arc::new(EventSender::new(tx)),
        }
    }

    pub fn shared_store(&self) -> Arc<dyn CheckoutStore> {
        Arc::new(self.store.clone())
    }

    pub fn coupons(&self) -> CouponService {
        let clock: Arc<dyn Clock> = self.clock.clone();
        CouponService::new(self.shared_store(), clock, STORE_TIMEOUT)
    }

    pub fn orders(&self) -> OrderService {
        let clock: Arc<dyn Clock> = self.clock.clone();
        OrderService::new(self.shared_store(), self.coupons(), clock, STORE_TIMEOUT)
            .with_event_sender(self.event_sender.clone())
    }

    pub fn order_status(&self, policy: TransitionPolicy) -> OrderStatusService {
        OrderStatusService::new(self.shared_store(), policy, STORE_TIMEOUT)
            .with_event_sender(self.event_sender.clone())
    }

    pub fn payments(&self, policy: TransitionPolicy) -> PaymentService {
        PaymentService::new(self.shared_store(), policy, STORE_TIMEOUT)
            .with_event_sender(self.event_sender.clone())
    }

    pub fn draft(&self, shipping: &ShippingMethod, coupon_code: Option<&str>) -> OrderDraft {
        OrderDraft {
            user_id: None,
            recipient: Recipient {
                name: "Nguyen Thi Lan".to_string(),
                email: "lan@example.com".to_string(),
                phone: "0901234567".to_string(),
            },
            shipping_address: "12 Hang Bac, Hoan Kiem, Hanoi".to_string(),
            notes: None,
            shipping_method_id: shipping.id,
            payment_method_id: self.card.id,
            coupon_code: coupon_code.map(str::to_string),
            discount_amount: None,
        }
    }

    /// Drains whatever events have been published so far.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            seen.push(event);
        }
        seen
    }
}

pub fn coupon(
    code: &str,
    discount_type: DiscountType,
    value: i64,
    min_order_value: i64,
    max_discount: Option<i64>,
) -> Coupon {
    Coupon {
        id: Uuid::new_v4(),
        code: code.to_string(),
        discount_type,
        discount_value: value,
        min_order_value: Money::new(min_order_value),
        max_discount: max_discount.map(Money::new),
        valid_from: now() - ChronoDuration::days(30),
        valid_to: now() + ChronoDuration::days(30),
        is_active: true,
        usage_limit: None,
        usage_count: 0,
    }
}

pub fn line(unit_price: i64, quantity: u32) -> LineItem {
    LineItem {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        color_id: Uuid::new_v4(),
        size_id: Uuid::new_v4(),
        inventory_id: Some(Uuid::new_v4()),
        quantity,
        unit_price: Money::new(unit_price),
    }
}

/// Two lines: 100,000 × 2 and 50,000 × 1.
pub fn two_line_cart() -> Vec<LineItem> {
    vec![line(100_000, 2), line(50_000, 1)]
}
