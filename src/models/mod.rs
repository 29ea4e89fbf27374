//! Domain types shared by the pricing pipeline, the stores and the HTTP layer.

pub mod catalog;
pub mod coupon;
pub mod line_item;
pub mod money;
pub mod order;
pub mod payment;

pub use catalog::{PaymentMethod, ShippingMethod};
pub use coupon::{AppliedCoupon, Coupon, DiscountType};
pub use line_item::{LineItem, NewLineItem};
pub use money::Money;
pub use order::{
    HydratedOrder, NewOrder, NewOrderItem, Order, OrderDraft, OrderItem, OrderStatus, Recipient,
};
pub use payment::{NewPayment, Payment, PaymentStatus};
