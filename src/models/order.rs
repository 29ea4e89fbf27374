use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{Money, Payment, ShippingMethod};

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[strum(ascii_case_insensitive)]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// Statuses reachable from `self` under the strict transition table.
    pub fn successors(self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        self == next || self.successors().contains(&next)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Recipient {
    #[validate(length(min = 1, max = 255, message = "Recipient name is required"))]
    pub name: String,
    #[validate(email(message = "Recipient email is not a valid address"))]
    pub email: String,
    #[validate(length(min = 1, max = 32, message = "Recipient phone is required"))]
    pub phone: String,
}

/// What the shopper submits at checkout, alongside the cart lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderDraft {
    /// `None` for guest checkout.
    pub user_id: Option<Uuid>,
    #[validate]
    pub recipient: Recipient,
    #[validate(length(min = 1, message = "Shipping address is required"))]
    pub shipping_address: String,
    pub notes: Option<String>,
    pub shipping_method_id: Uuid,
    pub payment_method_id: Uuid,
    pub coupon_code: Option<String>,
    /// Discount the client was quoted; the server recomputes its own.
    pub discount_amount: Option<Money>,
}

/// An order header as persisted.
///
/// `total_amount` is fixed at creation and never recomputed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub recipient: Recipient,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub shipping_method_id: Uuid,
    pub coupon_id: Option<Uuid>,
    pub discount_amount: Money,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

/// A frozen line of an order. `price_at_order` is `unit_price × quantity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub inventory_id: Uuid,
    pub quantity: u32,
    pub price_at_order: Money,
}

/// Header fields handed to the persistence collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: Option<Uuid>,
    pub recipient: Recipient,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub shipping_method_id: Uuid,
    pub coupon_id: Option<Uuid>,
    pub discount_amount: Money,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

impl NewOrder {
    pub fn into_order(self, id: Uuid) -> Order {
        Order {
            id,
            user_id: self.user_id,
            recipient: self.recipient,
            shipping_address: self.shipping_address,
            notes: self.notes,
            shipping_method_id: self.shipping_method_id,
            coupon_id: self.coupon_id,
            discount_amount: self.discount_amount,
            total_amount: self.total_amount,
            status: self.status,
            order_date: self.order_date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: Uuid,
    pub inventory_id: Uuid,
    pub quantity: u32,
    pub price_at_order: Money,
}

/// An order together with everything a confirmation page shows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HydratedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping_method: Option<ShippingMethod>,
    pub payment: Option<Payment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_listed_statuses_case_insensitively() {
        assert_eq!(OrderStatus::from_str("Shipped").unwrap(), OrderStatus::Shipped);
        assert_eq!(OrderStatus::from_str("cancelled").unwrap(), OrderStatus::Cancelled);
        assert!(OrderStatus::from_str("Delivered").is_err());
    }

    #[test]
    fn strict_table_is_forward_only() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn same_status_is_always_allowed() {
        assert!(OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn draft_rejects_bad_email() {
        let draft = OrderDraft {
            user_id: None,
            recipient: Recipient {
                name: "Linh".into(),
                email: "not-an-email".into(),
                phone: "0900000000".into(),
            },
            shipping_address: "12 Hang Bac, Hanoi".into(),
            notes: None,
            shipping_method_id: Uuid::new_v4(),
            payment_method_id: Uuid::new_v4(),
            coupon_code: None,
            discount_amount: None,
        };
        assert!(draft.validate().is_err());
    }
}
