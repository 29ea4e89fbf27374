//! Pure money arithmetic for carts and orders.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{LineItem, Money};

/// `Σ unit_price × quantity`; zero for an empty sequence.
pub fn subtotal<'a, I>(items: I) -> Money
where
    I: IntoIterator<Item = &'a LineItem>,
{
    items.into_iter().map(LineItem::line_total).sum()
}

/// `max(0, subtotal − discount) + shipping_fee`.
///
/// A discount can zero the merchandise portion but never eat into shipping.
pub fn grand_total(subtotal: Money, discount_amount: Money, shipping_fee: Money) -> Money {
    (subtotal - discount_amount).non_negative() + shipping_fee
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

impl PriceBreakdown {
    pub fn new(subtotal: Money, discount_amount: Money, shipping_fee: Money) -> Self {
        Self {
            subtotal,
            discount_amount,
            shipping_fee,
            total: grand_total(subtotal, discount_amount, shipping_fee),
        }
    }
}
