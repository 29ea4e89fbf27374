//! The shopper's cart: line items, the chosen shipping method and the
//! applied coupon, with totals derived on demand.

pub mod session;
pub mod storage;

pub use session::{CartSession, CartSessions};
pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    coupons::calculate_discount,
    pricing::{self, PriceBreakdown},
};
use crate::{
    errors::ServiceError,
    models::{AppliedCoupon, Coupon, LineItem, Money, NewLineItem, ShippingMethod},
};

/// In-memory checkout state for one shopper.
///
/// Items, shipping selection and coupon form one unit: [`Cart::clear`]
/// resets all three, and the coupon never outlives the last item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    shipping_method: Option<ShippingMethod>,
    #[serde(default)]
    coupon: Option<Coupon>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn shipping_method(&self) -> Option<&ShippingMethod> {
        self.shipping_method.as_ref()
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        self.coupon.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Adds a product variant to the cart.
    ///
    /// If a line for the same product, color and size already exists its
    /// quantity grows by `input.quantity` and its captured price is kept.
    /// Otherwise a new line is appended.
    ///
    /// # Returns
    ///
    /// * `Ok(Uuid)` - Id of the line that now holds the variant
    /// * `Err(ServiceError::InvalidInput)` - Zero quantity or negative price
    pub fn add_item(&mut self, input: NewLineItem) -> Result<Uuid, ServiceError> {
        if input.quantity == 0 {
            return Err(ServiceError::InvalidInput(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if input.unit_price.is_negative() {
            return Err(ServiceError::InvalidInput(
                "Unit price cannot be negative".to_string(),
            ));
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.matches_variant(input.product_id, input.color_id, input.size_id))
        {
            existing.quantity = existing.quantity.saturating_add(input.quantity);
            if existing.inventory_id.is_none() {
                existing.inventory_id = input.inventory_id;
            }
            return Ok(existing.id);
        }

        let id = Uuid::new_v4();
        self.items.push(LineItem {
            id,
            product_id: input.product_id,
            color_id: input.color_id,
            size_id: input.size_id,
            inventory_id: input.inventory_id,
            quantity: input.quantity,
            unit_price: input.unit_price,
        });
        Ok(id)
    }

    /// Sets a line's quantity. Quantities below 1 are ignored rather than
    /// treated as removal. Returns whether a line changed.
    pub fn update_quantity(&mut self, item_id: Uuid, quantity: u32) -> bool {
        if quantity < 1 {
            return false;
        }
        match self.items.iter_mut().find(|item| item.id == item_id) {
            Some(item) if item.quantity != quantity => {
                item.quantity = quantity;
                true
            }
            _ => false,
        }
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> Option<LineItem> {
        let position = self.items.iter().position(|item| item.id == item_id)?;
        let removed = self.items.remove(position);
        if self.items.is_empty() {
            self.coupon = None;
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.shipping_method = None;
        self.coupon = None;
    }

    pub fn set_shipping_method(&mut self, method: Option<ShippingMethod>) {
        self.shipping_method = method;
    }

    /// Keeps a snapshot of a coupon quoted by the coupon service.
    pub fn apply_coupon(&mut self, applied: AppliedCoupon) {
        self.coupon = Some(applied.coupon);
    }

    pub fn remove_coupon(&mut self) -> Option<Coupon> {
        self.coupon.take()
    }

    pub fn subtotal(&self) -> Money {
        pricing::subtotal(&self.items)
    }

    /// Current totals. The discount is recomputed from the coupon snapshot
    /// against the current subtotal; the coupon's minimum order value is not
    /// checked again here, order assembly does that.
    pub fn totals(&self) -> PriceBreakdown {
        let subtotal = self.subtotal();
        let discount = self
            .coupon
            .as_ref()
            .map(|coupon| calculate_discount(coupon, subtotal))
            .unwrap_or(Money::ZERO);
        let shipping_fee = self
            .shipping_method
            .as_ref()
            .map(|method| method.base_fee)
            .unwrap_or(Money::ZERO);

        PriceBreakdown::new(subtotal, discount, shipping_fee)
    }
}
