use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Money;

/// One product/color/size entry in a cart.
///
/// `unit_price` is the price captured when the line was added (base price
/// plus color and size adjustments) and is never repriced afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LineItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub color_id: Uuid,
    pub size_id: Uuid,
    /// The color+size stock record; required before an order can be placed.
    pub inventory_id: Option<Uuid>,
    pub quantity: u32,
    pub unit_price: Money,
}

impl LineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    pub fn matches_variant(&self, product_id: Uuid, color_id: Uuid, size_id: Uuid) -> bool {
        self.product_id == product_id && self.color_id == color_id && self.size_id == size_id
    }
}

/// Input for adding a line to a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewLineItem {
    pub product_id: Uuid,
    pub color_id: Uuid,
    pub size_id: Uuid,
    pub inventory_id: Option<Uuid>,
    pub quantity: u32,
    pub unit_price: Money,
}
