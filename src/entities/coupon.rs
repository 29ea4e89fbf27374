use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Coupon, DiscountType, Money};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub min_order_value: i64,
    pub max_discount: Option<i64>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub is_active: bool,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Coupon {
    fn from(model: Model) -> Self {
        Coupon {
            id: model.id,
            code: model.code,
            discount_type: model.discount_type,
            discount_value: model.discount_value,
            min_order_value: Money::new(model.min_order_value),
            max_discount: model.max_discount.map(Money::new),
            valid_from: model.valid_from,
            valid_to: model.valid_to,
            is_active: model.is_active,
            usage_limit: model.usage_limit,
            usage_count: model.usage_count,
        }
    }
}

impl From<Coupon> for ActiveModel {
    fn from(coupon: Coupon) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(coupon.id),
            code: Set(coupon.code),
            discount_type: Set(coupon.discount_type),
            discount_value: Set(coupon.discount_value),
            min_order_value: Set(coupon.min_order_value.minor_units()),
            max_discount: Set(coupon.max_discount.map(Money::minor_units)),
            valid_from: Set(coupon.valid_from),
            valid_to: Set(coupon.valid_to),
            is_active: Set(coupon.is_active),
            usage_limit: Set(coupon.usage_limit),
            usage_count: Set(coupon.usage_count),
        }
    }
}
