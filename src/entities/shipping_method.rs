use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Money, ShippingMethod};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipping_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub base_fee: i64,
    pub estimated_days: Option<String>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ShippingMethod {
    fn from(model: Model) -> Self {
        ShippingMethod {
            id: model.id,
            name: model.name,
            base_fee: Money::new(model.base_fee),
            estimated_days: model.estimated_days,
            is_active: model.is_active,
        }
    }
}

impl From<ShippingMethod> for ActiveModel {
    fn from(method: ShippingMethod) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(method.id),
            name: Set(method.name),
            base_fee: Set(method.base_fee.minor_units()),
            estimated_days: Set(method.estimated_days),
            is_active: Set(method.is_active),
        }
    }
}
