use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Money, NewOrderItem, OrderItem};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub inventory_id: Uuid,
    pub quantity: i32,
    pub price_at_order: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for OrderItem {
    type Error = ServiceError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(model.quantity).map_err(|_| {
            ServiceError::InternalError(format!(
                "Order item {} has negative quantity {}",
                model.id, model.quantity
            ))
        })?;

        Ok(OrderItem {
            id: model.id,
            order_id: model.order_id,
            inventory_id: model.inventory_id,
            quantity,
            price_at_order: Money::new(model.price_at_order),
        })
    }
}

impl TryFrom<NewOrderItem> for ActiveModel {
    type Error = ServiceError;

    fn try_from(item: NewOrderItem) -> Result<Self, Self::Error> {
        use sea_orm::Set;

        let quantity = i32::try_from(item.quantity).map_err(|_| {
            ServiceError::InvalidInput(format!("Quantity {} is too large", item.quantity))
        })?;

        Ok(ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(item.order_id),
            inventory_id: Set(item.inventory_id),
            quantity: Set(quantity),
            price_at_order: Set(item.price_at_order.minor_units()),
        })
    }
}
