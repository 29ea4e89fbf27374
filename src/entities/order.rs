use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Money, NewOrder, Order, OrderStatus, Recipient};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub recipient_name: String,
    pub recipient_email: String,
    pub recipient_phone: String,
    pub shipping_address: String,
    pub notes: Option<String>,
    pub shipping_method_id: Uuid,
    pub coupon_id: Option<Uuid>,
    pub discount_amount: i64,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItem,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payment,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItem.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Order {
    fn from(model: Model) -> Self {
        Order {
            id: model.id,
            user_id: model.user_id,
            recipient: Recipient {
                name: model.recipient_name,
                email: model.recipient_email,
                phone: model.recipient_phone,
            },
            shipping_address: model.shipping_address,
            notes: model.notes,
            shipping_method_id: model.shipping_method_id,
            coupon_id: model.coupon_id,
            discount_amount: Money::new(model.discount_amount),
            total_amount: Money::new(model.total_amount),
            status: model.status,
            order_date: model.order_date,
        }
    }
}

impl ActiveModel {
    pub fn from_new(id: Uuid, order: NewOrder) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(id),
            user_id: Set(order.user_id),
            recipient_name: Set(order.recipient.name),
            recipient_email: Set(order.recipient.email),
            recipient_phone: Set(order.recipient.phone),
            shipping_address: Set(order.shipping_address),
            notes: Set(order.notes),
            shipping_method_id: Set(order.shipping_method_id),
            coupon_id: Set(order.coupon_id),
            discount_amount: Set(order.discount_amount.minor_units()),
            total_amount: Set(order.total_amount.minor_units()),
            status: Set(order.status),
            order_date: Set(order.order_date),
            updated_at: Set(order.order_date),
        }
    }
}
