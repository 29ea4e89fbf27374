use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Money, NewPayment, Payment, PaymentStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_method_id: Uuid,
    pub amount: i64,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_date: DateTime<Utc>,
    pub notes: Option<String>,
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

impl From<Model> for Payment {
    fn from(model: Model) -> Self {
        Payment {
            id: model.id,
            order_id: model.order_id,
            payment_method_id: model.payment_method_id,
            amount: Money::new(model.amount),
            status: model.status,
            transaction_id: model.transaction_id,
            payment_date: model.payment_date,
            notes: model.notes,
        }
    }
}

impl ActiveModel {
    pub fn from_new(id: Uuid, payment: NewPayment) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(id),
            order_id: Set(payment.order_id),
            payment_method_id: Set(payment.payment_method_id),
            amount: Set(payment.amount.minor_units()),
            status: Set(payment.status),
            transaction_id: Set(None),
            payment_date: Set(payment.payment_date),
            notes: Set(payment.notes),
        }
    }
}
