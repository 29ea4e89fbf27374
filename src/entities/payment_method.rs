use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::PaymentMethod;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PaymentMethod {
    fn from(model: Model) -> Self {
        PaymentMethod {
            id: model.id,
            name: model.name,
            description: model.description,
            is_active: model.is_active,
        }
    }
}

impl From<PaymentMethod> for ActiveModel {
    fn from(method: PaymentMethod) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(method.id),
            name: Set(method.name),
            description: Set(method.description),
            is_active: Set(method.is_active),
        }
    }
}
