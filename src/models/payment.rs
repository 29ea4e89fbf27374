use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Money;

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[strum(ascii_case_insensitive)]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Completed")]
    Completed,
    #[sea_orm(string_value = "Failed")]
    Failed,
}

impl PaymentStatus {
    /// A completed payment is terminal; pending and failed payments may be retried.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        match self {
            PaymentStatus::Completed => next == PaymentStatus::Completed,
            PaymentStatus::Pending | PaymentStatus::Failed => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_method_id: Uuid,
    pub amount: Money,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub payment_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPayment {
    pub order_id: Uuid,
    pub payment_method_id: Uuid,
    pub amount: Money,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl NewPayment {
    pub fn into_payment(self, id: Uuid) -> Payment {
        Payment {
            id,
            order_id: self.order_id,
            payment_method_id: self.payment_method_id,
            amount: self.amount,
            status: self.status,
            transaction_id: None,
            payment_date: self.payment_date,
            notes: self.notes,
        }
    }
}
