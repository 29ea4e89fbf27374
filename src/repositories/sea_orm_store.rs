use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::{CheckoutStore, CheckoutTransaction};
use crate::entities::{coupon, order, order_item, payment, payment_method, shipping_method};
use crate::errors::ServiceError;
use crate::models::{
    Coupon, HydratedOrder, NewOrder, NewOrderItem, NewPayment, Order, OrderItem, OrderStatus,
    Payment, PaymentMethod, PaymentStatus, ShippingMethod,
};

/// [`CheckoutStore`] backed by a relational database through SeaORM.
#[derive(Clone, Debug)]
pub struct SeaOrmCheckoutStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCheckoutStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CheckoutStore for SeaOrmCheckoutStore {
    #[instrument(skip(self))]
    async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, ServiceError> {
        let model = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code))
            .one(&*self.db)
            .await?;
        Ok(model.map(Coupon::from))
    }

    async fn get_shipping_method(&self, id: Uuid) -> Result<Option<ShippingMethod>, ServiceError> {
        let model = shipping_method::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(model.map(ShippingMethod::from))
    }

    async fn get_payment_method(&self, id: Uuid) -> Result<Option<PaymentMethod>, ServiceError> {
        let model = payment_method::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(model.map(PaymentMethod::from))
    }

    #[instrument(skip(self))]
    async fn get_order(&self, id: Uuid) -> Result<Option<HydratedOrder>, ServiceError> {
        let Some(header) = order::Entity::find_by_id(id).one(&*self.db).await? else {
            return Ok(None);
        };

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(OrderItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let shipping_method = shipping_method::Entity::find_by_id(header.shipping_method_id)
            .one(&*self.db)
            .await?
            .map(ShippingMethod::from);

        let payment = payment::Entity::find()
            .filter(payment::Column::OrderId.eq(id))
            .order_by_asc(payment::Column::PaymentDate)
            .one(&*self.db)
            .await?
            .map(Payment::from);

        Ok(Some(HydratedOrder {
            order: Order::from(header),
            items,
            shipping_method,
            payment,
        }))
    }

    async fn get_payment(&self, id: Uuid) -> Result<Option<Payment>, ServiceError> {
        let model = payment::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(model.map(Payment::from))
    }

    async fn begin(&self) -> Result<Box<dyn CheckoutTransaction>, ServiceError> {
        let txn = self.db.begin().await.map_err(|e| {
            error!("Failed to begin transaction: {}", e);
            ServiceError::DatabaseError(e)
        })?;
        Ok(Box::new(SeaOrmTransaction { txn }))
    }
}

struct SeaOrmTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl CheckoutTransaction for SeaOrmTransaction {
    async fn insert_order(&mut self, new_order: NewOrder) -> Result<Uuid, ServiceError> {
        let model = order::ActiveModel::from_new(Uuid::new_v4(), new_order)
            .insert(&self.txn)
            .await?;
        Ok(model.id)
    }

    async fn insert_order_items(&mut self, items: Vec<NewOrderItem>) -> Result<(), ServiceError> {
        if items.is_empty() {
            return Ok(());
        }
        let models = items
            .into_iter()
            .map(order_item::ActiveModel::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let inserted = order_item::Entity::insert_many(models)
            .exec_without_returning(&self.txn)
            .await?;
        debug!("Inserted {} order items", inserted);
        Ok(())
    }

    async fn increment_coupon_usage(&mut self, coupon_id: Uuid) -> Result<bool, ServiceError> {
        let result = coupon::Entity::update_many()
            .col_expr(
                coupon::Column::UsageCount,
                Expr::col(coupon::Column::UsageCount).add(1),
            )
            .filter(coupon::Column::Id.eq(coupon_id))
            .filter(
                Condition::any()
                    .add(coupon::Column::UsageLimit.is_null())
                    .add(
                        Expr::col(coupon::Column::UsageCount)
                            .lt(Expr::col(coupon::Column::UsageLimit)),
                    ),
            )
            .exec(&self.txn)
            .await?;

        if result.rows_affected == 1 {
            return Ok(true);
        }
        match coupon::Entity::find_by_id(coupon_id).one(&self.txn).await? {
            Some(_) => Ok(false),
            None => Err(ServiceError::NotFound(format!("Coupon {} not found", coupon_id))),
        }
    }

    async fn insert_payment(&mut self, new_payment: NewPayment) -> Result<Uuid, ServiceError> {
        let model = payment::ActiveModel::from_new(Uuid::new_v4(), new_payment)
            .insert(&self.txn)
            .await?;
        Ok(model.id)
    }

    async fn get_order(&mut self, id: Uuid) -> Result<Option<Order>, ServiceError> {
        let model = order::Entity::find_by_id(id).one(&self.txn).await?;
        Ok(model.map(Order::from))
    }

    async fn update_order_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<(), ServiceError> {
        let model = order::Entity::find_by_id(id)
            .one(&self.txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let mut active: order::ActiveModel = model.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now());
        active.update(&self.txn).await?;
        Ok(())
    }

    async fn get_payment(&mut self, id: Uuid) -> Result<Option<Payment>, ServiceError> {
        let model = payment::Entity::find_by_id(id).one(&self.txn).await?;
        Ok(model.map(Payment::from))
    }

    async fn update_payment_status(
        &mut self,
        id: Uuid,
        status: PaymentStatus,
        transaction_id: Option<String>,
    ) -> Result<(), ServiceError> {
        let model = payment::Entity::find_by_id(id)
            .one(&self.txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Payment {} not found", id)))?;

        let mut active: payment::ActiveModel = model.into();
        active.status = Set(status);
        if let Some(txn_id) = transaction_id {
            active.transaction_id = Set(Some(txn_id));
        }
        active.update(&self.txn).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), ServiceError> {
        self.txn.commit().await.map_err(|e: DbErr| {
            error!("Failed to commit checkout transaction: {}", e);
            ServiceError::DatabaseError(e)
        })
    }

    async fn rollback(self: Box<Self>) -> Result<(), ServiceError> {
        self.txn.rollback().await?;
        Ok(())
    }
}
