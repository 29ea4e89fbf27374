//! SeaORM entities backing [`crate::repositories::SeaOrmCheckoutStore`].

pub mod coupon;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod payment_method;
pub mod shipping_method;

pub use coupon::Entity as CouponEntity;
pub use order::Entity as OrderEntity;
pub use order_item::Entity as OrderItemEntity;
pub use payment::Entity as PaymentEntity;
pub use payment_method::Entity as PaymentMethodEntity;
pub use shipping_method::Entity as ShippingMethodEntity;

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use tracing::info;

/// Creates any missing checkout tables from the entity definitions.
///
/// Meant for SQLite development databases and tests. It never alters or
/// drops existing tables.
pub async fn ensure_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    create_table(db, &schema, CouponEntity).await?;
    create_table(db, &schema, ShippingMethodEntity).await?;
    create_table(db, &schema, PaymentMethodEntity).await?;
    create_table(db, &schema, OrderEntity).await?;
    create_table(db, &schema, OrderItemEntity).await?;
    create_table(db, &schema, PaymentEntity).await?;

    info!("Checkout schema ensured");
    Ok(())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
