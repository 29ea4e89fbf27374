pub mod cart;
pub mod coupons;
pub mod order_status;
pub mod orders;
pub mod payments;
pub mod pricing;

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::errors::ServiceError;
use crate::repositories::CheckoutTransaction;

/// Runs a collaborator call under `limit`, reporting `what` on expiry.
pub(crate) async fn bounded<T, F>(limit: Duration, what: &str, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} did not finish within {:?}", what, limit);
            Err(ServiceError::Timeout(what.to_string()))
        }
    }
}

/// Rolls `txn` back after a failed step. The step's error is what the caller
/// reports, so a rollback failure is only logged.
pub(crate) async fn abandon(txn: Box<dyn CheckoutTransaction>, limit: Duration) {
    if let Err(e) = bounded(limit, "transaction rollback", txn.rollback()).await {
        error!("Failed to roll back transaction: {}", e);
    }
}
