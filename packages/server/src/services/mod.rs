//! Operations that touch several tables in one transaction.

pub mod artisan;
pub mod media;
pub mod sale;

use sea_orm::DatabaseTransaction;

/// Roll back `txn`, logging rather than surfacing a rollback failure so the
/// caller can return the error that caused it.
pub(crate) async fn rollback_quietly(txn: DatabaseTransaction) {
    if let Err(e) = txn.rollback().await {
        tracing::warn!("Transaction rollback failed: {e}");
    }
}
