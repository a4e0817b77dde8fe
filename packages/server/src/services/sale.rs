//! Sales and the item stock they draw down.
//!
//! Recording a sale locks the item row and guards the decrement with
//! `quantity >= n`, so a sale never computes stock from a stale read. Revoking
//! a sale puts the quantity back under the same lock.

use chrono::Utc;
use sea_orm::sea_query::{Expr, ExprTrait, LockType};
use sea_orm::*;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use super::rollback_quietly;
use crate::entity::handcrafted_item::{self, ItemStatus};
use crate::entity::sale;
use crate::error::AppError;
use crate::models::sale::NewSale;

/// Status an item takes once a sale leaves `remaining` units.
pub fn status_after_sale(current: ItemStatus, remaining: i32) -> ItemStatus {
    if remaining == 0 {
        ItemStatus::Sold
    } else {
        current
    }
}

/// Status an item takes once a revoked sale restores it to `restored` units.
/// Drafts stay drafts.
pub fn status_after_restore(current: ItemStatus, restored: i32) -> ItemStatus {
    match current {
        ItemStatus::Draft => ItemStatus::Draft,
        _ if restored > 0 => ItemStatus::Available,
        other => other,
    }
}

/// Outcome of revoking a sale.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SaleRevocation {
    pub sale_id: Uuid,
    pub item_id: Uuid,
    /// Item quantity after the restore; absent when the item no longer exists.
    pub restored_quantity: Option<i32>,
    pub item_status: Option<ItemStatus>,
}

async fn find_item_for_update(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<Option<handcrafted_item::Model>, DbErr> {
    handcrafted_item::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await
}

/// Record a sale and draw the item's stock down in one transaction.
#[instrument(skip(db, new_sale), fields(item_id = %new_sale.item_id, quantity = new_sale.quantity_sold))]
pub async fn record_sale(
    db: &DatabaseConnection,
    new_sale: NewSale,
) -> Result<sale::Model, AppError> {
    let txn = db.begin().await?;
    match insert_sale(&txn, new_sale).await {
        Ok(model) => {
            txn.commit().await?;
            tracing::info!(sale_id = %model.id, "Recorded sale");
            Ok(model)
        }
        Err(e) => {
            rollback_quietly(txn).await;
            Err(e)
        }
    }
}

async fn insert_sale(
    txn: &DatabaseTransaction,
    new_sale: NewSale,
) -> Result<sale::Model, AppError> {
    let item = find_item_for_update(txn, new_sale.item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))?;

    if item.artisan_id != new_sale.artisan_id {
        return Err(AppError::Validation(
            "Item does not belong to the given artisan".into(),
        ));
    }
    if item.quantity < new_sale.quantity_sold {
        return Err(AppError::Validation(format!(
            "Only {} item(s) available in stock",
            item.quantity
        )));
    }

    let remaining = item.quantity - new_sale.quantity_sold;
    let status = status_after_sale(item.status, remaining);

    let result = handcrafted_item::Entity::update_many()
        .col_expr(
            handcrafted_item::Column::Quantity,
            Expr::col(handcrafted_item::Column::Quantity).sub(new_sale.quantity_sold),
        )
        .col_expr(handcrafted_item::Column::Status, Expr::value(status.to_value()))
        .col_expr(handcrafted_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(handcrafted_item::Column::Id.eq(item.id))
        .filter(handcrafted_item::Column::Quantity.gte(new_sale.quantity_sold))
        .exec(txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Item stock changed concurrently, please retry".into(),
        ));
    }

    let model = sale::ActiveModel {
        id: Set(Uuid::now_v7()),
        item_id: Set(new_sale.item_id),
        artisan_id: Set(new_sale.artisan_id),
        platform_name: Set(new_sale.platform_name),
        quantity_sold: Set(new_sale.quantity_sold),
        total_revenue: Set(new_sale.total_revenue),
        sold_at: Set(new_sale.sold_at),
    }
    .insert(txn)
    .await?;

    Ok(model)
}

/// Delete a sale and return its quantity to the item.
#[instrument(skip(db))]
pub async fn revoke_sale(
    db: &DatabaseConnection,
    sale_id: Uuid,
) -> Result<SaleRevocation, AppError> {
    let txn = db.begin().await?;
    match remove_sale(&txn, sale_id).await {
        Ok(revocation) => {
            txn.commit().await?;
            tracing::info!(
                item_id = %revocation.item_id,
                restored_quantity = ?revocation.restored_quantity,
                "Revoked sale"
            );
            Ok(revocation)
        }
        Err(e) => {
            rollback_quietly(txn).await;
            Err(e)
        }
    }
}

/// Stock after putting `sold` units back. A total past `i32::MAX` is a conflict.
fn quantity_after_restore(current: i32, sold: i32) -> Result<i32, AppError> {
    current.checked_add(sold).ok_or_else(|| {
        AppError::Conflict(format!(
            "Restoring {sold} units would exceed the maximum quantity for this item"
        ))
    })
}

async fn remove_sale(txn: &DatabaseTransaction, sale_id: Uuid) -> Result<SaleRevocation, AppError> {
    let sale = sale::Entity::find_by_id(sale_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale not found".into()))?;

    let (restored_quantity, item_status) = match find_item_for_update(txn, sale.item_id).await? {
        Some(item) => {
            let restored = quantity_after_restore(item.quantity, sale.quantity_sold)?;
            let status = status_after_restore(item.status, restored);

            let mut active: handcrafted_item::ActiveModel = item.into();
            active.quantity = Set(restored);
            active.status = Set(status);
            active.updated_at = Set(Utc::now());
            active.update(txn).await?;

            (Some(restored), Some(status))
        }
        None => {
            tracing::warn!(
                item_id = %sale.item_id,
                "Sale references a missing item, deleting sale only"
            );
            (None, None)
        }
    };

    sale::Entity::delete_by_id(sale.id).exec(txn).await?;

    Ok(SaleRevocation {
        sale_id: sale.id,
        item_id: sale.item_id,
        restored_quantity,
        item_status,
    })
}
