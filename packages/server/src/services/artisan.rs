//! Cascading removal of an artisan and every record and blob it owns.

use sea_orm::sea_query::LockType;
use sea_orm::*;
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use super::media::{BlobCleanup, MediaService};
use super::rollback_quietly;
use crate::entity::{agreement_document, artisan, handcrafted_item, platform_listing, sale};
use crate::error::AppError;

/// What a cascading artisan delete removed.
#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct CascadeSummary {
    pub artisan_id: Uuid,
    pub agreements: u64,
    pub items: u64,
    pub listings: u64,
    pub sales: u64,
    /// Blobs queued for deletion after commit.
    pub blobs_scheduled: usize,
    /// Blobs the store confirmed deleted.
    pub blobs_deleted: usize,
}

pub(crate) async fn find_artisan_for_update(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<artisan::Model, AppError> {
    artisan::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Artisan not found".into()))
}

/// Delete an artisan and everything that references it.
///
/// All rows go in one transaction. Blobs (avatar, agreement scans) are deleted
/// only once that transaction has committed.
#[instrument(skip(db, media))]
pub async fn delete_artisan_cascade(
    db: &DatabaseConnection,
    media: &MediaService,
    artisan_id: Uuid,
) -> Result<CascadeSummary, AppError> {
    let txn = db.begin().await?;
    let (mut summary, cleanup) = match remove_artisan_records(&txn, artisan_id).await {
        Ok(removed) => removed,
        Err(e) => {
            rollback_quietly(txn).await;
            return Err(e);
        }
    };
    txn.commit().await?;

    summary.blobs_deleted = media.purge(cleanup).await;

    tracing::info!(
        agreements = summary.agreements,
        items = summary.items,
        listings = summary.listings,
        sales = summary.sales,
        blobs_scheduled = summary.blobs_scheduled,
        blobs_deleted = summary.blobs_deleted,
        "Deleted artisan"
    );
    Ok(summary)
}

async fn remove_artisan_records(
    txn: &DatabaseTransaction,
    artisan_id: Uuid,
) -> Result<(CascadeSummary, BlobCleanup), AppError> {
    let mut cleanup = BlobCleanup::default();

    let artisan = find_artisan_for_update(txn, artisan_id).await?;
    cleanup.schedule(artisan.avatar_blob_id);

    let agreement_blobs: Vec<String> = agreement_document::Entity::find()
        .select_only()
        .column(agreement_document::Column::BlobId)
        .filter(agreement_document::Column::ArtisanId.eq(artisan_id))
        .into_tuple()
        .all(txn)
        .await?;
    for blob_id in agreement_blobs {
        cleanup.schedule(Some(blob_id));
    }
    let agreements = agreement_document::Entity::delete_many()
        .filter(agreement_document::Column::ArtisanId.eq(artisan_id))
        .exec(txn)
        .await?
        .rows_affected;

    // Lock the items so a concurrent sale either finishes first or sees them gone.
    let item_ids: Vec<Uuid> = handcrafted_item::Entity::find()
        .select_only()
        .column(handcrafted_item::Column::Id)
        .filter(handcrafted_item::Column::ArtisanId.eq(artisan_id))
        .lock(LockType::Update)
        .into_tuple()
        .all(txn)
        .await?;

    let listings = if item_ids.is_empty() {
        0
    } else {
        platform_listing::Entity::delete_many()
            .filter(platform_listing::Column::ItemId.is_in(item_ids.clone()))
            .exec(txn)
            .await?
            .rows_affected
    };
    let items = handcrafted_item::Entity::delete_many()
        .filter(handcrafted_item::Column::ArtisanId.eq(artisan_id))
        .exec(txn)
        .await?
        .rows_affected;

    let sales = sale::Entity::delete_many()
        .filter(sale::Column::ArtisanId.eq(artisan_id))
        .exec(txn)
        .await?
        .rows_affected;

    artisan::Entity::delete_by_id(artisan_id).exec(txn).await?;

    let summary = CascadeSummary {
        artisan_id,
        agreements,
        items,
        listings,
        sales,
        blobs_scheduled: cleanup.len(),
        blobs_deleted: 0,
    };
    Ok((summary, cleanup))
}
