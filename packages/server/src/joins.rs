//! Read-side joins: resolve referenced records for a page of results with one
//! `id IN (...)` query per referenced table. Never used inside write transactions.

use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::{artisan, handcrafted_item};

#[derive(Clone, Debug, Serialize, sea_orm::FromQueryResult, utoipa::ToSchema)]
pub struct ArtisanSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, sea_orm::FromQueryResult, utoipa::ToSchema)]
pub struct ItemSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
}

fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    ids.into_iter().collect::<HashSet<_>>().into_iter().collect()
}

/// Fetch artisan summaries for the given IDs. Missing IDs are simply absent from the map.
pub async fn artisans_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, ArtisanSummary>, DbErr> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = artisan::Entity::find()
        .select_only()
        .column(artisan::Column::Id)
        .column(artisan::Column::Name)
        .filter(artisan::Column::Id.is_in(ids))
        .into_model::<ArtisanSummary>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|a| (a.id, a)).collect())
}

/// Fetch item summaries for the given IDs.
pub async fn items_by_id<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, ItemSummary>, DbErr> {
    let ids = distinct(ids);
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = handcrafted_item::Entity::find()
        .select_only()
        .column(handcrafted_item::Column::Id)
        .column(handcrafted_item::Column::Name)
        .column(handcrafted_item::Column::Category)
        .filter(handcrafted_item::Column::Id.is_in(ids))
        .into_model::<ItemSummary>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|i| (i.id, i)).collect())
}
