use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{agreement_document, handcrafted_item, platform_listing, sale};

/// Indexes backing the owner lookups used by list filters and cascades.
fn owner_indexes() -> Vec<(&'static str, IndexCreateStatement)> {
    vec![
        (
            "idx_item_artisan",
            Index::create()
                .if_not_exists()
                .name("idx_item_artisan")
                .table(handcrafted_item::Entity)
                .col(handcrafted_item::Column::ArtisanId)
                .col(handcrafted_item::Column::UploadedAt)
                .to_owned(),
        ),
        (
            "idx_sale_artisan",
            Index::create()
                .if_not_exists()
                .name("idx_sale_artisan")
                .table(sale::Entity)
                .col(sale::Column::ArtisanId)
                .to_owned(),
        ),
        (
            "idx_sale_item_sold",
            Index::create()
                .if_not_exists()
                .name("idx_sale_item_sold")
                .table(sale::Entity)
                .col(sale::Column::ItemId)
                .col(sale::Column::SoldAt)
                .to_owned(),
        ),
        (
            "idx_listing_item",
            Index::create()
                .if_not_exists()
                .name("idx_listing_item")
                .table(platform_listing::Entity)
                .col(platform_listing::Column::ItemId)
                .to_owned(),
        ),
        (
            "idx_agreement_artisan",
            Index::create()
                .if_not_exists()
                .name("idx_agreement_artisan")
                .table(agreement_document::Entity)
                .col(agreement_document::Column::ArtisanId)
                .to_owned(),
        ),
    ]
}

/// Ensure required database indexes exist.
///
/// Schema-sync only creates the tables and unique constraints, so the
/// non-unique lookup indexes are created here on startup. A failure is
/// logged and does not stop the server.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    for (name, stmt) in owner_indexes() {
        let sql = stmt.to_string(PostgresQueryBuilder);
        match db.execute_unprepared(&sql).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }
    Ok(())
}
