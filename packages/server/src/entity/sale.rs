use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub item_id: Uuid,
    /// Denormalized from the item so artisan cascades need no join.
    pub artisan_id: Uuid,

    pub platform_name: String,
    pub quantity_sold: i32,
    pub total_revenue: f64,
    pub sold_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
