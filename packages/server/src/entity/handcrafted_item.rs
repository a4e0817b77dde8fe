use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ItemStatus {
    #[sea_orm(string_value = "Available")]
    Available,
    #[sea_orm(string_value = "Sold")]
    Sold,
    #[sea_orm(string_value = "Draft")]
    Draft,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "handcrafted_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Owning artisan. Enforced by the application, not by a foreign key.
    pub artisan_id: Uuid,

    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub quantity: i32,
    pub status: ItemStatus,

    pub uploaded_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
