use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether the artisan has signed the marketplace agreement.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum AgreementStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Signed")]
    Signed,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "artisan")]
pub struct Model {
    /// UUIDv7 primary key.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
    pub address: String,
    pub contact_number: String,

    /// National identity number. NULLs do not collide on the unique index.
    #[sea_orm(unique)]
    pub national_id: Option<String>,

    pub agreement_status: AgreementStatus,

    pub avatar_url: Option<String>,
    pub avatar_blob_id: Option<String>,

    pub registered_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
