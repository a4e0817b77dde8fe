use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum OperatorRole {
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "PortalOperator")]
    PortalOperator,
}

/// The role assigned to newly registered operators.
pub const DEFAULT_ROLE: OperatorRole = OperatorRole::PortalOperator;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_operator")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub name: String,
    /// Stored lower-cased.
    #[sea_orm(unique)]
    pub email: String,
    pub contact_number: String,

    pub avatar_url: Option<String>,
    pub avatar_blob_id: Option<String>,

    pub role: OperatorRole,

    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: String,
    /// SHA-256 hex digest of the currently valid refresh token.
    #[serde(skip_serializing)]
    pub refresh_token_digest: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
