use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, validate_contact_number, validate_text};
use crate::entity::artisan::{self, AgreementStatus};
use crate::error::AppError;

/// Request body for registering an artisan.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateArtisanRequest {
    #[schema(example = "Meera Devi")]
    pub name: String,
    #[schema(example = "12 Kumhar Gali, Jaipur, Rajasthan")]
    pub address: String,
    #[schema(example = "+91 98765 43210")]
    pub contact_number: String,
    /// Optional national identity number; unique across artisans.
    #[schema(example = "123412341234")]
    pub national_id: Option<String>,
    /// Defaults to `Pending`.
    pub agreement_status: Option<AgreementStatus>,
}

pub fn validate_create_artisan(payload: &CreateArtisanRequest) -> Result<(), AppError> {
    validate_text(&payload.name, "Name", 128)?;
    validate_text(&payload.address, "Address", 512)?;
    validate_contact_number(&payload.contact_number)?;
    if let Some(ref national_id) = payload.national_id {
        validate_national_id(national_id)?;
    }
    Ok(())
}

/// Partial update of an artisan. Absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateArtisanRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    /// `null` clears the national ID.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub national_id: Option<Option<String>>,
    pub agreement_status: Option<AgreementStatus>,
}

pub fn validate_update_artisan(payload: &UpdateArtisanRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_text(name, "Name", 128)?;
    }
    if let Some(ref address) = payload.address {
        validate_text(address, "Address", 512)?;
    }
    if let Some(ref contact) = payload.contact_number {
        validate_contact_number(contact)?;
    }
    if let Some(Some(ref national_id)) = payload.national_id {
        validate_national_id(national_id)?;
    }
    Ok(())
}

impl UpdateArtisanRequest {
    /// Copy the present fields onto `active`.
    pub fn apply_to(self, active: &mut artisan::ActiveModel) {
        if let Some(name) = self.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(address) = self.address {
            active.address = Set(address.trim().to_string());
        }
        if let Some(contact) = self.contact_number {
            active.contact_number = Set(contact.trim().to_string());
        }
        if let Some(national_id) = self.national_id {
            active.national_id = Set(national_id.map(|id| id.trim().to_string()));
        }
        if let Some(status) = self.agreement_status {
            active.agreement_status = Set(status);
        }
    }
}

/// 4-32 ASCII letters or digits.
pub fn validate_national_id(value: &str) -> Result<(), AppError> {
    let value = value.trim();
    if !(4..=32).contains(&value.len()) || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(
            "National ID must be 4-32 letters or digits".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArtisanListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    pub agreement_status: Option<AgreementStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ArtisanResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact_number: String,
    pub national_id: Option<String>,
    pub agreement_status: AgreementStatus,
    pub avatar_url: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<artisan::Model> for ArtisanResponse {
    fn from(m: artisan::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            address: m.address,
            contact_number: m.contact_number,
            national_id: m.national_id,
            agreement_status: m.agreement_status,
            avatar_url: m.avatar_url,
            registered_at: m.registered_at,
            updated_at: m.updated_at,
        }
    }
}

/// Artisan with counts of the records it owns.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ArtisanDetailResponse {
    #[serde(flatten)]
    pub artisan: ArtisanResponse,
    pub item_count: u64,
    pub agreement_count: u64,
    pub sale_count: u64,
}
