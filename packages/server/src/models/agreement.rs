use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::parse_id;
use crate::entity::agreement_document;
use crate::error::AppError;
use crate::joins::ArtisanSummary;

/// Text fields of the multipart agreement upload, as received.
#[derive(Debug, Default)]
pub struct AgreementFields {
    pub artisan_id: Option<String>,
    pub date_signed: Option<String>,
    pub valid_until: Option<String>,
}

/// Validated agreement metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAgreement {
    pub artisan_id: Uuid,
    pub date_signed: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Multipart body shape, for the OpenAPI document only.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct CreateAgreementForm {
    pub artisan_id: String,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    #[schema(example = "2024-01-15")]
    pub date_signed: String,
    /// Must be after `date_signed`.
    #[schema(example = "2026-01-15")]
    pub valid_until: Option<String>,
    /// PDF, JPEG or PNG scan of the signed agreement.
    #[schema(value_type = String, format = Binary)]
    pub document: Vec<u8>,
}

/// Accept either a full RFC 3339 timestamp or a bare date (midnight UTC).
pub fn parse_date(raw: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            AppError::Validation(format!("{field} must be a date (YYYY-MM-DD or RFC 3339)"))
        })
}

pub fn validate_agreement_fields(fields: AgreementFields) -> Result<NewAgreement, AppError> {
    let artisan_id = fields
        .artisan_id
        .ok_or_else(|| AppError::Validation("artisan_id is required".into()))?;
    let artisan_id = parse_id(&artisan_id, "artisan")?;

    let date_signed = fields
        .date_signed
        .ok_or_else(|| AppError::Validation("date_signed is required".into()))?;
    let date_signed = parse_date(&date_signed, "date_signed")?;

    let valid_until = match fields.valid_until.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_date(raw, "valid_until")?),
    };
    if let Some(until) = valid_until
        && until <= date_signed
    {
        return Err(AppError::Validation(
            "valid_until must be after date_signed".into(),
        ));
    }

    Ok(NewAgreement {
        artisan_id,
        date_signed,
        valid_until,
    })
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AgreementListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub artisan_id: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AgreementResponse {
    pub id: Uuid,
    pub artisan_id: Uuid,
    pub artisan: Option<ArtisanSummary>,
    pub file_url: String,
    pub date_signed: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AgreementResponse {
    pub fn new(m: agreement_document::Model, artisan: Option<ArtisanSummary>) -> Self {
        Self {
            id: m.id,
            artisan_id: m.artisan_id,
            artisan,
            file_url: m.file_url,
            date_signed: m.date_signed,
            valid_until: m.valid_until,
            created_at: m.created_at,
        }
    }
}
