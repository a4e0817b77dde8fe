use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{validate_contact_number, validate_text};
use crate::entity::admin_operator::{self, OperatorRole};
use crate::error::AppError;

/// Request body for operator registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ravi Kumar")]
    pub name: String,
    #[schema(example = "ravi@hunarkart.in")]
    pub email: String,
    #[schema(example = "+91 99887 66554")]
    pub contact_number: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_text(&payload.name, "Name", 128)?;
    validate_email(&payload.email)?;
    validate_contact_number(&payload.contact_number)?;
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ravi@hunarkart.in")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.email.trim().is_empty() {
        return Err(AppError::Validation("Email must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Refresh request. The token may instead come from the `refreshToken` cookie.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
}

pub fn validate_update_account(payload: &UpdateAccountRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_text(name, "Name", 128)?;
    }
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref contact) = payload.contact_number {
        validate_contact_number(contact)?;
    }
    Ok(())
}

/// Lower-cased, trimmed form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace, at most 254 characters.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    let email = email.trim();
    let invalid = || AppError::Validation("Email is not a valid address".into());
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OperatorListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub role: Option<OperatorRole>,
}

/// Public view of an operator. Secrets never leave the server.
#[derive(Serialize, utoipa::ToSchema)]
pub struct OperatorResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub avatar_url: Option<String>,
    pub role: OperatorRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<admin_operator::Model> for OperatorResponse {
    fn from(m: admin_operator::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            contact_number: m.contact_number,
            avatar_url: m.avatar_url,
            role: m.role,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Returned by login and refresh. Tokens are also set as http-only cookies.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub operator: OperatorResponse,
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    pub refresh_token: String,
}
