use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Envelope wrapping every successful response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`.
    #[schema(example = true)]
    pub success: bool,
    /// Human-readable summary of what happened.
    #[schema(example = "Artisan created successfully")]
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// A page of results.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Highest page a list endpoint will seek to.
pub const MAX_PAGE: u64 = 1_000_000;

/// Clamp raw paging parameters to `(1 <= page <= MAX_PAGE, 1 <= per_page <= 100)`.
pub fn page_params(page: Option<u64>, per_page: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).clamp(1, MAX_PAGE);
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    (page, per_page)
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Parse a path or body identifier, naming the resource in the error.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::Validation(format!("Invalid {what} ID")))
}

/// Validate a required free-text field (1..=max Unicode characters after trimming).
pub fn validate_text(value: &str, field: &str, max: usize) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Validate a contact number: 7-15 digits, optional leading `+`, spaces and dashes allowed.
pub fn validate_contact_number(value: &str) -> Result<(), AppError> {
    let value = value.trim();
    let digits = value
        .strip_prefix('+')
        .unwrap_or(value)
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect::<String>();
    if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Contact number must contain 7-15 digits".into(),
        ));
    }
    Ok(())
}

/// Validate a monetary amount (finite and non-negative).
pub fn validate_amount(value: f64, field: &str) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}
