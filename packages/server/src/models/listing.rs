use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{double_option, validate_text};
use crate::entity::platform_listing::{self, ListingStatus};
use crate::error::AppError;
use crate::joins::ItemSummary;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateListingRequest {
    pub item_id: String,
    #[schema(example = "Amazon Karigar")]
    pub platform_name: String,
    #[schema(example = "https://www.amazon.in/karigar/item/123")]
    pub listing_url: Option<String>,
    /// Defaults to `Active`.
    pub status: Option<ListingStatus>,
}

pub fn validate_create_listing(payload: &CreateListingRequest) -> Result<(), AppError> {
    validate_text(&payload.platform_name, "Platform name", 128)?;
    if let Some(ref url) = payload.listing_url {
        validate_listing_url(url)?;
    }
    Ok(())
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateListingRequest {
    pub platform_name: Option<String>,
    /// `null` clears the URL.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub listing_url: Option<Option<String>>,
    pub status: Option<ListingStatus>,
}

pub fn validate_update_listing(payload: &UpdateListingRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.platform_name {
        validate_text(name, "Platform name", 128)?;
    }
    if let Some(Some(ref url)) = payload.listing_url {
        validate_listing_url(url)?;
    }
    Ok(())
}

impl UpdateListingRequest {
    pub fn apply_to(self, active: &mut platform_listing::ActiveModel) {
        if let Some(name) = self.platform_name {
            active.platform_name = Set(name.trim().to_string());
        }
        if let Some(url) = self.listing_url {
            active.listing_url = Set(url.map(|u| u.trim().to_string()));
        }
        if let Some(status) = self.status {
            active.status = Set(status);
        }
    }
}

/// Absolute http(s) URL with a non-empty host and no whitespace.
pub fn validate_listing_url(url: &str) -> Result<(), AppError> {
    let url = url.trim();
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or_else(|| {
            AppError::Validation("Listing URL must start with http:// or https://".into())
        })?;
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || url.chars().any(char::is_whitespace) || url.len() > 2048 {
        return Err(AppError::Validation("Listing URL is not a valid URL".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub item_id: Option<String>,
    pub status: Option<ListingStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ListingResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item: Option<ItemSummary>,
    pub platform_name: String,
    pub listing_url: Option<String>,
    pub status: ListingStatus,
    pub listed_at: DateTime<Utc>,
}

impl ListingResponse {
    pub fn new(m: platform_listing::Model, item: Option<ItemSummary>) -> Self {
        Self {
            id: m.id,
            item_id: m.item_id,
            item,
            platform_name: m.platform_name,
            listing_url: m.listing_url,
            status: m.status,
            listed_at: m.listed_at,
        }
    }
}
