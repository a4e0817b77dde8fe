use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{validate_amount, validate_text};
use crate::entity::handcrafted_item::{self, ItemStatus};
use crate::error::AppError;
use crate::joins::ArtisanSummary;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateItemRequest {
    /// Owning artisan.
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub artisan_id: String,
    #[schema(example = "Blue pottery vase")]
    pub name: String,
    #[schema(example = "Hand-painted Jaipur blue pottery, 30cm")]
    pub description: String,
    #[schema(example = "Pottery")]
    pub category: String,
    #[schema(example = 1499.0)]
    pub price: f64,
    #[schema(example = 10)]
    pub quantity: i32,
    /// Defaults to `Available`.
    pub status: Option<ItemStatus>,
}

pub fn validate_create_item(payload: &CreateItemRequest) -> Result<(), AppError> {
    validate_text(&payload.name, "Name", 200)?;
    validate_text(&payload.description, "Description", 5000)?;
    validate_text(&payload.category, "Category", 64)?;
    validate_amount(payload.price, "Price")?;
    validate_quantity(payload.quantity)?;
    Ok(())
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i32>,
    pub status: Option<ItemStatus>,
}

pub fn validate_update_item(payload: &UpdateItemRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_text(name, "Name", 200)?;
    }
    if let Some(ref description) = payload.description {
        validate_text(description, "Description", 5000)?;
    }
    if let Some(ref category) = payload.category {
        validate_text(category, "Category", 64)?;
    }
    if let Some(price) = payload.price {
        validate_amount(price, "Price")?;
    }
    if let Some(quantity) = payload.quantity {
        validate_quantity(quantity)?;
    }
    Ok(())
}

impl UpdateItemRequest {
    /// Copy the present fields onto `active`.
    ///
    /// Manual edits do not re-derive `status` from `quantity`.
    pub fn apply_to(self, active: &mut handcrafted_item::ActiveModel) {
        if let Some(name) = self.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = self.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(category) = self.category {
            active.category = Set(category.trim().to_string());
        }
        if let Some(price) = self.price {
            active.price = Set(price);
        }
        if let Some(quantity) = self.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(status) = self.status {
            active.status = Set(status);
        }
    }
}

fn validate_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity < 0 {
        return Err(AppError::Validation("Quantity must be >= 0".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub artisan_id: Option<String>,
    pub status: Option<ItemStatus>,
    pub category: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub artisan_id: Uuid,
    /// Owning artisan, when it still exists.
    pub artisan: Option<ArtisanSummary>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub quantity: i32,
    pub status: ItemStatus,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemResponse {
    pub fn new(m: handcrafted_item::Model, artisan: Option<ArtisanSummary>) -> Self {
        Self {
            id: m.id,
            artisan_id: m.artisan_id,
            artisan,
            name: m.name,
            description: m.description,
            category: m.category,
            price: m.price,
            quantity: m.quantity,
            status: m.status,
            uploaded_at: m.uploaded_at,
            updated_at: m.updated_at,
        }
    }
}

/// Result of deleting an item together with its platform listings.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ItemDeletion {
    pub id: Uuid,
    pub listings_removed: u64,
}
