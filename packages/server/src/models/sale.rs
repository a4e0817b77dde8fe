use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::{parse_id, validate_amount, validate_text};
use crate::entity::sale;
use crate::error::AppError;
use crate::joins::{ArtisanSummary, ItemSummary};

/// Request body for recording a sale.
///
/// Every field is optional at the wire level so a missing field surfaces as a
/// validation error rather than a JSON rejection.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CreateSaleRequest {
    #[schema(example = "01936f0e-1234-7abc-8000-000000000002")]
    pub item_id: Option<String>,
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub artisan_id: Option<String>,
    #[schema(example = "Etsy")]
    pub platform_name: Option<String>,
    #[schema(example = 2)]
    pub quantity_sold: Option<i64>,
    #[schema(example = 2998.0)]
    pub total_revenue: Option<f64>,
    /// Defaults to the time of recording.
    pub sale_date: Option<DateTime<Utc>>,
}

/// A validated sale, ready for the stock adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub item_id: Uuid,
    pub artisan_id: Uuid,
    pub platform_name: String,
    pub quantity_sold: i32,
    pub total_revenue: f64,
    pub sold_at: DateTime<Utc>,
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

pub fn validate_create_sale(payload: CreateSaleRequest) -> Result<NewSale, AppError> {
    let item_id = parse_id(&required(payload.item_id, "item_id")?, "item")?;
    let artisan_id = parse_id(&required(payload.artisan_id, "artisan_id")?, "artisan")?;

    let platform_name = required(payload.platform_name, "platform_name")?;
    validate_text(&platform_name, "Platform name", 128)?;

    let quantity_sold = required(payload.quantity_sold, "quantity_sold")?;
    if quantity_sold < 1 {
        return Err(AppError::Validation("Quantity sold must be at least 1".into()));
    }
    let quantity_sold = i32::try_from(quantity_sold)
        .map_err(|_| AppError::Validation("Quantity sold is too large".into()))?;

    let total_revenue = required(payload.total_revenue, "total_revenue")?;
    validate_amount(total_revenue, "Total revenue")?;

    Ok(NewSale {
        item_id,
        artisan_id,
        platform_name: platform_name.trim().to_string(),
        quantity_sold,
        total_revenue,
        sold_at: payload.sale_date.unwrap_or_else(Utc::now),
    })
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SaleListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub artisan_id: Option<String>,
    pub item_id: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SaleResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item: Option<ItemSummary>,
    pub artisan_id: Uuid,
    pub artisan: Option<ArtisanSummary>,
    pub platform_name: String,
    pub quantity_sold: i32,
    pub total_revenue: f64,
    pub sale_date: DateTime<Utc>,
}

impl SaleResponse {
    pub fn new(
        m: sale::Model,
        item: Option<ItemSummary>,
        artisan: Option<ArtisanSummary>,
    ) -> Self {
        Self {
            id: m.id,
            item_id: m.item_id,
            item,
            artisan_id: m.artisan_id,
            artisan,
            platform_name: m.platform_name,
            quantity_sold: m.quantity_sold,
            total_revenue: m.total_revenue,
            sale_date: m.sold_at,
        }
    }
}
