use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use super::fetch_page;
use crate::entity::admin_operator::OperatorRole;
use crate::entity::sale;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthOperator;
use crate::extractors::input::{AppJson, AppQuery};
use crate::joins::{artisans_by_id, items_by_id};
use crate::models::sale::*;
use crate::models::shared::{ApiResponse, Page, page_params, parse_id};
use crate::services::sale::{SaleRevocation, record_sale, revoke_sale};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Sales",
    operation_id = "createSale",
    summary = "Record a sale",
    description = "Draws the item's stock down by `quantity_sold` in the same transaction. The item is marked `Sold` when its quantity reaches zero.",
    request_body = CreateSaleRequest,
    responses(
        (status = 201, description = "Sale recorded", body = ApiResponse<SaleResponse>),
        (status = 400, description = "Validation error or insufficient stock (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Stock changed concurrently (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, payload), fields(operator_id = %auth.id()))]
pub async fn create_sale(
    auth: AuthOperator,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSaleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new_sale = validate_create_sale(payload)?;
    let model = record_sale(&state.db, new_sale).await?;
    let response = with_references(&state.db, model).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Sale recorded successfully", response)),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Sales",
    operation_id = "listSales",
    summary = "List sales",
    description = "Most recent first. Each sale carries the item and artisan it refers to, when they still exist.",
    params(SaleListQuery),
    responses(
        (status = 200, description = "Page of sales", body = ApiResponse<Page<SaleResponse>>),
        (status = 400, description = "Malformed filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_sales(
    _auth: AuthOperator,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SaleListQuery>,
) -> Result<Json<ApiResponse<Page<SaleResponse>>>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = sale::Entity::find();
    if let Some(ref artisan_id) = query.artisan_id {
        select = select.filter(sale::Column::ArtisanId.eq(parse_id(artisan_id, "artisan")?));
    }
    if let Some(ref item_id) = query.item_id {
        select = select.filter(sale::Column::ItemId.eq(parse_id(item_id, "item")?));
    }
    let select = select
        .order_by_desc(sale::Column::SoldAt)
        .order_by_desc(sale::Column::Id);

    let (rows, pagination) = fetch_page(&state.db, select, page, per_page).await?;
    let items = items_by_id(&state.db, rows.iter().map(|s| s.item_id)).await?;
    let artisans = artisans_by_id(&state.db, rows.iter().map(|s| s.artisan_id)).await?;

    let sales = rows
        .into_iter()
        .map(|s| {
            let item = items.get(&s.item_id).cloned();
            let artisan = artisans.get(&s.artisan_id).cloned();
            SaleResponse::new(s, item, artisan)
        })
        .collect();
    Ok(Json(ApiResponse::new(
        "Sales fetched successfully",
        Page {
            items: sales,
            pagination,
        },
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Sales",
    operation_id = "getSale",
    summary = "Get a sale",
    params(("id" = String, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale details", body = ApiResponse<SaleResponse>),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Sale not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn get_sale(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SaleResponse>>, AppError> {
    let id = parse_id(&id, "sale")?;
    let model = sale::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale not found".into()))?;
    let response = with_references(&state.db, model).await?;
    Ok(Json(ApiResponse::new("Sale fetched successfully", response)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Sales",
    operation_id = "deleteSale",
    summary = "Delete a sale and restore the item's stock",
    description = "Adds `quantity_sold` back to the item. A `Sold` item becomes `Available`; a `Draft` item stays a draft. Requires the `Admin` role.",
    params(("id" = String, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale deleted", body = ApiResponse<SaleRevocation>),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Sale not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Restored stock would overflow (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(operator_id = %auth.id()))]
pub async fn delete_sale(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SaleRevocation>>, AppError> {
    auth.require_role(OperatorRole::Admin)?;
    let id = parse_id(&id, "sale")?;
    let revocation = revoke_sale(&state.db, id).await?;
    Ok(Json(ApiResponse::new(
        "Sale deleted successfully",
        revocation,
    )))
}

async fn with_references(
    db: &DatabaseConnection,
    model: sale::Model,
) -> Result<SaleResponse, AppError> {
    let item = items_by_id(db, [model.item_id]).await?.remove(&model.item_id);
    let artisan = artisans_by_id(db, [model.artisan_id])
        .await?
        .remove(&model.artisan_id);
    Ok(SaleResponse::new(model, item, artisan))
}
