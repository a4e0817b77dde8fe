use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use super::fetch_page;
use crate::entity::{handcrafted_item, platform_listing};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthOperator;
use crate::extractors::input::{AppJson, AppQuery};
use crate::joins::{ItemSummary, items_by_id};
use crate::models::listing::*;
use crate::models::shared::{ApiResponse, Page, page_params, parse_id};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Listings",
    operation_id = "createListing",
    summary = "List an item on a sales platform",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Listing created", body = ApiResponse<ListingResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, payload), fields(item_id = %payload.item_id))]
pub async fn create_listing(
    _auth: AuthOperator,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateListingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = parse_id(&payload.item_id, "item")?;
    validate_create_listing(&payload)?;

    let txn = state.db.begin().await?;
    let item = handcrafted_item::Entity::find_by_id(item_id)
        .lock(LockType::Share)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))?;

    let model = platform_listing::ActiveModel {
        id: Set(Uuid::now_v7()),
        item_id: Set(item_id),
        platform_name: Set(payload.platform_name.trim().to_string()),
        listing_url: Set(payload.listing_url.map(|u| u.trim().to_string())),
        status: Set(payload
            .status
            .unwrap_or(platform_listing::ListingStatus::Active)),
        listed_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let summary = ItemSummary {
        id: item.id,
        name: item.name,
        category: item.category,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Listing created successfully",
            ListingResponse::new(model, Some(summary)),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Listings",
    operation_id = "listListings",
    summary = "List platform listings",
    params(ListingListQuery),
    responses(
        (status = 200, description = "Page of listings", body = ApiResponse<Page<ListingResponse>>),
        (status = 400, description = "Malformed filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_listings(
    _auth: AuthOperator,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListingListQuery>,
) -> Result<Json<ApiResponse<Page<ListingResponse>>>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = platform_listing::Entity::find();
    if let Some(ref item_id) = query.item_id {
        select = select.filter(platform_listing::Column::ItemId.eq(parse_id(item_id, "item")?));
    }
    if let Some(status) = query.status {
        select = select.filter(platform_listing::Column::Status.eq(status));
    }
    let select = select.order_by_desc(platform_listing::Column::ListedAt);

    let (rows, pagination) = fetch_page(&state.db, select, page, per_page).await?;
    let items = items_by_id(&state.db, rows.iter().map(|l| l.item_id)).await?;

    let listings = rows
        .into_iter()
        .map(|l| {
            let item = items.get(&l.item_id).cloned();
            ListingResponse::new(l, item)
        })
        .collect();
    Ok(Json(ApiResponse::new(
        "Listings fetched successfully",
        Page {
            items: listings,
            pagination,
        },
    )))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Listings",
    operation_id = "updateListing",
    summary = "Partially update a listing",
    description = "Only provided fields change. `listing_url: null` clears the URL.",
    params(("id" = String, Path, description = "Listing ID")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Listing updated", body = ApiResponse<ListingResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, payload))]
pub async fn update_listing(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateListingRequest>,
) -> Result<Json<ApiResponse<ListingResponse>>, AppError> {
    let id = parse_id(&id, "listing")?;
    validate_update_listing(&payload)?;

    let txn = state.db.begin().await?;
    let existing = platform_listing::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".into()))?;

    let model = if payload == UpdateListingRequest::default() {
        existing
    } else {
        let mut active: platform_listing::ActiveModel = existing.into();
        payload.apply_to(&mut active);
        active.update(&txn).await?
    };
    txn.commit().await?;

    let item = items_by_id(&state.db, [model.item_id])
        .await?
        .remove(&model.item_id);
    Ok(Json(ApiResponse::new(
        "Listing updated successfully",
        ListingResponse::new(model, item),
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Listings",
    operation_id = "deleteListing",
    summary = "Delete a listing",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Listing not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn delete_listing(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "listing")?;
    let result = platform_listing::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Listing not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
