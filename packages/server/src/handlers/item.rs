use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use super::fetch_page;
use crate::entity::{artisan, handcrafted_item, platform_listing};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthOperator;
use crate::extractors::input::{AppJson, AppQuery};
use crate::joins::{ArtisanSummary, artisans_by_id};
use crate::models::item::*;
use crate::models::shared::{ApiResponse, Page, page_params, parse_id};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Items",
    operation_id = "createItem",
    summary = "Add a handcrafted item to an artisan's catalogue",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ApiResponse<ItemResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Artisan not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, payload), fields(artisan_id = %payload.artisan_id))]
pub async fn create_item(
    _auth: AuthOperator,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateItemRequest>,
) -> Result<impl IntoResponse, AppError> {
    let artisan_id = parse_id(&payload.artisan_id, "artisan")?;
    validate_create_item(&payload)?;

    let txn = state.db.begin().await?;
    // Shared lock: a concurrent cascade delete of the artisan waits for this insert.
    let owner = artisan::Entity::find_by_id(artisan_id)
        .lock(LockType::Share)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Artisan not found".into()))?;

    let now = chrono::Utc::now();
    let model = handcrafted_item::ActiveModel {
        id: Set(Uuid::now_v7()),
        artisan_id: Set(artisan_id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        category: Set(payload.category.trim().to_string()),
        price: Set(payload.price),
        quantity: Set(payload.quantity),
        status: Set(payload
            .status
            .unwrap_or(handcrafted_item::ItemStatus::Available)),
        uploaded_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let summary = ArtisanSummary {
        id: owner.id,
        name: owner.name,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Item created successfully",
            ItemResponse::new(model, Some(summary)),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Items",
    operation_id = "listItems",
    summary = "List items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Page of items", body = ApiResponse<Page<ItemResponse>>),
        (status = 400, description = "Malformed filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_items(
    _auth: AuthOperator,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ItemListQuery>,
) -> Result<Json<ApiResponse<Page<ItemResponse>>>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = handcrafted_item::Entity::find();
    if let Some(ref artisan_id) = query.artisan_id {
        let artisan_id = parse_id(artisan_id, "artisan")?;
        select = select.filter(handcrafted_item::Column::ArtisanId.eq(artisan_id));
    }
    if let Some(status) = query.status {
        select = select.filter(handcrafted_item::Column::Status.eq(status));
    }
    if let Some(ref category) = query.category
        && !category.trim().is_empty()
    {
        select = select.filter(handcrafted_item::Column::Category.eq(category.trim()));
    }
    let select = select.order_by_desc(handcrafted_item::Column::UploadedAt);

    let (rows, pagination) = fetch_page(&state.db, select, page, per_page).await?;
    let artisans = artisans_by_id(&state.db, rows.iter().map(|i| i.artisan_id)).await?;

    let items = rows
        .into_iter()
        .map(|item| {
            let owner = artisans.get(&item.artisan_id).cloned();
            ItemResponse::new(item, owner)
        })
        .collect();
    Ok(Json(ApiResponse::new(
        "Items fetched successfully",
        Page { items, pagination },
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Items",
    operation_id = "getItem",
    summary = "Get an item",
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item details", body = ApiResponse<ItemResponse>),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn get_item(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ItemResponse>>, AppError> {
    let id = parse_id(&id, "item")?;
    let item = find_item(&state.db, id).await?;
    let response = with_owner(&state.db, item).await?;
    Ok(Json(ApiResponse::new("Item fetched successfully", response)))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Items",
    operation_id = "updateItem",
    summary = "Partially update an item",
    description = "Only provided fields change. Editing `quantity` does not change `status`.",
    params(("id" = String, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ApiResponse<ItemResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, payload))]
pub async fn update_item(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateItemRequest>,
) -> Result<Json<ApiResponse<ItemResponse>>, AppError> {
    let id = parse_id(&id, "item")?;
    validate_update_item(&payload)?;

    if payload == UpdateItemRequest::default() {
        let existing = find_item(&state.db, id).await?;
        let response = with_owner(&state.db, existing).await?;
        return Ok(Json(ApiResponse::new("Item unchanged", response)));
    }

    let txn = state.db.begin().await?;
    let existing = find_item_for_update(&txn, id).await?;
    let mut active: handcrafted_item::ActiveModel = existing.into();
    payload.apply_to(&mut active);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;
    txn.commit().await?;

    let response = with_owner(&state.db, model).await?;
    Ok(Json(ApiResponse::new("Item updated successfully", response)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Items",
    operation_id = "deleteItem",
    summary = "Delete an item and its platform listings",
    description = "Sales of the item are kept as history.",
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted", body = ApiResponse<ItemDeletion>),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Item not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn delete_item(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ItemDeletion>>, AppError> {
    let id = parse_id(&id, "item")?;

    let txn = state.db.begin().await?;
    find_item_for_update(&txn, id).await?;
    let listings_removed = platform_listing::Entity::delete_many()
        .filter(platform_listing::Column::ItemId.eq(id))
        .exec(&txn)
        .await?
        .rows_affected;
    handcrafted_item::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        "Item deleted successfully",
        ItemDeletion {
            id,
            listings_removed,
        },
    )))
}

async fn with_owner(
    db: &DatabaseConnection,
    item: handcrafted_item::Model,
) -> Result<ItemResponse, AppError> {
    let owner = artisans_by_id(db, [item.artisan_id])
        .await?
        .remove(&item.artisan_id);
    Ok(ItemResponse::new(item, owner))
}

pub(crate) async fn find_item<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<handcrafted_item::Model, AppError> {
    handcrafted_item::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))
}

async fn find_item_for_update(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> Result<handcrafted_item::Model, AppError> {
    handcrafted_item::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".into()))
}
