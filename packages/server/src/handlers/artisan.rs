use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use super::{fetch_page, stage_named_file};
use crate::entity::{agreement_document, artisan, handcrafted_item, sale};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthOperator;
use crate::extractors::input::{AppJson, AppQuery};
use crate::models::artisan::*;
use crate::models::shared::{ApiResponse, Page, escape_like, page_params, parse_id};
use crate::services::artisan::{CascadeSummary, delete_artisan_cascade, find_artisan_for_update};
use crate::services::media::AVATAR_FOLDER;
use crate::state::AppState;
use crate::utils::upload::IMAGE_TYPES;

#[utoipa::path(
    post,
    path = "/",
    tag = "Artisans",
    operation_id = "createArtisan",
    summary = "Register an artisan",
    request_body = CreateArtisanRequest,
    responses(
        (status = 201, description = "Artisan created", body = ApiResponse<ArtisanResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "National ID already registered (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, payload), fields(name = %payload.name))]
pub async fn create_artisan(
    _auth: AuthOperator,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateArtisanRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_artisan(&payload)?;

    let now = chrono::Utc::now();
    let model = artisan::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(payload.name.trim().to_string()),
        address: Set(payload.address.trim().to_string()),
        contact_number: Set(payload.contact_number.trim().to_string()),
        national_id: Set(payload.national_id.map(|id| id.trim().to_string())),
        agreement_status: Set(payload
            .agreement_status
            .unwrap_or(artisan::AgreementStatus::Pending)),
        avatar_url: Set(None),
        avatar_blob_id: Set(None),
        registered_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await
    .map_err(national_id_conflict)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Artisan created successfully",
            ArtisanResponse::from(model),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Artisans",
    operation_id = "listArtisans",
    summary = "List artisans",
    description = "Newest first. `search` matches the name case-insensitively.",
    params(ArtisanListQuery),
    responses(
        (status = 200, description = "Page of artisans", body = ApiResponse<Page<ArtisanResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_artisans(
    _auth: AuthOperator,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ArtisanListQuery>,
) -> Result<Json<ApiResponse<Page<ArtisanResponse>>>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = artisan::Entity::find();
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(artisan::Column::Name)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }
    if let Some(status) = query.agreement_status {
        select = select.filter(artisan::Column::AgreementStatus.eq(status));
    }
    let select = select.order_by_desc(artisan::Column::RegisteredAt);

    let (rows, pagination) = fetch_page(&state.db, select, page, per_page).await?;
    Ok(Json(ApiResponse::new(
        "Artisans fetched successfully",
        Page {
            items: rows.into_iter().map(ArtisanResponse::from).collect(),
            pagination,
        },
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Artisans",
    operation_id = "getArtisan",
    summary = "Get an artisan with counts of what it owns",
    params(("id" = String, Path, description = "Artisan ID")),
    responses(
        (status = 200, description = "Artisan details", body = ApiResponse<ArtisanDetailResponse>),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Artisan not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn get_artisan(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ArtisanDetailResponse>>, AppError> {
    let id = parse_id(&id, "artisan")?;
    let model = find_artisan(&state.db, id).await?;

    let item_count = handcrafted_item::Entity::find()
        .filter(handcrafted_item::Column::ArtisanId.eq(id))
        .count(&state.db)
        .await?;
    let agreement_count = agreement_document::Entity::find()
        .filter(agreement_document::Column::ArtisanId.eq(id))
        .count(&state.db)
        .await?;
    let sale_count = sale::Entity::find()
        .filter(sale::Column::ArtisanId.eq(id))
        .count(&state.db)
        .await?;

    Ok(Json(ApiResponse::new(
        "Artisan fetched successfully",
        ArtisanDetailResponse {
            artisan: model.into(),
            item_count,
            agreement_count,
            sale_count,
        },
    )))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Artisans",
    operation_id = "updateArtisan",
    summary = "Partially update an artisan",
    description = "Only provided fields change. `national_id: null` clears it. An empty body returns the artisan unchanged.",
    params(("id" = String, Path, description = "Artisan ID")),
    request_body = UpdateArtisanRequest,
    responses(
        (status = 200, description = "Artisan updated", body = ApiResponse<ArtisanResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Artisan not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "National ID already registered (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, payload))]
pub async fn update_artisan(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateArtisanRequest>,
) -> Result<Json<ApiResponse<ArtisanResponse>>, AppError> {
    let id = parse_id(&id, "artisan")?;
    validate_update_artisan(&payload)?;

    if payload == UpdateArtisanRequest::default() {
        let existing = find_artisan(&state.db, id).await?;
        return Ok(Json(ApiResponse::new("Artisan unchanged", existing.into())));
    }

    let txn = state.db.begin().await?;
    let existing = find_artisan_for_update(&txn, id).await?;
    let mut active: artisan::ActiveModel = existing.into();
    payload.apply_to(&mut active);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await.map_err(national_id_conflict)?;
    txn.commit().await?;

    Ok(Json(ApiResponse::new(
        "Artisan updated successfully",
        model.into(),
    )))
}

#[utoipa::path(
    patch,
    path = "/{id}/avatar",
    tag = "Artisans",
    operation_id = "updateArtisanAvatar",
    summary = "Replace an artisan's avatar",
    description = "Multipart upload with an `avatar` image field (JPEG, PNG or WebP). The previous avatar blob is deleted once the new one is saved.",
    params(("id" = String, Path, description = "Artisan ID")),
    request_body(content_type = "multipart/form-data", description = "`avatar` image file"),
    responses(
        (status = 200, description = "Avatar replaced", body = ApiResponse<ArtisanResponse>),
        (status = 400, description = "Missing or unsupported file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Artisan not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, multipart))]
pub async fn update_artisan_avatar(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ArtisanResponse>>, AppError> {
    let id = parse_id(&id, "artisan")?;
    find_artisan(&state.db, id).await?;

    let staged = stage_named_file(&state.media, &mut multipart, "avatar", IMAGE_TYPES).await?;
    let stored = state.media.upload(staged, AVATAR_FOLDER).await?;

    let result = set_avatar(&state.db, id, Some((stored.url, stored.blob_id.clone()))).await;
    match result {
        Ok((model, previous_blob)) => {
            state.media.discard(previous_blob.as_deref()).await;
            Ok(Json(ApiResponse::new(
                "Avatar updated successfully",
                model.into(),
            )))
        }
        Err(e) => {
            state.media.discard(Some(&stored.blob_id)).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    delete,
    path = "/{id}/avatar",
    tag = "Artisans",
    operation_id = "deleteArtisanAvatar",
    summary = "Remove an artisan's avatar",
    params(("id" = String, Path, description = "Artisan ID")),
    responses(
        (status = 200, description = "Avatar removed", body = ApiResponse<ArtisanResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Artisan not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn delete_artisan_avatar(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ArtisanResponse>>, AppError> {
    let id = parse_id(&id, "artisan")?;
    let (model, previous_blob) = set_avatar(&state.db, id, None).await?;
    state.media.discard(previous_blob.as_deref()).await;

    Ok(Json(ApiResponse::new(
        "Avatar removed successfully",
        model.into(),
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Artisans",
    operation_id = "deleteArtisan",
    summary = "Delete an artisan and everything it owns",
    description = "Removes the artisan with its items, their platform listings, its sales and agreement documents in one transaction. Avatar and agreement blobs are deleted afterwards on a best-effort basis.",
    params(("id" = String, Path, description = "Artisan ID")),
    responses(
        (status = 200, description = "Artisan deleted", body = ApiResponse<CascadeSummary>),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Artisan not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth), fields(operator_id = %auth.id()))]
pub async fn delete_artisan(
    auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CascadeSummary>>, AppError> {
    let id = parse_id(&id, "artisan")?;
    let summary = delete_artisan_cascade(&state.db, &state.media, id).await?;

    Ok(Json(ApiResponse::new(
        "Artisan and related records deleted successfully",
        summary,
    )))
}

/// Swap the avatar columns under a row lock, returning the updated artisan and
/// the blob that was replaced.
async fn set_avatar(
    db: &DatabaseConnection,
    id: Uuid,
    avatar: Option<(String, String)>,
) -> Result<(artisan::Model, Option<String>), AppError> {
    let txn = db.begin().await?;
    let existing = find_artisan_for_update(&txn, id).await?;
    let previous_blob = existing.avatar_blob_id.clone();

    let (url, blob_id) = avatar.unzip();
    let mut active: artisan::ActiveModel = existing.into();
    active.avatar_url = Set(url);
    active.avatar_blob_id = Set(blob_id);
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok((model, previous_blob))
}

pub(crate) async fn find_artisan<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<artisan::Model, AppError> {
    artisan::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Artisan not found".into()))
}

fn national_id_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("An artisan with this national ID already exists".into())
        }
        _ => AppError::from(e),
    }
}
