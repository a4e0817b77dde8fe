use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::StoredBlob;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use super::artisan::find_artisan;
use super::fetch_page;
use crate::entity::{agreement_document, artisan};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthOperator;
use crate::extractors::input::AppQuery;
use crate::joins::{ArtisanSummary, artisans_by_id};
use crate::models::agreement::*;
use crate::models::shared::{ApiResponse, Page, page_params, parse_id};
use crate::services::media::{AGREEMENT_FOLDER, MediaService};
use crate::state::AppState;
use crate::utils::upload::{DOCUMENT_TYPES, StagedFile};

#[utoipa::path(
    post,
    path = "/",
    tag = "Agreements",
    operation_id = "createAgreement",
    summary = "Upload a signed agreement",
    description = "Multipart form with `artisan_id`, `date_signed`, optional `valid_until` and a `document` file (PDF, JPEG or PNG). The file is stored only after the fields validate.",
    request_body(content_type = "multipart/form-data", content = CreateAgreementForm),
    responses(
        (status = 201, description = "Agreement stored", body = ApiResponse<AgreementResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Artisan not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, multipart))]
pub async fn create_agreement(
    _auth: AuthOperator,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (fields, staged) = read_agreement_form(&state.media, multipart).await?;

    let Some(staged) = staged else {
        return Err(AppError::Validation("Missing 'document' file field".into()));
    };

    let checked = async {
        let agreement = validate_agreement_fields(fields)?;
        find_artisan(&state.db, agreement.artisan_id).await?;
        Ok::<_, AppError>(agreement)
    }
    .await;
    let agreement = match checked {
        Ok(agreement) => agreement,
        Err(e) => {
            staged.discard().await;
            return Err(e);
        }
    };

    let stored = state.media.upload(staged, AGREEMENT_FOLDER).await?;
    match insert_agreement(&state.db, agreement, &stored).await {
        Ok((model, owner)) => Ok((
            StatusCode::CREATED,
            Json(ApiResponse::new(
                "Agreement uploaded successfully",
                AgreementResponse::new(model, Some(owner)),
            )),
        )),
        Err(e) => {
            state.media.discard(Some(&stored.blob_id)).await;
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Agreements",
    operation_id = "listAgreements",
    summary = "List agreement documents",
    params(AgreementListQuery),
    responses(
        (status = 200, description = "Page of agreements", body = ApiResponse<Page<AgreementResponse>>),
        (status = 400, description = "Malformed filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth, query))]
pub async fn list_agreements(
    _auth: AuthOperator,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AgreementListQuery>,
) -> Result<Json<ApiResponse<Page<AgreementResponse>>>, AppError> {
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = agreement_document::Entity::find();
    if let Some(ref artisan_id) = query.artisan_id {
        select = select
            .filter(agreement_document::Column::ArtisanId.eq(parse_id(artisan_id, "artisan")?));
    }
    let select = select.order_by_desc(agreement_document::Column::CreatedAt);

    let (rows, pagination) = fetch_page(&state.db, select, page, per_page).await?;
    let artisans = artisans_by_id(&state.db, rows.iter().map(|a| a.artisan_id)).await?;

    let items = rows
        .into_iter()
        .map(|a| {
            let owner = artisans.get(&a.artisan_id).cloned();
            AgreementResponse::new(a, owner)
        })
        .collect();
    Ok(Json(ApiResponse::new(
        "Agreements fetched successfully",
        Page { items, pagination },
    )))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Agreements",
    operation_id = "getAgreement",
    summary = "Get an agreement document",
    params(("id" = String, Path, description = "Agreement ID")),
    responses(
        (status = 200, description = "Agreement details", body = ApiResponse<AgreementResponse>),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Agreement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn get_agreement(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AgreementResponse>>, AppError> {
    let id = parse_id(&id, "agreement")?;
    let model = agreement_document::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Agreement not found".into()))?;
    let owner = artisans_by_id(&state.db, [model.artisan_id])
        .await?
        .remove(&model.artisan_id);
    Ok(Json(ApiResponse::new(
        "Agreement fetched successfully",
        AgreementResponse::new(model, owner),
    )))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Agreements",
    operation_id = "deleteAgreement",
    summary = "Delete an agreement document",
    description = "The stored file is deleted after the record is gone; a storage failure does not fail the request.",
    params(("id" = String, Path, description = "Agreement ID")),
    responses(
        (status = 204, description = "Agreement deleted"),
        (status = 400, description = "Malformed ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Agreement not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn delete_agreement(
    _auth: AuthOperator,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id, "agreement")?;

    let txn = state.db.begin().await?;
    let existing = agreement_document::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Agreement not found".into()))?;
    agreement_document::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    state.media.discard(Some(&existing.blob_id)).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Collect the text fields and stage the `document` file, in whatever order they arrive.
async fn read_agreement_form(
    media: &MediaService,
    mut multipart: Multipart,
) -> Result<(AgreementFields, Option<StagedFile>), AppError> {
    let mut fields = AgreementFields::default();
    let mut staged: Option<StagedFile> = None;

    let result = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("document") => {
                    if staged.is_some() {
                        return Err(AppError::Validation(
                            "Only one 'document' file may be uploaded".into(),
                        ));
                    }
                    staged = Some(media.stage(field, DOCUMENT_TYPES).await?);
                }
                Some(key @ ("artisan_id" | "date_signed" | "valid_until")) => {
                    let text = field.text().await.map_err(|e| {
                        AppError::Validation(format!("Failed to read '{key}': {e}"))
                    })?;
                    match key {
                        "artisan_id" => fields.artisan_id = Some(text),
                        "date_signed" => fields.date_signed = Some(text),
                        _ => fields.valid_until = Some(text),
                    }
                }
                _ => {}
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    match result {
        Ok(()) => Ok((fields, staged)),
        Err(e) => {
            if let Some(staged) = staged {
                staged.discard().await;
            }
            Err(e)
        }
    }
}

async fn insert_agreement(
    db: &DatabaseConnection,
    agreement: NewAgreement,
    stored: &StoredBlob,
) -> Result<(agreement_document::Model, ArtisanSummary), AppError> {
    let txn = db.begin().await?;
    let owner = artisan::Entity::find_by_id(agreement.artisan_id)
        .lock(LockType::Share)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Artisan not found".into()))?;

    let model = agreement_document::ActiveModel {
        id: Set(Uuid::now_v7()),
        artisan_id: Set(agreement.artisan_id),
        file_url: Set(stored.url.clone()),
        blob_id: Set(stored.blob_id.clone()),
        date_signed: Set(agreement.date_signed),
        valid_until: Set(agreement.valid_until),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((
        model,
        ArtisanSummary {
            id: owner.id,
            name: owner.name,
        },
    ))
}
