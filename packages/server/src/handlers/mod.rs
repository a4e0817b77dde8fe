pub mod agreement;
pub mod artisan;
pub mod item;
pub mod listing;
pub mod operator;
pub mod sale;

use axum::extract::{DefaultBodyLimit, Multipart};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QuerySelect, Select};

use crate::error::AppError;
use crate::models::shared::Pagination;
use crate::services::media::MediaService;
use crate::utils::upload::StagedFile;

/// Body limit for multipart routes: the file limit plus room for the other form fields.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let file_limit = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(file_limit.saturating_add(64 * 1024))
}

/// Count the matching rows and fetch one page of them.
pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    page: u64,
    per_page: u64,
) -> Result<(Vec<E::Model>, Pagination), DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let total = select.clone().paginate(db, per_page).num_items().await?;
    let items = select
        .offset(Some(page.saturating_sub(1).saturating_mul(per_page)))
        .limit(Some(per_page))
        .all(db)
        .await?;
    Ok((items, Pagination::new(page, per_page, total)))
}

/// Stage the first file field called `name`, skipping any other fields.
pub(crate) async fn stage_named_file(
    media: &MediaService,
    multipart: &mut Multipart,
    name: &str,
    allowed_types: &[&str],
) -> Result<StagedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some(name) {
            return media.stage(field, allowed_types).await;
        }
    }
    Err(AppError::Validation(format!("Missing '{name}' file field")))
}
