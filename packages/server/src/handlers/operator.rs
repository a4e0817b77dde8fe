use axum::Json;
use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use super::{fetch_page, stage_named_file};
use crate::config::AuthConfig;
use crate::entity::admin_operator::{self, DEFAULT_ROLE, OperatorRole};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{ACCESS_COOKIE, AuthOperator, REFRESH_COOKIE};
use crate::extractors::input::{AppJson, AppQuery};
use crate::models::operator::*;
use crate::models::shared::{ApiResponse, Page, page_params};
use crate::services::media::AVATAR_FOLDER;
use crate::state::AppState;
use crate::utils::upload::IMAGE_TYPES;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Operators",
    operation_id = "registerOperator",
    summary = "Register a back-office operator",
    description = "New operators get the `PortalOperator` role.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Operator registered", body = ApiResponse<OperatorResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let now = chrono::Utc::now();
    let operator = admin_operator::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(payload.name.trim().to_string()),
        email: Set(normalize_email(&payload.email)),
        contact_number: Set(payload.contact_number.trim().to_string()),
        avatar_url: Set(None),
        avatar_blob_id: Set(None),
        role: Set(DEFAULT_ROLE),
        password: Set(hash),
        refresh_token_digest: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await
    .map_err(email_conflict)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "Operator registered successfully",
            OperatorResponse::from(operator),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Operators",
    operation_id = "loginOperator",
    summary = "Log in",
    description = "Issues an access and a refresh token, both also set as http-only cookies (`accessToken`, `refreshToken`).",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_login_request(&payload)?;

    let operator = admin_operator::Entity::find()
        .filter(admin_operator::Column::Email.eq(normalize_email(&payload.email)))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &operator.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let (access_token, refresh_token) = issue_tokens(&operator, &state.config.auth)?;

    let mut active: admin_operator::ActiveModel = operator.into();
    active.refresh_token_digest = Set(Some(hash::token_digest(&refresh_token)));
    let operator = active.update(&state.db).await?;

    let jar = set_auth_cookies(jar, &access_token, &refresh_token, &state.config.auth);
    Ok((
        jar,
        Json(ApiResponse::new(
            "Logged in successfully",
            LoginResponse {
                operator: operator.into(),
                access_token,
                refresh_token,
            },
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Operators",
    operation_id = "logoutOperator",
    summary = "Log out",
    description = "Invalidates the stored refresh token and clears the auth cookies.",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, jar), fields(operator_id = %auth.id()))]
pub async fn logout(
    auth: AuthOperator,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    admin_operator::Entity::update_many()
        .col_expr(
            admin_operator::Column::RefreshTokenDigest,
            Expr::value(Option::<String>::None),
        )
        .filter(admin_operator::Column::Id.eq(auth.id()))
        .exec(&state.db)
        .await?;

    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[utoipa::path(
    post,
    path = "/refresh-token",
    tag = "Operators",
    operation_id = "refreshToken",
    summary = "Rotate the token pair",
    description = "Takes the refresh token from the `refreshToken` cookie or the request body. The presented token is invalidated; a new pair is issued.",
    request_body(content = Option<RefreshRequest>, description = "Optional when the cookie is present"),
    responses(
        (status = 200, description = "Tokens rotated", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing, invalid or reused refresh token (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, body))]
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::Validation(e.to_string()))?
    };

    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or(request.refresh_token)
        .ok_or(AppError::TokenMissing)?;

    let claims = jwt::verify(
        &presented,
        jwt::TokenKind::Refresh,
        &state.config.auth.refresh_secret,
    )
    .map_err(|_| AppError::TokenInvalid)?;

    let txn = state.db.begin().await?;
    let operator = admin_operator::Entity::find_by_id(claims.sub)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let digest = hash::token_digest(&presented);
    if operator.refresh_token_digest.as_deref() != Some(digest.as_str()) {
        tracing::warn!(operator_id = %operator.id, "Refresh token does not match stored digest");
        return Err(AppError::TokenInvalid);
    }

    let (access_token, refresh_token) = issue_tokens(&operator, &state.config.auth)?;
    let mut active: admin_operator::ActiveModel = operator.into();
    active.refresh_token_digest = Set(Some(hash::token_digest(&refresh_token)));
    let operator = active.update(&txn).await?;
    txn.commit().await?;

    let jar = set_auth_cookies(jar, &access_token, &refresh_token, &state.config.auth);
    Ok((
        jar,
        Json(ApiResponse::new(
            "Tokens refreshed successfully",
            LoginResponse {
                operator: operator.into(),
                access_token,
                refresh_token,
            },
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Operators",
    operation_id = "getCurrentOperator",
    summary = "Get the logged-in operator",
    responses(
        (status = 200, description = "Current operator", body = ApiResponse<OperatorResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth), fields(operator_id = %auth.id()))]
pub async fn me(auth: AuthOperator) -> Json<ApiResponse<OperatorResponse>> {
    Json(ApiResponse::new(
        "Operator fetched successfully",
        auth.operator.into(),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Operators",
    operation_id = "listOperators",
    summary = "List operators",
    description = "Requires the `Admin` role.",
    params(OperatorListQuery),
    responses(
        (status = 200, description = "Page of operators", body = ApiResponse<Page<OperatorResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, query), fields(operator_id = %auth.id()))]
pub async fn list_operators(
    auth: AuthOperator,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<OperatorListQuery>,
) -> Result<Json<ApiResponse<Page<OperatorResponse>>>, AppError> {
    auth.require_role(OperatorRole::Admin)?;
    let (page, per_page) = page_params(query.page, query.per_page);

    let mut select = admin_operator::Entity::find();
    if let Some(role) = query.role {
        select = select.filter(admin_operator::Column::Role.eq(role));
    }
    let select = select.order_by_asc(admin_operator::Column::CreatedAt);

    let (rows, pagination) = fetch_page(&state.db, select, page, per_page).await?;
    Ok(Json(ApiResponse::new(
        "Operators fetched successfully",
        Page {
            items: rows.into_iter().map(OperatorResponse::from).collect(),
            pagination,
        },
    )))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Operators",
    operation_id = "updateCurrentOperator",
    summary = "Update the logged-in operator's account details",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<OperatorResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email already registered (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, payload), fields(operator_id = %auth.id()))]
pub async fn update_account(
    auth: AuthOperator,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<OperatorResponse>>, AppError> {
    validate_update_account(&payload)?;
    if payload == UpdateAccountRequest::default() {
        return Ok(Json(ApiResponse::new(
            "Account unchanged",
            auth.operator.into(),
        )));
    }

    let mut active: admin_operator::ActiveModel = auth.operator.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(email) = payload.email {
        active.email = Set(normalize_email(&email));
    }
    if let Some(contact) = payload.contact_number {
        active.contact_number = Set(contact.trim().to_string());
    }
    active.updated_at = Set(chrono::Utc::now());
    let operator = active.update(&state.db).await.map_err(email_conflict)?;

    Ok(Json(ApiResponse::new(
        "Account updated successfully",
        operator.into(),
    )))
}

#[utoipa::path(
    patch,
    path = "/me/avatar",
    tag = "Operators",
    operation_id = "updateCurrentOperatorAvatar",
    summary = "Replace the logged-in operator's avatar",
    request_body(content_type = "multipart/form-data", description = "`avatar` image file"),
    responses(
        (status = 200, description = "Avatar replaced", body = ApiResponse<OperatorResponse>),
        (status = 400, description = "Missing or unsupported file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth, multipart), fields(operator_id = %auth.id()))]
pub async fn update_avatar(
    auth: AuthOperator,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<OperatorResponse>>, AppError> {
    let staged = stage_named_file(&state.media, &mut multipart, "avatar", IMAGE_TYPES).await?;
    let stored = state.media.upload(staged, AVATAR_FOLDER).await?;

    let swap = async {
        let txn = state.db.begin().await?;
        let existing = admin_operator::Entity::find_by_id(auth.id())
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::TokenInvalid)?;
        let previous_blob = existing.avatar_blob_id.clone();

        let mut active: admin_operator::ActiveModel = existing.into();
        active.avatar_url = Set(Some(stored.url.clone()));
        active.avatar_blob_id = Set(Some(stored.blob_id.clone()));
        active.updated_at = Set(chrono::Utc::now());
        let operator = active.update(&txn).await?;
        txn.commit().await?;
        Ok::<_, AppError>((operator, previous_blob))
    }
    .await;

    match swap {
        Ok((operator, previous_blob)) => {
            state.media.discard(previous_blob.as_deref()).await;
            Ok(Json(ApiResponse::new(
                "Avatar updated successfully",
                operator.into(),
            )))
        }
        Err(e) => {
            state.media.discard(Some(&stored.blob_id)).await;
            Err(e)
        }
    }
}

fn issue_tokens(
    operator: &admin_operator::Model,
    auth: &AuthConfig,
) -> Result<(String, String), AppError> {
    let access = jwt::sign(
        operator.id,
        &operator.email,
        operator.role,
        jwt::TokenKind::Access,
        chrono::Duration::minutes(auth.access_ttl_minutes),
        &auth.access_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;
    let refresh = jwt::sign(
        operator.id,
        &operator.email,
        operator.role,
        jwt::TokenKind::Refresh,
        chrono::Duration::days(auth.refresh_ttl_days),
        &auth.refresh_secret,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;
    Ok((access, refresh))
}

fn token_cookie(
    name: &'static str,
    value: &str,
    max_age: time::Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

fn set_auth_cookies(jar: CookieJar, access: &str, refresh: &str, auth: &AuthConfig) -> CookieJar {
    jar.add(token_cookie(
        ACCESS_COOKIE,
        access,
        time::Duration::minutes(auth.access_ttl_minutes),
        auth.secure_cookies,
    ))
    .add(token_cookie(
        REFRESH_COOKIE,
        refresh,
        time::Duration::days(auth.refresh_ttl_days),
        auth.secure_cookies,
    ))
}

fn email_conflict(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Email uniqueness caught on write");
            AppError::Conflict("An operator with this email already exists".into())
        }
        _ => AppError::from(e),
    }
}
