use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use sea_orm::EntityTrait;

use crate::entity::admin_operator::{self, OperatorRole};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{self, TokenKind};

/// Cookie carrying the short-lived access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie carrying the long-lived refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Authenticated operator, resolved from the `accessToken` cookie or an
/// `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The operator row
/// is re-read on every request so role changes and deletions apply immediately.
pub struct AuthOperator {
    pub operator: admin_operator::Model,
}

impl AuthOperator {
    pub fn id(&self) -> uuid::Uuid {
        self.operator.id
    }

    pub fn role(&self) -> OperatorRole {
        self.operator.role
    }

    /// Returns `Ok(())` if the operator has the given role, `Err(PermissionDenied)` otherwise.
    pub fn require_role(&self, role: OperatorRole) -> Result<(), AppError> {
        if self.operator.role == role {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

/// Pull the raw access token out of the request, cookie first.
fn access_token(parts: &Parts) -> Result<String, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE)
        && !cookie.value().is_empty()
    {
        return Ok(cookie.value().to_string());
    }

    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::TokenMissing)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or(AppError::TokenInvalid)
}

impl<S> FromRequestParts<S> for AuthOperator
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = access_token(parts)?;

        let claims = jwt::verify(&token, TokenKind::Access, &state.config.auth.access_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        let operator = admin_operator::Entity::find_by_id(claims.sub)
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthOperator { operator })
    }
}
