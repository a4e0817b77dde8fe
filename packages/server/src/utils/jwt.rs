use anyhow::{Context, Result, bail};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::admin_operator::OperatorRole;

/// Which of the two token families a JWT belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Operator ID
    pub email: String,
    pub role: OperatorRole,
    pub kind: TokenKind,
    pub jti: Uuid,  // Makes every issued token distinct
    pub exp: usize, // Expiration timestamp
}

/// Sign a token of the given kind, valid for `ttl`.
pub fn sign(
    operator_id: Uuid,
    email: &str,
    role: OperatorRole,
    kind: TokenKind,
    ttl: Duration,
    secret: &str,
) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .context("token expiry out of range")?
        .timestamp();

    let claims = Claims {
        sub: operator_id,
        email: email.to_owned(),
        role,
        kind,
        jti: Uuid::new_v4(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify and decode a token, rejecting tokens of the wrong kind.
pub fn verify(token: &str, kind: TokenKind, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    if token_data.claims.kind != kind {
        bail!("expected a {:?} token", kind);
    }
    Ok(token_data.claims)
}
