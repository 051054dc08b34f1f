use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::state::security_config::SecurityConfig;
use crate::AppError;

/// Claims carried by a player access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Player identity used for seats and ratings.
    pub sub: String,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

fn secret(security: &SecurityConfig) -> Result<&[u8], AppError> {
    security
        .jwt_secret
        .as_deref()
        .ok_or_else(|| AppError::unauthorized("token validation is not configured"))
}

/// Mint an access token for `sub` valid for `ttl` from `now`.
pub fn mint_access_token(
    sub: &str,
    now: SystemTime,
    ttl: Duration,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let iat = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::internal("Failed to get current time"))?
        .as_secs() as i64;

    let claims = Claims {
        sub: sub.to_string(),
        iat,
        exp: iat + ttl.as_secs() as i64,
    };

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(secret(security)?),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify a token and return its claims. Expiry is enforced.
pub fn verify_access_token(token: &str, security: &SecurityConfig) -> Result<Claims, AppError> {
    let validation = Validation::new(security.algorithm);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret(security)?),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::unauthorized("token expired"),
        ErrorKind::InvalidSignature => AppError::unauthorized("invalid signature"),
        _ => AppError::unauthorized("invalid token"),
    })?;

    if claims.sub.is_empty() {
        return Err(AppError::unauthorized("token has no subject"));
    }
    Ok(claims)
}
