use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::Deserialize;
use tracing::debug;

use crate::auth::jwt::verify_access_token;
use crate::error::AppError;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

/// Identity used when anonymous access is allowed and no `?id=` is given.
pub const GUEST_ID: &str = "guest";

#[derive(Debug, Default, Deserialize)]
struct IdentityQuery {
    token: Option<String>,
    id: Option<String>,
}

/// Player identity resolved before the socket upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity(pub String);

impl PlayerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `?token=` wins; otherwise `?id=` or `guest` when anonymous access is allowed.
    pub fn resolve(query_string: &str, security: &SecurityConfig) -> Result<Self, AppError> {
        let query = web::Query::<IdentityQuery>::from_query(query_string)
            .map(web::Query::into_inner)
            .map_err(|_| AppError::bad_request("INVALID_QUERY", "malformed query string"))?;

        if let Some(token) = query.token.filter(|t| !t.is_empty()) {
            let claims = verify_access_token(&token, security)?;
            return Ok(Self(claims.sub));
        }

        if !security.allow_anonymous {
            return Err(AppError::unauthorized("missing token"));
        }

        let id = query
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| GUEST_ID.to_string());
        Ok(Self(id))
    }
}

impl FromRequest for PlayerIdentity {
    type Error = AppError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| AppError::internal("AppState not available"))
            .and_then(|state| Self::resolve(req.query_string(), &state.security));

        if let Err(err) = &result {
            debug!(error = %err, "[AUTH] identity rejected");
        }
        std::future::ready(result)
    }
}
