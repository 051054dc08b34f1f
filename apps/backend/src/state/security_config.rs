use jsonwebtoken::Algorithm;

use crate::config::ServerConfig;

/// Token validation settings for the socket upgrade.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// HMAC secret; `None` means tokens cannot be validated.
    pub jwt_secret: Option<Vec<u8>>,
    /// JWT algorithm to use (defaults to HS256)
    pub algorithm: Algorithm,
    /// Accept `?id=` identities (or `guest`) when no token is presented.
    pub allow_anonymous: bool,
}

impl SecurityConfig {
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: Some(jwt_secret.into()),
            algorithm: Algorithm::HS256,
            allow_anonymous: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            jwt_secret: None,
            algorithm: Algorithm::HS256,
            allow_anonymous: true,
        }
    }

    pub fn with_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        match &config.jwt_secret {
            Some(secret) => Self::new(secret.as_bytes()).with_anonymous(config.allow_anonymous),
            None => Self::anonymous(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::anonymous()
    }
}
