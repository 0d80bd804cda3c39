use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::config::JwtConfig;
use crate::db::UserView;
use crate::error::StratusError;

/// Access-token claims. `sub` carries the user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, StratusError> {
        self.sub
            .parse()
            .map_err(|_| StratusError::Unauthorized("malformed subject".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    inner: Arc<TokenKeys>,
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&[cfg.audience.as_str()]);
        validation.validate_nbf = true;

        Self {
            inner: Arc::new(TokenKeys {
                encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
                decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
                validation,
                issuer: cfg.issuer.clone(),
                audience: cfg.audience.clone(),
                ttl_secs: cfg.expires_in_secs(),
            }),
        }
    }

    /// Sign a token for `user`; returns the token and its lifetime in seconds.
    pub fn issue(&self, user: &UserView) -> Result<(String, i64), StratusError> {
        let now = Utc::now().timestamp();
        let keys = &self.inner;
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            iat: now,
            nbf: now,
            exp: now + keys.ttl_secs,
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?;
        Ok((token, keys.ttl_secs))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, StratusError> {
        decode::<Claims>(token, &self.inner.decoding, &self.inner.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "rejected bearer token");
                StratusError::Unauthorized("invalid or expired token".to_string())
            })
    }
}
