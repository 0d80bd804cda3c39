use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::error::StratusError;
use crate::service::{Claims, TokenService};

/// Verified bearer-token claims. Rejects with 401 when the header is missing or the
/// token does not verify.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<i64, StratusError> {
        self.0.user_id()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StratusError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| StratusError::Unauthorized("missing bearer token".to_string()))?;

        let tokens = TokenService::from_ref(state);
        let claims = tokens.verify(bearer.token())?;
        Ok(Self(claims))
    }
}

/// Like [`AuthUser`], additionally requiring the `Admin` role (403 otherwise).
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Claims);

impl<S> FromRequestParts<S> for RequireAdmin
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StratusError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if !claims.is_admin() {
            return Err(StratusError::Forbidden);
        }
        Ok(Self(claims))
    }
}
