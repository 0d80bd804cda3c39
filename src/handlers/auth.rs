use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use serde::Serialize;
use tracing::info;

use crate::db::UserView;
use crate::middleware::AuthUser;
use crate::types::{CreateUserRequest, LoginRequest, LoginResponse};
use crate::{StratusError, router::StratusState};

/// POST /auth/register
pub async fn register(
    State(state): State<StratusState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateUserRequest>, StratusError>,
) -> Result<(StatusCode, Json<UserView>), StratusError> {
    let user = state.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<StratusState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, StratusError>,
) -> Result<Json<LoginResponse>, StratusError> {
    let user = state
        .users
        .validate_credentials(&req.username_or_email, &req.password)
        .await?;
    let (token, expires_in) = state.tokens.issue(&user)?;
    info!(user_id = user.id, "token issued");
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in,
        user,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub expires_at: i64,
}

/// GET /auth/me -> identity carried by the presented token.
pub async fn me(auth: AuthUser) -> Result<Json<MeResponse>, StratusError> {
    let id = auth.user_id()?;
    let claims = auth.0;
    Ok(Json(MeResponse {
        id,
        username: claims.name,
        email: claims.email,
        role: claims.role,
        expires_at: claims.exp,
    }))
}
