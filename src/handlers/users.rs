use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::db::UserView;
use crate::middleware::{AuthUser, RequireAdmin};
use crate::types::UpdateUserRequest;
use crate::{StratusError, router::StratusState};

/// GET /users/{id}
pub async fn get_user(
    State(state): State<StratusState>,
    _auth: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, StratusError>,
) -> Result<Json<UserView>, StratusError> {
    Ok(Json(state.users.get(id).await?))
}

/// PUT /users/{id} (admin)
pub async fn update_user(
    State(state): State<StratusState>,
    _admin: RequireAdmin,
    WithRejection(Path(id), _): WithRejection<Path<i64>, StratusError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateUserRequest>, StratusError>,
) -> Result<Json<UserView>, StratusError> {
    Ok(Json(state.users.update(id, req).await?))
}

/// DELETE /users/{id} (admin)
pub async fn delete_user(
    State(state): State<StratusState>,
    _admin: RequireAdmin,
    WithRejection(Path(id), _): WithRejection<Path<i64>, StratusError>,
) -> Result<StatusCode, StratusError> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
