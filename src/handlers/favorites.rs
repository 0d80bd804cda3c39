use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::db::DbFavorite;
use crate::middleware::AuthUser;
use crate::types::CreateFavoriteRequest;
use crate::{StratusError, router::StratusState};

/// GET /favorites
pub async fn list_favorites(
    State(state): State<StratusState>,
    auth: AuthUser,
) -> Result<Json<Vec<DbFavorite>>, StratusError> {
    let user_id = auth.user_id()?;
    Ok(Json(state.favorites.list(user_id).await?))
}

/// POST /favorites
pub async fn create_favorite(
    State(state): State<StratusState>,
    auth: AuthUser,
    WithRejection(Json(req), _): WithRejection<Json<CreateFavoriteRequest>, StratusError>,
) -> Result<(StatusCode, Json<DbFavorite>), StratusError> {
    let user_id = auth.user_id()?;
    let fav = state.favorites.create(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(fav)))
}

/// DELETE /favorites/{id}
pub async fn delete_favorite(
    State(state): State<StratusState>,
    auth: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, StratusError>,
) -> Result<StatusCode, StratusError> {
    state.favorites.delete(auth.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /favorites/{id}/default
pub async fn set_default_favorite(
    State(state): State<StratusState>,
    auth: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<i64>, StratusError>,
) -> Result<StatusCode, StratusError> {
    state.favorites.set_default(auth.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
