use tracing::info;

use crate::db::{DbFavorite, FavoritesStorage, NewFavorite};
use crate::error::StratusError;
use crate::types::{Coordinates, CreateFavoriteRequest};

#[derive(Clone)]
pub struct FavoritesService {
    storage: FavoritesStorage,
}

impl FavoritesService {
    pub fn new(storage: FavoritesStorage) -> Self {
        Self { storage }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<DbFavorite>, StratusError> {
        self.storage.list_for_user(user_id).await
    }

    /// Store a favorite at 4-decimal precision. A second favorite at the same rounded
    /// point is a conflict.
    pub async fn create(
        &self,
        user_id: i64,
        req: CreateFavoriteRequest,
    ) -> Result<DbFavorite, StratusError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(StratusError::Validation("name is required".to_string()));
        }
        let country_code = req.country_code.trim();
        if country_code.is_empty() {
            return Err(StratusError::Validation("countryCode is required".to_string()));
        }
        let coords = Coordinates::new(req.latitude, req.longitude)?.rounded();

        if self.storage.exists_at(user_id, coords).await? {
            return Err(StratusError::Conflict(
                "location already in favorites".to_string(),
            ));
        }

        let state = req
            .state
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let fav = self
            .storage
            .insert(
                user_id,
                NewFavorite {
                    name: name.to_string(),
                    country_code: country_code.to_uppercase(),
                    state,
                    coords,
                },
            )
            .await?;
        info!(user_id, favorite_id = fav.id, "favorite added");
        Ok(fav)
    }

    pub async fn delete(&self, user_id: i64, favorite_id: i64) -> Result<(), StratusError> {
        if !self.storage.delete(user_id, favorite_id).await? {
            return Err(StratusError::NotFound("favorite".to_string()));
        }
        info!(user_id, favorite_id, "favorite removed");
        Ok(())
    }

    pub async fn set_default(&self, user_id: i64, favorite_id: i64) -> Result<(), StratusError> {
        if !self.storage.set_default(user_id, favorite_id).await? {
            return Err(StratusError::NotFound("favorite".to_string()));
        }
        info!(user_id, favorite_id, "default favorite changed");
        Ok(())
    }
}
