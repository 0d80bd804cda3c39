use axum::{
    Router,
    extract::FromRef,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;

use crate::api::OpenWeatherApi;
use crate::config::Config;
use crate::db::{FavoritesStorage, ObservationsStorage, SqlitePool, UsersStorage};
use crate::error::StratusError;
use crate::handlers::{auth, favorites, users, weather};
use crate::service::{
    FavoritesService, MemoryCache, NoopCache, ResponseCache, TokenService, UserService,
    WeatherService,
};

#[derive(Clone)]
pub struct StratusState {
    pub users: UserService,
    pub favorites: FavoritesService,
    pub weather: WeatherService,
    pub tokens: TokenService,
    pub observations: ObservationsStorage,
}

impl StratusState {
    pub fn new(pool: SqlitePool, cfg: &Config) -> Result<Self, StratusError> {
        let cache: Arc<dyn ResponseCache> = if cfg.cache.enabled {
            Arc::new(MemoryCache::new())
        } else {
            Arc::new(NoopCache)
        };
        let api = OpenWeatherApi::new(&cfg.openweather)?;

        Ok(Self {
            users: UserService::new(UsersStorage::new(pool.clone())),
            favorites: FavoritesService::new(FavoritesStorage::new(pool.clone())),
            weather: WeatherService::new(
                api,
                cache,
                cfg.cache.ttl(),
                cfg.openweather.geocode_limit,
            ),
            tokens: TokenService::new(&cfg.jwt),
            observations: ObservationsStorage::new(pool),
        })
    }
}

impl FromRef<StratusState> for TokenService {
    fn from_ref(state: &StratusState) -> Self {
        state.tokens.clone()
    }
}

pub fn stratus_router(state: StratusState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/favorites",
            get(favorites::list_favorites).post(favorites::create_favorite),
        )
        .route("/favorites/{id}", delete(favorites::delete_favorite))
        .route(
            "/favorites/{id}/default",
            patch(favorites::set_default_favorite),
        )
        .route("/weather/current", get(weather::current))
        .route("/weather/hourly", get(weather::hourly))
        .route("/weather/weekly", get(weather::weekly))
        .route("/weather/observations", get(weather::observations))
        .route("/openweather/geocode", get(weather::geocode))
        .with_state(state)
}
