use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::api::WeatherQuery;
use crate::db::DbObservation;
use crate::types::openweather::GeocodeHit;
use crate::types::{CurrentConditions, DailyForecastItem, HourlyForecastItem};
use crate::{StratusError, router::StratusState};

#[derive(Debug, Deserialize)]
pub struct ForecastParams {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub hours: Option<usize>,
    pub days: Option<usize>,
    pub units: Option<String>,
    pub lang: Option<String>,
}

impl ForecastParams {
    fn query(&self) -> Result<WeatherQuery, StratusError> {
        WeatherQuery::parse(
            self.lat,
            self.lon,
            self.units.as_deref(),
            self.lang.as_deref(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    #[serde(default)]
    pub query: String,
}

type ForecastQuery = WithRejection<Query<ForecastParams>, StratusError>;

/// GET /weather/current
pub async fn current(
    State(state): State<StratusState>,
    WithRejection(Query(params), _): ForecastQuery,
) -> Result<Json<CurrentConditions>, StratusError> {
    Ok(Json(state.weather.current(&params.query()?).await?))
}

/// GET /weather/hourly
pub async fn hourly(
    State(state): State<StratusState>,
    WithRejection(Query(params), _): ForecastQuery,
) -> Result<Json<Vec<HourlyForecastItem>>, StratusError> {
    let q = params.query()?;
    Ok(Json(state.weather.hourly(&q, params.hours).await?))
}

/// GET /weather/weekly
pub async fn weekly(
    State(state): State<StratusState>,
    WithRejection(Query(params), _): ForecastQuery,
) -> Result<Json<Vec<DailyForecastItem>>, StratusError> {
    let q = params.query()?;
    Ok(Json(state.weather.weekly(&q, params.days).await?))
}

/// GET /weather/observations
pub async fn observations(
    State(state): State<StratusState>,
) -> Result<Json<Vec<DbObservation>>, StratusError> {
    Ok(Json(state.observations.list_all().await?))
}

/// GET /openweather/geocode?query=...
pub async fn geocode(
    State(state): State<StratusState>,
    WithRejection(Query(params), _): WithRejection<Query<GeocodeParams>, StratusError>,
) -> Result<Json<Vec<GeocodeHit>>, StratusError> {
    Ok(Json(state.weather.geocode(&params.query).await?))
}
