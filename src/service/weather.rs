use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::{OpenWeatherApi, WeatherQuery};
use crate::error::StratusError;
use crate::service::cache::{CacheKey, CacheOp, ResponseCache};
use crate::service::normalizer::{self, Section};
use crate::types::openweather::{CurrentPayload, GeocodeHit};
use crate::types::{
    Coordinates, CurrentConditions, DailyForecastItem, HourlyForecastItem, ProviderResponse,
};

const UNITS: [&str; 3] = ["metric", "imperial", "standard"];
const MAX_QUERY_LEN: usize = 100;

impl WeatherQuery {
    /// Validate raw request parameters; `units` defaults to metric and `lang` to en.
    pub fn parse(
        lat: Option<f64>,
        lon: Option<f64>,
        units: Option<&str>,
        lang: Option<&str>,
    ) -> Result<Self, StratusError> {
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Err(StratusError::Validation("lat and lon are required".into()));
        };
        let coords = Coordinates::new(lat, lon)?;

        let units = units.map(str::trim).filter(|u| !u.is_empty()).unwrap_or("metric");
        if !UNITS.contains(&units) {
            return Err(StratusError::Validation(format!(
                "units must be one of {}",
                UNITS.join(", ")
            )));
        }
        let lang = lang.map(str::trim).filter(|l| !l.is_empty()).unwrap_or("en");
        if lang.len() > 8 || !lang.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(StratusError::Validation(format!("unsupported lang `{lang}`")));
        }

        Ok(Self {
            coords,
            units: units.to_string(),
            lang: lang.to_ascii_lowercase(),
        })
    }
}

/// Live forecast retrieval: provider calls behind the response cache, then normalization.
#[derive(Clone)]
pub struct WeatherService {
    api: Arc<OpenWeatherApi>,
    cache: Arc<dyn ResponseCache>,
    ttl: Duration,
    geocode_limit: u32,
}

impl WeatherService {
    pub fn new(
        api: OpenWeatherApi,
        cache: Arc<dyn ResponseCache>,
        ttl: Duration,
        geocode_limit: u32,
    ) -> Self {
        Self {
            api: Arc::new(api),
            cache,
            ttl,
            geocode_limit,
        }
    }

    pub async fn hourly(
        &self,
        q: &WeatherQuery,
        hours: Option<usize>,
    ) -> Result<Vec<HourlyForecastItem>, StratusError> {
        let source = self.forecast_source(q, Section::Hourly).await?;
        Ok(normalizer::hourly(source, normalizer::clamp_hours(hours)))
    }

    pub async fn weekly(
        &self,
        q: &WeatherQuery,
        days: Option<usize>,
    ) -> Result<Vec<DailyForecastItem>, StratusError> {
        let source = self.forecast_source(q, Section::Daily).await?;
        Ok(normalizer::daily(source, normalizer::clamp_days(days)))
    }

    pub async fn current(&self, q: &WeatherQuery) -> Result<CurrentConditions, StratusError> {
        let key = CacheKey::at(CacheOp::Current, q.coords, &q.units, &q.lang);
        let body = self.cached(key, || self.api.current(q)).await?;
        let payload: CurrentPayload = serde_json::from_str(&body)?;
        normalizer::current(payload).ok_or_else(|| {
            StratusError::UpstreamInvalid("observation timestamp out of range".into())
        })
    }

    pub async fn geocode(&self, query: &str) -> Result<Vec<GeocodeHit>, StratusError> {
        let query = query.trim();
        if query.is_empty() || query.len() > MAX_QUERY_LEN {
            return Err(StratusError::Validation(format!(
                "query must be 1 to {MAX_QUERY_LEN} characters"
            )));
        }
        let key = CacheKey::query(CacheOp::Geocode, query);
        let body = self
            .cached(key, || self.api.geocode(query, self.geocode_limit))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Prefer the onecall payload; on a non-2xx answer or an empty section fall back to
    /// the 3-hour forecast list. Transport failures are returned as-is.
    async fn forecast_source(
        &self,
        q: &WeatherQuery,
        section: Section,
    ) -> Result<ProviderResponse, StratusError> {
        let key = CacheKey::at(CacheOp::OneCall, q.coords, &q.units, &q.lang);
        match self.cached(key, || self.api.onecall(q)).await {
            Ok(body) => {
                let resp = ProviderResponse::from_slice(body.as_bytes())?;
                if normalizer::has_section(&resp, section) {
                    return Ok(resp);
                }
                debug!(?section, "onecall payload empty; using 3-hour forecast");
            }
            Err(StratusError::UpstreamStatus { status, .. }) => {
                warn!(%status, "onecall unavailable; using 3-hour forecast");
            }
            Err(e) => return Err(e),
        }

        let key = CacheKey::at(CacheOp::Forecast, q.coords, &q.units, &q.lang);
        let body = self.cached(key, || self.api.forecast(q)).await?;
        Ok(ProviderResponse::from_slice(body.as_bytes())?)
    }

    async fn cached<F, Fut>(&self, key: CacheKey, fetch: F) -> Result<Arc<str>, StratusError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, StratusError>>,
    {
        if let Some(hit) = self.cache.get(&key) {
            debug!(%key, "response cache hit");
            return Ok(hit);
        }
        let body: Arc<str> = Arc::from(fetch().await?);
        self.cache.put(key, body.clone(), self.ttl);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_and_validation() {
        let q = WeatherQuery::parse(Some(10.0), Some(20.0), None, Some("")).unwrap();
        assert_eq!(q.units, "metric");
        assert_eq!(q.lang, "en");

        let q = WeatherQuery::parse(Some(10.0), Some(20.0), Some("imperial"), Some("pt_BR"))
            .unwrap();
        assert_eq!(q.lang, "pt_br");

        assert!(WeatherQuery::parse(None, Some(20.0), None, None).is_err());
        assert!(WeatherQuery::parse(Some(10.0), Some(20.0), Some("kelvin"), None).is_err());
        assert!(WeatherQuery::parse(Some(10.0), Some(20.0), None, Some("en;drop")).is_err());
        assert!(WeatherQuery::parse(Some(95.0), Some(20.0), None, None).is_err());
    }
}
