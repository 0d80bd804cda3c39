use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::config::OpenWeatherConfig;
use crate::error::StratusError;
use crate::types::Coordinates;

const ONECALL_PATH: &str = "data/3.0/onecall";
const FORECAST_PATH: &str = "data/2.5/forecast";
const CURRENT_PATH: &str = "data/2.5/weather";
const GEOCODE_PATH: &str = "geo/1.0/direct";
const MAX_ERROR_BODY: usize = 512;

/// Coordinates plus presentation options, shared by every weather call.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub coords: Coordinates,
    pub units: String,
    pub lang: String,
}

/// Thin client over the OpenWeather REST endpoints.
///
/// Returns raw response bodies; decoding and normalization happen in the service layer.
/// Non-2xx answers become [`StratusError::UpstreamStatus`], timeouts
/// [`StratusError::UpstreamTimeout`]. Nothing is retried here.
pub struct OpenWeatherApi {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl OpenWeatherApi {
    pub fn new(cfg: &OpenWeatherConfig) -> Result<Self, StratusError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("stratus/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.timeout());
        if let Some(proxy_url) = cfg.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let http = builder.build()?;

        let limiter = NonZeroU32::new(cfg.requests_per_minute)
            .map(|n| Arc::new(RateLimiter::direct(Quota::per_minute(n))));
        info!(
            base_url = %cfg.base_url,
            rate_limit = cfg.requests_per_minute,
            "OpenWeather client ready"
        );

        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
            limiter,
        })
    }

    /// Hourly and daily arrays in one payload.
    pub async fn onecall(&self, q: &WeatherQuery) -> Result<String, StratusError> {
        let mut params = Self::coord_params(q);
        params.push(("exclude", "minutely,alerts,current".to_string()));
        self.get(ONECALL_PATH, params).await
    }

    /// 5-day list of 3-hour steps.
    pub async fn forecast(&self, q: &WeatherQuery) -> Result<String, StratusError> {
        self.get(FORECAST_PATH, Self::coord_params(q)).await
    }

    pub async fn current(&self, q: &WeatherQuery) -> Result<String, StratusError> {
        self.get(CURRENT_PATH, Self::coord_params(q)).await
    }

    pub async fn geocode(&self, query: &str, limit: u32) -> Result<String, StratusError> {
        let params = vec![("q", query.to_string()), ("limit", limit.to_string())];
        self.get(GEOCODE_PATH, params).await
    }

    fn coord_params(q: &WeatherQuery) -> Vec<(&'static str, String)> {
        vec![
            ("lat", q.coords.lat.to_string()),
            ("lon", q.coords.lon.to_string()),
            ("units", q.units.clone()),
            ("lang", q.lang.clone()),
        ]
    }

    async fn get(
        &self,
        path: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<String, StratusError> {
        let url = self.base_url.join(path)?;
        if let Some(limiter) = self.limiter.as_ref() {
            limiter.until_ready().await;
        }

        debug!(%url, "calling weather provider");
        params.push(("appid", self.api_key.clone()));
        let resp = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(StratusError::from_transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(StratusError::from_transport)?;
        if !status.is_success() {
            return Err(StratusError::UpstreamStatus {
                status,
                body: truncate_body(body),
            });
        }
        Ok(body)
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> OpenWeatherConfig {
        OpenWeatherConfig {
            api_key: "test-key".to_string(),
            base_url: Url::parse(&server.uri()).unwrap(),
            requests_per_minute: 0,
            ..OpenWeatherConfig::default()
        }
    }

    fn query() -> WeatherQuery {
        WeatherQuery {
            coords: Coordinates::new(51.5, -0.12).unwrap(),
            units: "metric".to_string(),
            lang: "en".to_string(),
        }
    }

    #[tokio::test]
    async fn sends_key_and_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("appid", "test-key"))
            .and(query_param("lat", "51.5"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"list\":[]}"))
            .expect(1)
            .mount(&server)
            .await;

        let api = OpenWeatherApi::new(&config(&server)).unwrap();
        let body = api.forecast(&query()).await.unwrap();
        assert_eq!(body, "{\"list\":[]}");
    }

    #[tokio::test]
    async fn non_success_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/3.0/onecall"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"cod\":401}"))
            .mount(&server)
            .await;

        let api = OpenWeatherApi::new(&config(&server)).unwrap();
        match api.onecall(&query()).await {
            Err(StratusError::UpstreamStatus { status, body }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("401"));
            }
            other => panic!("expected upstream status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_provider_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.timeout_secs = 1;
        let api = OpenWeatherApi::new(&cfg).unwrap();
        assert!(matches!(
            api.current(&query()).await,
            Err(StratusError::UpstreamTimeout)
        ));
    }

    #[test]
    fn long_error_bodies_are_truncated_on_char_boundary() {
        let body = "é".repeat(400);
        let cut = truncate_body(body);
        assert!(cut.len() <= MAX_ERROR_BODY);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
