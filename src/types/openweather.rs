//! OpenWeather wire payloads.
//!
//! Only the fields the normalizer reads are modelled; unknown fields are ignored and
//! optional ones default, so small provider-side additions do not break decoding.

use serde::{Deserialize, Serialize};

/// One entry of the provider's `weather[]` array.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

/// Either onecall-style data or a 3-hourly forecast list.
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    OneCall(OneCallPayload),
    ForecastList(ForecastListPayload),
}

impl ProviderResponse {
    /// Decode by shape: a top-level `list` array marks the forecast-list payload.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if value.get("list").is_some_and(|l| l.is_array()) {
            serde_json::from_value(value).map(Self::ForecastList)
        } else {
            serde_json::from_value(value).map(Self::OneCall)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OneCallPayload {
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub timezone_offset: i32,
    #[serde(default)]
    pub hourly: Vec<OneCallHourly>,
    #[serde(default)]
    pub daily: Vec<OneCallDaily>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneCallHourly {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub pop: Option<f64>,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneCallDaily {
    pub dt: i64,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
    pub temp: DailyTemp,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub pop: Option<f64>,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyTemp {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastListPayload {
    pub list: Vec<ForecastEntry>,
    #[serde(default)]
    pub city: ForecastCity,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastCity {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Shift in seconds from UTC.
    #[serde(default)]
    pub timezone: i32,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub pop: Option<f64>,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: f64,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
}

/// `data/2.5/weather` current conditions.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentPayload {
    pub dt: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub timezone: i32,
    pub main: MainReadings,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub sys: CurrentSys,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentSys {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

/// One hit from `geo/1.0/direct`, re-exposed to clients as-is.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeocodeHit {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}
