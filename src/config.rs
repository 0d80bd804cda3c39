use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::StratusError;

pub const CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "STRATUS_";

/// Layered service configuration.
///
/// Precedence (lowest first): built-in defaults, `config.toml`, `STRATUS_*` environment
/// variables. Nested keys use `__`, e.g. `STRATUS_JWT__SECRET`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub openweather: OpenWeatherConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub loglevel: String,
    pub database_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            database_url: "sqlite:stratus.sqlite".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub expire_minutes: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: "stratus".to_string(),
            audience: "stratus-mobile".to_string(),
            expire_minutes: 60,
        }
    }
}

impl JwtConfig {
    pub fn expires_in_secs(&self) -> i64 {
        self.expire_minutes * 60
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenWeatherConfig {
    pub api_key: String,
    pub base_url: Url,
    pub proxy: Option<Url>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Outbound request budget; 0 disables throttling.
    pub requests_per_minute: u32,
    pub geocode_limit: u32,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Url::parse("https://api.openweathermap.org/")
                .expect("static provider url is valid"),
            proxy: None,
            timeout_secs: 10,
            connect_timeout_secs: 5,
            requests_per_minute: 60,
            geocode_limit: 5,
        }
    }
}

impl OpenWeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Config {
    /// Load from defaults, `config.toml` (if present) and the environment.
    pub fn load() -> Result<Self, StratusError> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, StratusError> {
        let cfg: Config = figment.extract().map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), StratusError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(StratusError::Config(
                "jwt.secret must be set (STRATUS_JWT__SECRET)".to_string(),
            ));
        }
        if self.openweather.api_key.trim().is_empty() {
            return Err(StratusError::Config(
                "openweather.api_key must be set (STRATUS_OPENWEATHER__API_KEY)".to_string(),
            ));
        }
        if self.jwt.expire_minutes <= 0 {
            return Err(StratusError::Config(
                "jwt.expire_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
