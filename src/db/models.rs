use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of `users`. Never serialized to clients; see [`UserView`].
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Public user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<DbUser> for UserView {
    fn from(u: DbUser) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbFavorite {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub name: String,
    pub country_code: String,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Observation joined with its owning location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DbObservation {
    pub id: i64,
    pub location_id: i64,
    pub location_name: String,
    pub country_code: String,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
    pub provider_city_id: Option<String>,
    pub temperature: f64,
    pub feels_like: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub description: String,
    pub icon: String,
    pub observed_at: DateTime<Utc>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}
