use crate::db::models::DbObservation;
use crate::db::sqlite::SqlitePool;
use crate::error::StratusError;

#[derive(Clone)]
pub struct ObservationsStorage {
    pool: SqlitePool,
}

impl ObservationsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored observations joined with their location, most recent first.
    pub async fn list_all(&self) -> Result<Vec<DbObservation>, StratusError> {
        let rows = sqlx::query_as::<_, DbObservation>(
            r#"SELECT o.id, o.location_id,
                      l.name AS location_name, l.country_code, l.state,
                      l.latitude, l.longitude, l.timezone, l.provider_city_id,
                      o.temperature, o.feels_like, o.min_temperature, o.max_temperature,
                      o.humidity, o.wind_speed, o.description, o.icon,
                      o.observed_at, o.sunrise, o.sunset
               FROM observations o
               JOIN locations l ON l.id = o.location_id
               ORDER BY o.observed_at DESC, o.id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
