//! SQL DDL for initializing the service database.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `users`: `username` and `email` UNIQUE, argon2 PHC string in `password_hash`
/// - `favorites`: owned by a user; coordinates stored rounded to 4 decimals, with the
///   scaled integers `lat_e4`/`lon_e4` carrying the per-user UNIQUE constraint
/// - partial unique index allowing at most one `is_default = 1` row per user
/// - `locations` / `observations`: persisted conditions, read-only from the API
/// - timestamps as RFC3339 TEXT
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'User',
    created_at TEXT NOT NULL,
    updated_at TEXT NULL
);

CREATE TABLE IF NOT EXISTS favorites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    country_code TEXT NOT NULL,
    state TEXT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    lat_e4 INTEGER NOT NULL,
    lon_e4 INTEGER NOT NULL,
    is_default INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, lat_e4, lon_e4)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_favorites_one_default
    ON favorites(user_id) WHERE is_default = 1;

CREATE TABLE IF NOT EXISTS locations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    country_code TEXT NOT NULL,
    state TEXT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    timezone TEXT NULL,
    provider_city_id TEXT NULL
);

CREATE TABLE IF NOT EXISTS observations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    location_id INTEGER NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
    temperature REAL NOT NULL,
    feels_like REAL NOT NULL,
    min_temperature REAL NOT NULL,
    max_temperature REAL NOT NULL,
    humidity REAL NOT NULL,
    wind_speed REAL NOT NULL,
    description TEXT NOT NULL,
    icon TEXT NOT NULL,
    observed_at TEXT NOT NULL,
    sunrise TEXT NULL,
    sunset TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_observations_location ON observations(location_id, observed_at)
"#;
