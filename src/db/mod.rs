//! Database module: models, schema and storage for persistent state.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and their public views
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool construction and schema bootstrap
//! - `users.rs`, `favorites.rs`, `observations.rs`: per-table storage

pub mod favorites;
pub mod models;
pub mod observations;
pub mod schema;
pub mod sqlite;
pub mod users;

pub use favorites::{FavoritesStorage, NewFavorite};
pub use models::{DbFavorite, DbObservation, DbUser, UserView};
pub use observations::ObservationsStorage;
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, connect};
pub use users::{NewUser, UserChanges, UsersStorage};
