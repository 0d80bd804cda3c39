use crate::db::models::DbFavorite;
use crate::db::sqlite::SqlitePool;
use crate::error::StratusError;
use crate::types::geo::{Coordinates, scaled_e4};
use chrono::Utc;

const FAVORITE_COLUMNS: &str =
    "id, user_id, name, country_code, state, latitude, longitude, is_default, created_at";

/// A validated favorite about to be stored; coordinates already rounded.
#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub name: String,
    pub country_code: String,
    pub state: Option<String>,
    pub coords: Coordinates,
}

#[derive(Clone)]
pub struct FavoritesStorage {
    pool: SqlitePool,
}

impl FavoritesStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Newest first.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<DbFavorite>, StratusError> {
        let rows = sqlx::query_as::<_, DbFavorite>(&format!(
            "SELECT {FAVORITE_COLUMNS} FROM favorites WHERE user_id = ? \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn exists_at(&self, user_id: i64, coords: Coordinates) -> Result<bool, StratusError> {
        let rec: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM favorites WHERE user_id = ? AND lat_e4 = ? AND lon_e4 = ?",
        )
        .bind(user_id)
        .bind(scaled_e4(coords.lat))
        .bind(scaled_e4(coords.lon))
        .fetch_one(&self.pool)
        .await?;
        Ok(rec.0 > 0)
    }

    pub async fn insert(&self, user_id: i64, fav: NewFavorite) -> Result<DbFavorite, StratusError> {
        let row = sqlx::query_as::<_, DbFavorite>(&format!(
            r#"INSERT INTO favorites (
                   user_id, name, country_code, state, latitude, longitude,
                   lat_e4, lon_e4, is_default, created_at
               ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
               RETURNING {FAVORITE_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(fav.name)
        .bind(fav.country_code)
        .bind(fav.state)
        .bind(fav.coords.lat)
        .bind(fav.coords.lon)
        .bind(scaled_e4(fav.coords.lat))
        .bind(scaled_e4(fav.coords.lon))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StratusError::from_constraint(e, "location already in favorites"))?;
        Ok(row)
    }

    /// Delete scoped to the owner. Returns false when nothing matched.
    pub async fn delete(&self, user_id: i64, favorite_id: i64) -> Result<bool, StratusError> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = ? AND user_id = ?")
            .bind(favorite_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the user's current default and mark `favorite_id`, in one transaction.
    /// Returns false (and writes nothing) when the favorite is not owned by `user_id`.
    ///
    /// The first statement is a write so the transaction holds SQLite's write lock from
    /// the start and concurrent callers wait on the busy timeout.
    pub async fn set_default(&self, user_id: i64, favorite_id: i64) -> Result<bool, StratusError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE favorites SET is_default = 0 \
             WHERE user_id = ? AND is_default = 1 AND id <> ? \
               AND EXISTS (SELECT 1 FROM favorites WHERE id = ? AND user_id = ?)",
        )
        .bind(user_id)
        .bind(favorite_id)
        .bind(favorite_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let marked = sqlx::query("UPDATE favorites SET is_default = 1 WHERE id = ? AND user_id = ?")
            .bind(favorite_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if marked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::connect;
    use std::time::{SystemTime, UNIX_EPOCH};

    async fn seed_user(pool: &SqlitePool, name: &str) -> i64 {
        let rec: (i64,) = sqlx::query_as(
            "INSERT INTO users (username, email, password_hash, role, created_at) \
             VALUES (?, ?, 'x', 'User', ?) RETURNING id",
        )
        .bind(name)
        .bind(format!("{name}@example.com"))
        .bind(Utc::now())
        .fetch_one(pool)
        .await
        .unwrap();
        rec.0
    }

    fn favorite(name: &str, lat: f64) -> NewFavorite {
        NewFavorite {
            name: name.to_string(),
            country_code: "PT".to_string(),
            state: None,
            coords: Coordinates::new(lat, -9.1393).unwrap(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_set_default_on_file_database_succeeds() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "stratus-set-default-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));
        let pool = connect(&format!("sqlite:{}", path.display())).await.unwrap();
        let storage = FavoritesStorage::new(pool.clone());

        let mut owned = Vec::new();
        for i in 0..8 {
            let user = seed_user(&pool, &format!("user{i}")).await;
            let a = storage.insert(user, favorite("a", 38.7)).await.unwrap();
            let b = storage.insert(user, favorite("b", 41.1)).await.unwrap();
            owned.push((user, a.id, b.id));
        }

        let mut tasks = Vec::new();
        for round in 0..10 {
            for &(user, a, b) in &owned {
                let storage = storage.clone();
                let target = if round % 2 == 0 { a } else { b };
                tasks.push(tokio::spawn(async move {
                    storage.set_default(user, target).await
                }));
            }
        }
        for task in tasks {
            assert!(task.await.unwrap().unwrap());
        }

        for &(user, _, _) in &owned {
            let defaults = storage
                .list_for_user(user)
                .await
                .unwrap()
                .into_iter()
                .filter(|f| f.is_default)
                .count();
            assert_eq!(defaults, 1);
        }

        pool.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[tokio::test]
    async fn set_default_on_foreign_favorite_writes_nothing() {
        let pool = crate::db::sqlite::memory_pool().await;
        let owner = seed_user(&pool, "ana").await;
        let other = seed_user(&pool, "bob").await;
        let storage = FavoritesStorage::new(pool);

        let fav = storage.insert(owner, favorite("a", 38.7)).await.unwrap();
        assert!(storage.set_default(owner, fav.id).await.unwrap());
        assert!(!storage.set_default(other, fav.id).await.unwrap());

        let list = storage.list_for_user(owner).await.unwrap();
        assert!(list[0].is_default);
    }
}
