use crate::db::models::DbUser;
use crate::db::sqlite::SqlitePool;
use crate::error::StratusError;
use chrono::{DateTime, Utc};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, created_at, updated_at";

/// Fields for a new `users` row; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct UsersStorage {
    pool: SqlitePool,
}

impl UsersStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool, StratusError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0 > 0)
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool, StratusError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0 > 0)
    }

    /// Insert and return the stored row. A unique violation that slips past the
    /// pre-checks is reported as a conflict.
    pub async fn insert(&self, user: NewUser) -> Result<DbUser, StratusError> {
        let created_at: DateTime<Utc> = Utc::now();
        let rec: (i64,) = sqlx::query_as(
            r#"INSERT INTO users (username, email, password_hash, role, created_at)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id"#,
        )
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StratusError::from_constraint(e, "username or email already exists"))?;

        self.get_by_id(rec.0)
            .await?
            .ok_or_else(|| StratusError::Internal("inserted user vanished".to_string()))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<DbUser>, StratusError> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Look up by username first, then by email.
    pub async fn find_by_login(&self, identifier: &str) -> Result<Option<DbUser>, StratusError> {
        let user = sqlx::query_as::<_, DbUser>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ? OR email = ? \
             ORDER BY CASE WHEN username = ? THEN 0 ELSE 1 END LIMIT 1"
        ))
        .bind(identifier)
        .bind(identifier)
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Apply changes; returns `None` when the user does not exist.
    pub async fn update(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<DbUser>, StratusError> {
        let result = sqlx::query(
            r#"UPDATE users SET
                username = COALESCE(?, username),
                email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash),
                role = COALESCE(?, role),
                updated_at = ?
              WHERE id = ?"#,
        )
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.role)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StratusError::from_constraint(e, "username or email already exists"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<bool, StratusError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
