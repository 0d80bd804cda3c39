use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use tracing::{info, warn};

use crate::db::{NewUser, UserChanges, UserView, UsersStorage};
use crate::error::StratusError;
use crate::types::{CreateUserRequest, UpdateUserRequest};

pub const DEFAULT_ROLE: &str = "User";

/// Account management and credential checks on top of [`UsersStorage`].
#[derive(Clone)]
pub struct UserService {
    storage: UsersStorage,
}

impl UserService {
    pub fn new(storage: UsersStorage) -> Self {
        Self { storage }
    }

    pub async fn create(&self, req: CreateUserRequest) -> Result<UserView, StratusError> {
        let username = validate_username(&req.username)?;
        let email = validate_email(&req.email)?;
        validate_password(&req.password)?;
        let role = match req.role.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => validate_role(r)?,
            _ => DEFAULT_ROLE.to_string(),
        };

        if self.storage.username_taken(&username).await? {
            return Err(StratusError::Conflict("username already exists".to_string()));
        }
        if self.storage.email_taken(&email).await? {
            return Err(StratusError::Conflict("email already exists".to_string()));
        }

        let password_hash = hash_password(req.password).await?;
        let user = self
            .storage
            .insert(NewUser {
                username,
                email,
                password_hash,
                role,
            })
            .await?;
        info!(user_id = user.id, role = %user.role, "user registered");
        Ok(user.into())
    }

    /// Resolve `identifier` as username or email and check the password. Unknown users
    /// and wrong passwords fail identically.
    pub async fn validate_credentials(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<UserView, StratusError> {
        let Some(user) = self.storage.find_by_login(identifier.trim()).await? else {
            return Err(StratusError::InvalidCredentials);
        };
        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            warn!(user_id = user.id, "password mismatch");
            return Err(StratusError::InvalidCredentials);
        }
        Ok(user.into())
    }

    pub async fn get(&self, id: i64) -> Result<UserView, StratusError> {
        self.storage
            .get_by_id(id)
            .await?
            .map(UserView::from)
            .ok_or_else(|| StratusError::NotFound("user".to_string()))
    }

    pub async fn update(&self, id: i64, req: UpdateUserRequest) -> Result<UserView, StratusError> {
        let mut changes = UserChanges {
            username: req.username.as_deref().map(validate_username).transpose()?,
            email: req.email.as_deref().map(validate_email).transpose()?,
            role: req.role.as_deref().map(validate_role).transpose()?,
            ..UserChanges::default()
        };
        if let Some(password) = req.password {
            validate_password(&password)?;
            changes.password_hash = Some(hash_password(password).await?);
        }

        let user = self
            .storage
            .update(id, changes)
            .await?
            .ok_or_else(|| StratusError::NotFound("user".to_string()))?;
        info!(user_id = id, "user updated");
        Ok(user.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), StratusError> {
        if !self.storage.delete(id).await? {
            return Err(StratusError::NotFound("user".to_string()));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }
}

fn validate_username(raw: &str) -> Result<String, StratusError> {
    let username = raw.trim();
    let len = username.chars().count();
    if !(3..=64).contains(&len) {
        return Err(StratusError::Validation(
            "username must be 3 to 64 characters".to_string(),
        ));
    }
    Ok(username.to_string())
}

fn validate_email(raw: &str) -> Result<String, StratusError> {
    let email = raw.trim();
    if email.is_empty() || email.len() > 256 || !email.contains('@') {
        return Err(StratusError::Validation("email is not valid".to_string()));
    }
    Ok(email.to_string())
}

fn validate_password(password: &str) -> Result<(), StratusError> {
    let len = password.chars().count();
    if !(6..=128).contains(&len) {
        return Err(StratusError::Validation(
            "password must be 6 to 128 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_role(raw: &str) -> Result<String, StratusError> {
    let role = raw.trim();
    if role.is_empty() || role.len() > 32 {
        return Err(StratusError::Validation(
            "role must be 1 to 32 characters".to_string(),
        ));
    }
    Ok(role.to_string())
}

// argon2 is CPU-bound; keep it off the async workers.
async fn hash_password(password: String) -> Result<String, StratusError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| StratusError::PasswordHash(e.to_string()))
    })
    .await
    .map_err(|e| StratusError::Internal(format!("hashing task failed: {e}")))?
}

async fn verify_password(password: String, stored: String) -> Result<bool, StratusError> {
    tokio::task::spawn_blocking(move || -> Result<bool, StratusError> {
        let parsed =
            PasswordHash::new(&stored).map_err(|e| StratusError::PasswordHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| StratusError::Internal(format!("verification task failed: {e}")))?
}
