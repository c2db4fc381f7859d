//! User repository for database operations
//!
//! Owns the `ah_users` table. Uniqueness of username and email is enforced by
//! the storage-level constraints; a violation surfacing from an insert is
//! mapped back to the field that collided so callers can report it like any
//! other validation failure.

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::models::{NewUser, User};

const USERNAME_CONSTRAINT: &str = "ah_users_username_unique";
const EMAIL_CONSTRAINT: &str = "ah_users_email_unique";

/// Credential store failure kinds
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the colliding field
    #[error("duplicate {0}")]
    Duplicate(&'static str),
    /// The store could not be reached or the query failed
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new user and return the stored row with its assigned id
    ///
    /// `new_user.password` must already be hashed; the repository never sees
    /// a plaintext password.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, StoreError> {
        info!("Creating new user: {}", new_user.username);

        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO ah_users (username, password, first_name, middle_name, last_name, email, role_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING user_id, username, password, first_name, middle_name, last_name, email,
                      role_id, email_verified_at, remember_token, created_at, updated_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(&new_user.first_name)
        .bind(&new_user.middle_name)
        .bind(&new_user.last_name)
        .bind(&new_user.email)
        .bind(new_user.role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        info!("Finding user by username: {}", username);

        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password, first_name, middle_name, last_name, email,
                   role_id, email_verified_at, remember_token, created_at, updated_at
            FROM ah_users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Unavailable)
    }

    /// Find a user by id
    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        info!("Finding user by id: {}", user_id);

        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password, first_name, middle_name, last_name, email,
                   role_id, email_verified_at, remember_token, created_at, updated_at
            FROM ah_users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Unavailable)
    }

    /// Whether a username is already registered
    pub async fn username_taken(&self, username: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT user_id FROM ah_users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await
                .map_err(StoreError::Unavailable)?;
        Ok(row.is_some())
    }

    /// Whether an email is already registered
    pub async fn email_taken(&self, email: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM ah_users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::Unavailable)?;
        Ok(row.is_some())
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        match db.constraint() {
            Some(USERNAME_CONSTRAINT) => return StoreError::Duplicate("username"),
            Some(EMAIL_CONSTRAINT) => return StoreError::Duplicate("email"),
            _ => {}
        }
    }
    StoreError::Unavailable(e)
}
