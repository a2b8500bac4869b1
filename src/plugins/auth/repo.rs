use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::http_error::AppError;
use crate::plugins::auth::models::{UserDto, UserRecord};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError>;
    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<UserDto, AppError>;
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;
}

pub type DynUserRepo = Arc<dyn UserRepo>;

const USER_COLUMNS: &str = "id, email, name, password, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(user)
    }

    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<UserDto, AppError> {
        let user = sqlx::query_as::<_, UserDto>(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING id, email, name, created_at, updated_at",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(user)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password = $1, updated_at = now() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
