use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::http_error::AppError;
use crate::plugins::samples::models::SampleDto;

#[async_trait]
pub trait SampleRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<SampleDto>, AppError>;
    async fn find(&self, id: i64) -> Result<Option<SampleDto>, AppError>;
    async fn insert(&self, name: &str) -> Result<SampleDto, AppError>;
    /// `None` leaves the name untouched but still bumps `updated_at`.
    async fn update(&self, id: i64, name: Option<&str>) -> Result<SampleDto, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

pub type DynSampleRepo = Arc<dyn SampleRepo>;

#[derive(Clone)]
pub struct PgSampleRepo {
    pool: PgPool,
}

impl PgSampleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SampleRepo for PgSampleRepo {
    async fn list(&self) -> Result<Vec<SampleDto>, AppError> {
        let rows = sqlx::query_as::<_, SampleDto>("SELECT id, name, created_at, updated_at FROM samples ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(rows)
    }

    async fn find(&self, id: i64) -> Result<Option<SampleDto>, AppError> {
        let row = sqlx::query_as::<_, SampleDto>("SELECT id, name, created_at, updated_at FROM samples WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row)
    }

    async fn insert(&self, name: &str) -> Result<SampleDto, AppError> {
        let row = sqlx::query_as::<_, SampleDto>("INSERT INTO samples (name) VALUES ($1) RETURNING id, name, created_at, updated_at")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row)
    }

    async fn update(&self, id: i64, name: Option<&str>) -> Result<SampleDto, AppError> {
        let row = sqlx::query_as::<_, SampleDto>(
            "UPDATE samples SET name = COALESCE($1, name), updated_at = now() WHERE id = $2 RETURNING id, name, created_at, updated_at",
        )
        .bind(name)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM samples WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
