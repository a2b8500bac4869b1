use async_trait::async_trait;
use axum::http::StatusCode;
use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::db::DbPool;
use crate::kernel::Plugin;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// `GET /health` is a liveness probe; `GET /health/ready` also pings the database.
pub struct HealthPlugin {
    pool: Option<DbPool>,
}

impl HealthPlugin {
    pub fn new(pool: Option<DbPool>) -> Self {
        Self { pool }
    }
}

async fn live() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn ready(Extension(pool): Extension<Option<DbPool>>) -> (StatusCode, Json<Health>) {
    let Some(pool) = pool else {
        return (StatusCode::OK, Json(Health { status: "ok" }));
    };
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (StatusCode::OK, Json(Health { status: "ok" })),
        Err(e) => {
            tracing::warn!("readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, Json(Health { status: "unavailable" }))
        }
    }
}

#[async_trait]
impl Plugin for HealthPlugin {
    async fn router(&self) -> Router {
        Router::new()
            .route("/", get(live))
            .route("/ready", get(ready))
            .layer(Extension(self.pool.clone()))
    }

    fn name(&self) -> &'static str {
        "health"
    }
}
