use sqlx::{Pool, Postgres};

pub type DbPool = Pool<Postgres>;

/// Connects to PostgreSQL and, unless told otherwise, applies `migrations/`.
pub async fn init_db(database_url: &str, run_migrations: bool) -> anyhow::Result<DbPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    if run_migrations {
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    Ok(pool)
}
