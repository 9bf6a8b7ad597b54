//! Postgres pool for the Postforge content store (prompts, topics, ideas, drafts).
//! The schema lives in `migrations/` and is applied by `main` at startup.

use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to the content store...");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;

    info!("Content store pool ready ({MAX_CONNECTIONS} connections max)");
    Ok(pool)
}
