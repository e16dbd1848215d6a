use std::sync::Arc;

use anyhow::Context;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::config::AppConfig;
use crate::enhance::manager::EngineManager;

/// State for the authentication service.
#[derive(Clone)]
pub struct AuthState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AuthState {
    pub async fn init(config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let db = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db, config })
    }
}

/// State for the enhancement service. The two services share nothing but the
/// configuration they were built from.
#[derive(Clone)]
pub struct EnhanceState {
    pub engines: Arc<EngineManager>,
}
