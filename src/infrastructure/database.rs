use super::log_messages;
use crate::config::DatabaseSettings;
use crate::{Error, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{info, instrument};

/// Database connection pool wrapper
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool sized from settings
    #[instrument(skip(settings), fields(host = %settings.host, database = %settings.database_name))]
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        info!("{}", log_messages::application::CONNECTING_TO_DATABASE);
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.into_inner())
            .connect(&settings.url())
            .await?;
        info!("{}", log_messages::database::CONNECTION_ESTABLISHED);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<()> {
        let row = sqlx::query("SELECT 1 as health_check")
            .fetch_one(&self.pool)
            .await?;

        let health_check: i32 = row.try_get("health_check")?;

        if health_check == 1 {
            Ok(())
        } else {
            Err(Error::Persistence(
                log_messages::database::HEALTH_CHECK_FAILED.into(),
            ))
        }
    }
}
