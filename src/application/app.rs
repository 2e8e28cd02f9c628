use super::generator::IdentifierGenerator;
use crate::config::Settings;
use crate::domain::identifiers::{GeneratedIdentifier, SequenceWidthExceeded};
use crate::infrastructure::log_messages;
use crate::infrastructure::{Database, PgIdentifierStore};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};

/// Next code per configured family, as the operator sees it
#[derive(Debug, Serialize)]
pub struct FamilyStatus {
    pub family: String,
    pub table: String,
    pub column: String,
    pub next_identifier: GeneratedIdentifier,
    pub width_warning: Option<SequenceWidthExceeded>,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub generated_at: DateTime<Utc>,
    pub families: Vec<FamilyStatus>,
}

/// Operator entry point: checks the database and previews the next codes
pub struct Application {
    settings: Settings,
    database: Database,
}

impl Application {
    #[instrument]
    pub async fn new() -> Result<Self> {
        info!("{}", log_messages::configuration::LOADING_CONFIG);
        let settings = Settings::new()?;
        info!("{}", log_messages::configuration::CONFIG_LOADED);
        Self::with_settings(settings).await
    }

    #[instrument(skip(settings))]
    pub async fn with_settings(settings: Settings) -> Result<Self> {
        let database = Database::connect(&settings.database).await?;
        database.health_check().await?;
        Ok(Self { settings, database })
    }

    /// Previews the next code of every configured family without persisting it
    #[instrument(skip(self))]
    pub async fn status_report(&self) -> Result<StatusReport> {
        let mut families = Vec::new();

        for (family, family_settings) in self.settings.code_families()? {
            let store = PgIdentifierStore::new(
                self.database.pool().clone(),
                family_settings.table.clone(),
                family_settings.column.clone(),
            );
            if self.settings.database.ensure_indexes {
                store.ensure_unique_index().await?;
            }

            let generator = IdentifierGenerator::new(store)
                .with_operation_timeout(self.settings.generator.operation_timeout());
            let issued = generator.next_identifier(&family).await?;

            families.push(FamilyStatus {
                family: family.to_string(),
                table: family_settings.table.to_string(),
                column: family_settings.column.to_string(),
                next_identifier: issued.identifier,
                width_warning: issued.width_warning,
            });
        }

        Ok(StatusReport {
            generated_at: Utc::now(),
            families,
        })
    }

    #[instrument(skip(self))]
    pub async fn run(self) -> Result<()> {
        info!(
            families = self.settings.families.len(),
            "{}",
            log_messages::application::STARTING
        );

        let report = self.status_report().await?;
        println!("{}", serde_json::to_string_pretty(&report)?);

        info!("{}", log_messages::application::FINISHED);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}
