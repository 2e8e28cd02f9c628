use crate::domain::config_types::{LogFormat, LogLevel, MaxAttempts, MaxConnections, SqlIdentifier};
use crate::domain::identifiers::CodeFamily;
use crate::domain::validation_constants::{code_prefix, retry, sequence_width};
pub use config::ConfigError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub generator: GeneratorSettings,
    pub logging: LoggingSettings,
    #[serde(default = "default_families")]
    pub families: Vec<FamilySettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database_name: String,
    pub max_connections: MaxConnections,
    pub ensure_indexes: bool,
}

impl DatabaseSettings {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorSettings {
    pub max_attempts: MaxAttempts,
    pub retry_backoff_ms: u64,
    pub operation_timeout_ms: u64,
}

impl GeneratorSettings {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

/// One entity family and the column its codes are stored in
#[derive(Debug, Deserialize, Clone)]
pub struct FamilySettings {
    pub prefix: String,
    pub width: u8,
    pub table: SqlIdentifier,
    pub column: SqlIdentifier,
}

impl FamilySettings {
    pub fn family(&self) -> crate::Result<CodeFamily> {
        CodeFamily::from_parts(&self.prefix, self.width)
    }
}

fn default_families() -> Vec<FamilySettings> {
    vec![FamilySettings {
        prefix: code_prefix::PURCHASE_PAYMENT.to_string(),
        width: sequence_width::PURCHASE_PAYMENT,
        table: SqlIdentifier::try_new("purchase_payments".to_string())
            .expect("Default table name is valid"),
        column: SqlIdentifier::try_new("payment_number".to_string())
            .expect("Default column name is valid"),
    }]
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.username", "postgres")?
            .set_default("database.password", "password")?
            .set_default("database.database_name", "doc_sequence")?
            .set_default("database.max_connections", 10)?
            .set_default("database.ensure_indexes", true)?
            .set_default("generator.max_attempts", i64::from(retry::DEFAULT_MAX_ATTEMPTS))?
            .set_default("generator.retry_backoff_ms", retry::DEFAULT_BACKOFF_MS)?
            .set_default(
                "generator.operation_timeout_ms",
                retry::DEFAULT_OPERATION_TIMEOUT_MS,
            )?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("DOC_SEQUENCE").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Validated families, in configuration order
    pub fn code_families(&self) -> crate::Result<Vec<(CodeFamily, &FamilySettings)>> {
        self.families
            .iter()
            .map(|settings| settings.family().map(|family| (family, settings)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_can_be_loaded() {
        let settings = Settings::new().unwrap();
        assert_eq!(
            settings.generator.max_attempts.into_inner(),
            retry::DEFAULT_MAX_ATTEMPTS
        );
        assert!(settings.generator.operation_timeout() > Duration::ZERO);
    }

    #[test]
    fn test_database_url_format() {
        let settings = Settings::new().unwrap();
        let url = settings.database.url();
        assert!(url.starts_with("postgres://"));
        assert!(url.contains(&settings.database.username));
        assert!(url.contains(&settings.database.database_name));
    }

    #[test]
    fn test_default_family_is_purchase_payment() {
        let settings = Settings::new().unwrap();
        let families = settings.code_families().unwrap();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].0, CodeFamily::purchase_payment());
        assert_eq!(families[0].1.table.as_ref(), "purchase_payments");
    }
}
