use anyhow::Result;
use doc_sequence::config::{LoggingSettings, Settings};
use doc_sequence::domain::config_types::LogFormat;
use doc_sequence::Application;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .init(),
        LogFormat::Compact => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new()?;
    init_tracing(&settings.logging);

    info!(environment = ?std::env::var("ENVIRONMENT").ok(), "Starting doc_sequence");

    let app = Application::with_settings(settings).await?;
    app.run().await?;

    Ok(())
}
