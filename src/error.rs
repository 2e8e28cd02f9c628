use crate::infrastructure::store::StoreError;
use thiserror::Error;

/// doc_sequence error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Identifier store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value in the partition does not follow the canonical form.
    /// Never retried: the data needs cleanup before generation can continue.
    #[error("Malformed identifier {value:?} stored for {family}: {reason}")]
    MalformedExistingData {
        family: String,
        value: String,
        reason: String,
    },

    /// Another writer committed the same identifier first.
    #[error("Identifier {identifier} was taken by a concurrent writer")]
    RetryableConflict { identifier: String },

    #[error("Could not generate a unique {family} identifier after {attempts} attempts, please try again")]
    RetriesExhausted { family: String, attempts: u32 },

    #[error("Identifier {identifier} is already in use")]
    DuplicateIdentifier { identifier: String },

    #[error("Sequence for {family} in partition {partition} cannot advance further")]
    SequenceOverflow { family: String, partition: String },

    #[error("{operation} timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u128,
    },

    #[error("Persistence failed: {0}")]
    Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },
}

impl Error {
    pub fn malformed(
        family: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedExistingData {
            family: family.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the generate-then-persist loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableConflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
