//! Type-safe configuration types
//!
//! This module provides domain-specific types for configuration values,
//! ensuring validation at boundaries and preventing primitive obsession.

use crate::domain::validation_constants::retry;
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on generate-then-persist attempts for one creation
#[nutype(
    validate(predicate = |attempts| *attempts >= 1 && *attempts <= retry::MAX_ATTEMPTS_LIMIT),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct MaxAttempts(u32);

impl Default for MaxAttempts {
    fn default() -> Self {
        Self::try_new(retry::DEFAULT_MAX_ATTEMPTS).expect("Default max attempts is valid")
    }
}

/// Maximum number of database connections
#[nutype(
    validate(predicate = |count| *count > 0 && *count <= 1000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct MaxConnections(u32);

impl Default for MaxConnections {
    fn default() -> Self {
        Self::try_new(10).expect("Default max connections is valid")
    }
}

/// Table or column name that is interpolated into SQL text
///
/// Restricted to lowercase snake case so it never needs quoting.
#[nutype(
    validate(not_empty, regex = r"^[a-z_][a-z0-9_]{0,62}$"),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Serialize,
        Deserialize,
        AsRef,
        Display
    )
)]
pub struct SqlIdentifier(String);

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Log format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
