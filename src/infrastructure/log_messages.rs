//! Log message constants for infrastructure components
//!
//! This module centralizes the log messages so the wording stays consistent
//! between the library and the operator binary. Values travel as structured
//! fields, never inside the message text.

/// Application startup and lifecycle messages
pub mod application {
    pub const STARTING: &str = "Starting doc_sequence status check";
    pub const FINISHED: &str = "Status check finished";
    pub const CONNECTING_TO_DATABASE: &str = "Connecting to database";
}

/// Database-related log messages
pub mod database {
    pub const HEALTH_CHECK_FAILED: &str = "Database health check failed";
    pub const CONNECTION_ESTABLISHED: &str = "Database connection established";
    pub const ENSURING_UNIQUE_INDEX: &str = "Ensuring unique index on identifier column";
}

/// Identifier generation messages
pub mod generator {
    pub const ISSUED: &str = "Issued identifier";
    pub const MALFORMED_EXISTING: &str =
        "Stored identifier does not follow the canonical form; clean up the data before retrying";
    pub const WIDTH_EXCEEDED: &str =
        "Sequence exceeds the configured width; migrate the family to a wider width";
    pub const STORE_TIMEOUT: &str = "Identifier store read timed out";
}

/// Generate-and-persist loop messages
pub mod creation {
    pub const CONFLICT: &str = "Identifier taken by a concurrent writer, retrying";
    pub const COMMITTED: &str = "Entity persisted with identifier";
    pub const RETRIES_EXHAUSTED: &str = "Giving up after repeated identifier conflicts";
    pub const SUPPLIED_DUPLICATE: &str = "Caller-supplied identifier already exists";
    pub const PERSIST_FAILED: &str = "Entity persistence failed";
    pub const PERSIST_TIMEOUT: &str = "Entity persistence timed out";
}

/// Configuration messages
pub mod configuration {
    pub const LOADING_CONFIG: &str = "Loading configuration";
    pub const CONFIG_LOADED: &str = "Configuration loaded successfully";
}
