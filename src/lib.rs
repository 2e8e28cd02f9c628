//! doc_sequence - per-partition sequential document codes
//!
//! Issues human-readable codes such as `PPAY2025000001` for retail entities.
//! The next code is computed from the highest one already stored; a unique
//! index on the stored column plus a bounded retry loop keeps codes unique
//! when several requests create entities at the same time.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::{
    Application, Created, CreationWorkflow, IdentifierGenerator, IssuedIdentifier, RetryPolicy,
};
pub use error::{Error, Result};
