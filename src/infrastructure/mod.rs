//! Infrastructure layer for doc_sequence
//!
//! This module contains the persistence adapters the generator reads from
//! and the database plumbing the operator binary uses.

pub mod database;
pub mod log_messages;
pub mod postgres;
pub mod store;

pub use database::*;
pub use postgres::PgIdentifierStore;
pub use store::{IdentifierStore, InMemoryIdentifierStore, PersistError, StoreError};
