//! Application services and business logic orchestration
//!
//! This module contains the identifier generator, the retrying creation
//! workflow built on top of it, and the operator application.

pub mod app;
pub mod creation;
pub mod generator;

pub use app::Application;
pub use creation::{Created, CreationWorkflow, RetryPolicy};
pub use generator::{IdentifierGenerator, IssuedIdentifier};
