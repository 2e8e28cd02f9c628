//! Domain types for sequential document codes
//!
//! This module contains the value types that make up a code and the
//! partition clock, following type-driven development principles.

pub mod config_types;
pub mod identifiers;
pub mod partition;
pub mod validation_constants;

pub use identifiers::*;
pub use partition::*;
