//! Validation constants for domain types
//!
//! This module centralizes the limits and defaults used by the identifier
//! newtypes so the canonical form is defined in exactly one place.

/// Entity family prefix constants
pub mod code_prefix {
    /// Maximum prefix length
    pub const MAX_LENGTH: usize = 8;

    /// Purchase payment numbers
    pub const PURCHASE_PAYMENT: &str = "PPAY";
}

/// Partition key constants (four-digit calendar year)
pub mod partition_key {
    pub const MIN_YEAR: u16 = 1000;
    pub const MAX_YEAR: u16 = 9999;
    pub const DIGITS: usize = 4;
}

/// Zero-padded sequence width constants
pub mod sequence_width {
    pub const MIN: u8 = 1;

    /// 10^18 - 1 still fits in a u64 sequence
    pub const MAX: u8 = 18;

    /// Width used for purchase payment numbers
    pub const PURCHASE_PAYMENT: u8 = 6;
}

/// Generate-and-persist retry constants
pub mod retry {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const MAX_ATTEMPTS_LIMIT: u32 = 20;
    pub const DEFAULT_BACKOFF_MS: u64 = 25;
    pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;
}
