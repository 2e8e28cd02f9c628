//! Source of the partition a new code is issued in

use crate::domain::identifiers::PartitionKey;
use crate::Result;
use chrono::{Datelike, Utc};

/// Decides which partition "now" belongs to
pub trait PartitionClock: Send + Sync {
    fn current_partition(&self) -> Result<PartitionKey>;
}

/// Current UTC calendar year from the wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl PartitionClock for SystemClock {
    fn current_partition(&self) -> Result<PartitionKey> {
        PartitionKey::from_year(Utc::now().year())
    }
}

/// Always reports the same partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(PartitionKey);

impl FixedClock {
    pub fn new(partition: PartitionKey) -> Self {
        Self(partition)
    }
}

impl PartitionClock for FixedClock {
    fn current_partition(&self) -> Result<PartitionKey> {
        Ok(self.0)
    }
}
