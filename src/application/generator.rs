//! Next-code computation
//!
//! Reads the highest stored code of the current partition and formats its
//! successor. Nothing is written and nothing is cached between calls: two
//! concurrent callers can compute the same code, and the store's uniqueness
//! constraint decides which of them keeps it (see [`super::creation`]).

use crate::domain::identifiers::{
    CodeFamily, GeneratedIdentifier, PartitionKey, SequenceWidthExceeded,
};
use crate::domain::partition::{PartitionClock, SystemClock};
use crate::domain::validation_constants::retry;
use crate::infrastructure::log_messages::generator as messages;
use crate::infrastructure::store::IdentifierStore;
use crate::{Error, Result};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

/// A freshly computed code, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedIdentifier {
    pub identifier: GeneratedIdentifier,
    pub width_warning: Option<SequenceWidthExceeded>,
}

pub struct IdentifierGenerator<S, C = SystemClock> {
    store: S,
    clock: C,
    operation_timeout: Duration,
}

impl<S: IdentifierStore> IdentifierGenerator<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: IdentifierStore, C: PartitionClock> IdentifierGenerator<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            operation_timeout: Duration::from_millis(retry::DEFAULT_OPERATION_TIMEOUT_MS),
        }
    }

    /// Bounds each store read
    pub fn with_operation_timeout(mut self, operation_timeout: Duration) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Next code of `family` in the partition the clock reports now
    ///
    /// The partition is read once; a rollover while the store query is in
    /// flight still yields a code in the old partition.
    #[instrument(skip(self), fields(family = %family))]
    pub async fn next_identifier(&self, family: &CodeFamily) -> Result<IssuedIdentifier> {
        let partition = self.clock.current_partition()?;
        self.next_identifier_in(family, partition).await
    }

    /// Next code of `family` in an explicit partition
    #[instrument(skip(self), fields(family = %family, partition = %partition))]
    pub async fn next_identifier_in(
        &self,
        family: &CodeFamily,
        partition: PartitionKey,
    ) -> Result<IssuedIdentifier> {
        let pattern = GeneratedIdentifier::partition_pattern(family, partition);
        let highest = timeout(
            self.operation_timeout,
            self.store.find_highest_matching(&pattern),
        )
        .await
        .map_err(|_| {
            warn!(pattern = %pattern, "{}", messages::STORE_TIMEOUT);
            Error::Timeout {
                operation: "identifier store read",
                after_ms: self.operation_timeout.as_millis(),
            }
        })??;

        let identifier = match highest {
            None => GeneratedIdentifier::first_in(family, partition),
            Some(raw) => GeneratedIdentifier::parse(family, partition, &raw)
                .inspect_err(|err| error!(value = %raw, error = %err, "{}", messages::MALFORMED_EXISTING))?
                .successor()?,
        };

        let width_warning = identifier.width_warning();
        if let Some(warning) = &width_warning {
            warn!(
                identifier = %identifier,
                width = warning.width,
                "{}",
                messages::WIDTH_EXCEEDED
            );
        }

        debug!(identifier = %identifier, "{}", messages::ISSUED);
        Ok(IssuedIdentifier {
            identifier,
            width_warning,
        })
    }
}
