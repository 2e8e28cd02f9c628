//! Generate-then-persist with bounded retries
//!
//! Computing the next code is a read followed by a write that happens
//! elsewhere, so two requests can compute the same code. The store's unique
//! index rejects the later insert; this module treats that rejection as a
//! signal to compute a fresh code and try again, up to a fixed number of
//! attempts.

use super::generator::IdentifierGenerator;
use crate::config::GeneratorSettings;
use crate::domain::config_types::MaxAttempts;
use crate::domain::identifiers::{CodeFamily, GeneratedIdentifier, SequenceWidthExceeded};
use crate::domain::partition::{PartitionClock, SystemClock};
use crate::domain::validation_constants::retry;
use crate::infrastructure::log_messages::creation as messages;
use crate::infrastructure::store::{IdentifierStore, PersistError};
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: MaxAttempts,
    /// Delay before attempt `n + 1` is `backoff * n`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: MaxAttempts, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    pub fn from_settings(settings: &GeneratorSettings) -> Self {
        Self::new(settings.max_attempts, settings.retry_backoff())
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            MaxAttempts::default(),
            Duration::from_millis(retry::DEFAULT_BACKOFF_MS),
        )
    }
}

/// An entity that was persisted under a new code
#[derive(Debug)]
pub struct Created<T> {
    pub value: T,
    pub identifier: GeneratedIdentifier,
    /// 1 when the first computed code was accepted
    pub attempts: u32,
    pub width_warning: Option<SequenceWidthExceeded>,
}

pub struct CreationWorkflow<S, C = SystemClock> {
    generator: IdentifierGenerator<S, C>,
    policy: RetryPolicy,
}

impl<S: IdentifierStore, C: PartitionClock> CreationWorkflow<S, C> {
    pub fn new(generator: IdentifierGenerator<S, C>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    pub fn generator(&self) -> &IdentifierGenerator<S, C> {
        &self.generator
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Persists a new entity under the next free code of `family`
    ///
    /// `persist` is called once per attempt with the candidate code and must
    /// report a unique-constraint rejection as [`PersistError::Conflict`].
    pub async fn create<T, F, Fut>(&self, family: &CodeFamily, persist: F) -> Result<Created<T>>
    where
        F: FnMut(GeneratedIdentifier) -> Fut,
        Fut: Future<Output = std::result::Result<T, PersistError>>,
    {
        self.create_with(family, None, persist).await
    }

    /// Like [`create`](Self::create), but honours a code chosen by the caller
    ///
    /// A supplied code must be in canonical form for `family` (any partition)
    /// and is persisted exactly once; if it is taken the call fails with
    /// [`Error::DuplicateIdentifier`].
    #[instrument(skip(self, persist), fields(family = %family))]
    pub async fn create_with<T, F, Fut>(
        &self,
        family: &CodeFamily,
        supplied: Option<&str>,
        mut persist: F,
    ) -> Result<Created<T>>
    where
        F: FnMut(GeneratedIdentifier) -> Fut,
        Fut: Future<Output = std::result::Result<T, PersistError>>,
    {
        if let Some(raw) = supplied {
            return self.persist_supplied(family, raw, persist).await;
        }

        let max_attempts = self.policy.max_attempts.into_inner();
        for attempt in 1..=max_attempts {
            let issued = self.generator.next_identifier(family).await?;

            match self
                .persist_once(&mut persist, issued.identifier.clone())
                .await
            {
                Ok(value) => {
                    info!(identifier = %issued.identifier, attempt, "{}", messages::COMMITTED);
                    return Ok(Created {
                        value,
                        identifier: issued.identifier,
                        attempts: attempt,
                        width_warning: issued.width_warning,
                    });
                }
                Err(Error::RetryableConflict { identifier }) => {
                    warn!(identifier = %identifier, attempt, max_attempts, "{}", messages::CONFLICT);
                    let delay = self.policy.delay_after(attempt);
                    if attempt < max_attempts && !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }

        error!(attempts = max_attempts, "{}", messages::RETRIES_EXHAUSTED);
        Err(Error::RetriesExhausted {
            family: family.to_string(),
            attempts: max_attempts,
        })
    }

    async fn persist_supplied<T, F, Fut>(
        &self,
        family: &CodeFamily,
        raw: &str,
        mut persist: F,
    ) -> Result<Created<T>>
    where
        F: FnMut(GeneratedIdentifier) -> Fut,
        Fut: Future<Output = std::result::Result<T, PersistError>>,
    {
        let identifier = GeneratedIdentifier::parse_canonical(family, raw)
            .map_err(|err| Error::invalid_input("identifier", err))?;

        match self.persist_once(&mut persist, identifier.clone()).await {
            Ok(value) => {
                info!(identifier = %identifier, "{}", messages::COMMITTED);
                let width_warning = identifier.width_warning();
                Ok(Created {
                    value,
                    identifier,
                    attempts: 1,
                    width_warning,
                })
            }
            Err(Error::RetryableConflict { identifier }) => {
                warn!(identifier = %identifier, "{}", messages::SUPPLIED_DUPLICATE);
                Err(Error::DuplicateIdentifier { identifier })
            }
            Err(other) => Err(other),
        }
    }

    /// One bounded write; conflicts come back as [`Error::RetryableConflict`]
    async fn persist_once<T, F, Fut>(
        &self,
        persist: &mut F,
        identifier: GeneratedIdentifier,
    ) -> Result<T>
    where
        F: FnMut(GeneratedIdentifier) -> Fut,
        Fut: Future<Output = std::result::Result<T, PersistError>>,
    {
        let limit = self.generator.operation_timeout();
        match timeout(limit, persist(identifier)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(PersistError::Conflict { identifier })) => {
                Err(Error::RetryableConflict { identifier })
            }
            Ok(Err(PersistError::Failed(source))) => {
                error!(error = %source, "{}", messages::PERSIST_FAILED);
                Err(Error::Persistence(source))
            }
            Err(_) => {
                error!(after_ms = limit.as_millis(), "{}", messages::PERSIST_TIMEOUT);
                Err(Error::Timeout {
                    operation: "entity persistence",
                    after_ms: limit.as_millis(),
                })
            }
        }
    }
}
