//! Concurrent creation tests
//!
//! Many tasks race to create entities in the same partition. The generator's
//! read is racy by nature; these tests check that the unique constraint plus
//! the retry loop still commit a contiguous, duplicate-free set of codes.

use doc_sequence::domain::config_types::MaxAttempts;
use doc_sequence::domain::identifiers::{CodeFamily, GeneratedIdentifier, PartitionKey};
use doc_sequence::domain::partition::FixedClock;
use doc_sequence::infrastructure::InMemoryIdentifierStore;
use doc_sequence::{CreationWorkflow, Error, IdentifierGenerator, RetryPolicy};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tokio::task::JoinSet;

type SharedWorkflow = Arc<CreationWorkflow<Arc<InMemoryIdentifierStore>, FixedClock>>;

fn shared_workflow(store: &Arc<InMemoryIdentifierStore>, attempts: u32) -> SharedWorkflow {
    let generator = IdentifierGenerator::with_clock(
        store.clone(),
        FixedClock::new(PartitionKey::try_new(2025).unwrap()),
    );
    let policy = RetryPolicy::new(MaxAttempts::try_new(attempts).unwrap(), Duration::ZERO);
    Arc::new(CreationWorkflow::new(generator, policy))
}

/// Runs `tasks` concurrent creations; returns the committed sequences and the failures
async fn race(
    store: &Arc<InMemoryIdentifierStore>,
    workflow: SharedWorkflow,
    tasks: usize,
) -> (BTreeSet<u64>, Vec<Error>) {
    let barrier = Arc::new(Barrier::new(tasks));
    let mut set = JoinSet::new();

    for _ in 0..tasks {
        let workflow = workflow.clone();
        let store = store.clone();
        let barrier = barrier.clone();
        set.spawn(async move {
            barrier.wait().await;
            workflow
                .create(&CodeFamily::purchase_payment(), |identifier| {
                    let store = store.clone();
                    async move {
                        // Widen the window between read and write.
                        tokio::task::yield_now().await;
                        store.insert(&identifier).await.map(|()| identifier)
                    }
                })
                .await
        });
    }

    let mut committed = BTreeSet::new();
    let mut failures = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined.expect("creation task panicked") {
            Ok(created) => {
                assert!(
                    committed.insert(created.identifier.sequence().into_inner()),
                    "{} was committed twice",
                    created.identifier
                );
            }
            Err(err) => failures.push(err),
        }
    }
    (committed, failures)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_commit_a_contiguous_range() {
    const TASKS: usize = 16;

    let store = Arc::new(InMemoryIdentifierStore::new());
    let workflow = shared_workflow(&store, TASKS as u32);

    let (committed, failures) = race(&store, workflow, TASKS).await;

    assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    assert_eq!(committed, (1..=TASKS as u64).collect::<BTreeSet<_>>());
    assert_eq!(store.len().await, TASKS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_attempt_policy_surfaces_exhaustion_without_duplicates() {
    const TASKS: usize = 12;

    let store = Arc::new(InMemoryIdentifierStore::new());
    let workflow = shared_workflow(&store, 1);

    let (committed, failures) = race(&store, workflow, TASKS).await;

    assert_eq!(committed.len() + failures.len(), TASKS);
    assert!(!committed.is_empty());
    assert!(failures
        .iter()
        .all(|err| matches!(err, Error::RetriesExhausted { attempts: 1, .. })));
    // Every commit extended the highest code, so the committed set has no holes.
    let count = committed.len() as u64;
    assert_eq!(committed, (1..=count).collect::<BTreeSet<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_continue_after_existing_codes() {
    const TASKS: usize = 8;

    let store = Arc::new(InMemoryIdentifierStore::new());
    let family = CodeFamily::purchase_payment();
    let partition = PartitionKey::try_new(2025).unwrap();
    store
        .insert(&GeneratedIdentifier::parse(&family, partition, "PPAY2025000100").unwrap())
        .await
        .unwrap();
    let workflow = shared_workflow(&store, TASKS as u32);

    let (committed, failures) = race(&store, workflow, TASKS).await;

    assert!(failures.is_empty(), "unexpected failures: {failures:?}");
    assert_eq!(committed, (101..=100 + TASKS as u64).collect::<BTreeSet<_>>());
}
