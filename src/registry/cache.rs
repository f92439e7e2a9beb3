//! Per-stage memoization of normalized result sets
//!
//! Each stage key is either `Ready` with a published result or `Pending` while
//! one caller (the leader) computes it. Callers that arrive during a pending
//! computation subscribe to the leader's `watch` channel and receive the same
//! outcome, success or failure, so a burst of callers costs one computation.
//!
//! A failed computation removes the pending entry: waiters already subscribed
//! see the failure, the next caller starts a fresh attempt. If the leader is
//! dropped mid-computation its entry is cleared and waiters retry. The map
//! lock is only held to inspect or swap entries, so stages never block each
//! other.

use super::model::StageResultSet;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

type Outcome<E> = Result<Arc<StageResultSet>, E>;

enum Entry<E> {
    Ready(Arc<StageResultSet>),
    Pending {
        attempt: u64,
        outcome: watch::Receiver<Option<Outcome<E>>>,
    },
}

struct Slots<E> {
    entries: HashMap<String, Entry<E>>,
    next_attempt: u64,
}

enum Role<E> {
    Leader {
        attempt: u64,
        publish: watch::Sender<Option<Outcome<E>>>,
    },
    Waiter(watch::Receiver<Option<Outcome<E>>>),
}

/// Keyed single-flight cache of stage result sets
///
/// `E` is the error type of the computation; waiters receive a clone of the
/// leader's error.
pub struct StageCache<E> {
    slots: Mutex<Slots<E>>,
}

impl<E> Default for StageCache<E> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: HashMap::new(),
                next_attempt: 0,
            }),
        }
    }
}

impl<E> fmt::Debug for StageCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageCache")
            .field("cached_stages", &self.cached_stages())
            .finish()
    }
}

impl<E> StageCache<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, Slots<E>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the pending entry of `attempt`, if it is still current
    fn settle(&self, stage: &str, attempt: u64, value: Option<Arc<StageResultSet>>) {
        let mut slots = self.slots();
        let current = matches!(
            slots.entries.get(stage),
            Some(Entry::Pending { attempt: pending, .. }) if *pending == attempt
        );
        if !current {
            return;
        }

        match value {
            Some(result) => {
                slots.entries.insert(stage.to_string(), Entry::Ready(result));
            }
            None => {
                slots.entries.remove(stage);
            }
        }
    }

    /// Drops the cached result for `stage`; returns whether one was present
    ///
    /// A computation already in flight still completes for its waiters, but
    /// its result is not published to later callers.
    pub fn invalidate(&self, stage: &str) -> bool {
        matches!(self.slots().entries.remove(stage), Some(Entry::Ready(_)))
    }

    /// Drops every cached result
    pub fn invalidate_all(&self) {
        self.slots().entries.clear();
    }

    /// Stages that currently hold a completed result
    pub fn cached_stages(&self) -> Vec<String> {
        let mut stages: Vec<String> = self
            .slots()
            .entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Ready(_)))
            .map(|(stage, _)| stage.clone())
            .collect();
        stages.sort();
        stages
    }
}

impl<E: Clone> StageCache<E> {
    /// Returns the cached result for `stage`, computing it if absent
    ///
    /// At most one computation per stage runs at a time. Callers waiting on
    /// it share its outcome; errors are handed to those callers and are not
    /// cached.
    pub async fn get_or_try_compute<F, Fut>(
        &self,
        stage: &str,
        compute: F,
    ) -> Result<Arc<StageResultSet>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<StageResultSet, E>>,
    {
        loop {
            let role = {
                let mut slots = self.slots();
                match slots.entries.get(stage) {
                    Some(Entry::Ready(cached)) => {
                        debug!(stage, "Stage cache hit");
                        return Ok(Arc::clone(cached));
                    }
                    Some(Entry::Pending { outcome, .. }) => Role::Waiter(outcome.clone()),
                    None => {
                        let attempt = slots.next_attempt;
                        slots.next_attempt += 1;
                        let (publish, outcome) = watch::channel(None);
                        slots
                            .entries
                            .insert(stage.to_string(), Entry::Pending { attempt, outcome });
                        Role::Leader { attempt, publish }
                    }
                }
            };

            match role {
                Role::Leader { attempt, publish } => {
                    debug!(stage, "Stage cache miss, computing");
                    let guard = PendingGuard {
                        cache: self,
                        stage,
                        attempt,
                        settled: false,
                    };

                    let outcome = compute().await.map(Arc::new);
                    guard.settle(outcome.as_ref().ok().cloned());
                    publish.send_replace(Some(outcome.clone()));
                    return outcome;
                }
                Role::Waiter(mut pending) => {
                    debug!(stage, "Stage computation in flight, waiting");
                    let shared = pending
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|seen| (*seen).clone());

                    match shared {
                        Some(outcome) => return outcome,
                        // leader dropped before publishing; compete again
                        None => continue,
                    }
                }
            }
        }
    }
}

/// Clears a leader's pending entry if the leader never settles it
struct PendingGuard<'a, E> {
    cache: &'a StageCache<E>,
    stage: &'a str,
    attempt: u64,
    settled: bool,
}

impl<E> PendingGuard<'_, E> {
    fn settle(mut self, value: Option<Arc<StageResultSet>>) {
        self.cache.settle(self.stage, self.attempt, value);
        self.settled = true;
    }
}

impl<E> Drop for PendingGuard<'_, E> {
    fn drop(&mut self) {
        if !self.settled {
            self.cache.settle(self.stage, self.attempt, None);
        }
    }
}
