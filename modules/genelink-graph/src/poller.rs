//! Waits for the full-text index to finish populating.
//!
//! The index is `Ready` only once a metadata row with the target name
//! reports state `ONLINE`. Every other state (`POPULATING`, `FAILED`, or the
//! index not being listed yet) keeps the poller waiting until the attempt
//! budget runs out or the run is cancelled.

use genelink_common::PollPolicy;
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::error::LinkError;
use crate::store::LinkStore;

pub const ONLINE: &str = "ONLINE";
const FAILED: &str = "FAILED";

/// One row of index metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStatus {
    pub name: String,
    pub state: String,
    pub population_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    NotReady,
    Ready,
}

/// Decide readiness from a single listing.
pub fn evaluate(rows: &[IndexStatus], target: &str) -> IndexState {
    let ready = rows
        .iter()
        .any(|row| row.name == target && row.state == ONLINE);
    if ready {
        IndexState::Ready
    } else {
        IndexState::NotReady
    }
}

/// Poll until `index` is online. Returns the number of listings it took.
pub async fn wait_until_online(
    store: &dyn LinkStore,
    index: &str,
    policy: &PollPolicy,
    cancel: &CancelSignal,
) -> Result<u32, LinkError> {
    info!(
        index,
        max_attempts = policy.max_attempts,
        interval_secs = policy.interval.as_secs(),
        max_wait_secs = policy.max_wait().as_secs(),
        "Waiting for index to come online"
    );

    for attempt in 1..=policy.max_attempts {
        let rows = cancel.guard(store.list_indexes()).await?;
        match rows.iter().find(|row| row.name == index) {
            Some(row) if row.state == FAILED => warn!(
                index,
                attempt,
                state = row.state.as_str(),
                "Index reports FAILED, it will not populate without intervention"
            ),
            Some(row) => debug!(
                index,
                attempt,
                state = row.state.as_str(),
                population_percent = row.population_percent,
                "Index found"
            ),
            None => debug!(index, attempt, "Index not listed yet"),
        }

        if evaluate(&rows, index) == IndexState::Ready {
            info!(index, attempt, "Index is populated");
            return Ok(attempt);
        }

        if attempt < policy.max_attempts {
            info!(
                secs = policy.interval.as_secs(),
                "Waiting before checking the index again"
            );
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(index, attempt, "Index wait cancelled");
                    return Err(LinkError::Cancelled);
                }
                _ = tokio::time::sleep(policy.interval) => {}
            }
        }
    }

    Err(LinkError::IndexNotReady {
        index: index.to_string(),
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::store::fake::FakeStore;

    fn row(name: &str, state: &str) -> IndexStatus {
        IndexStatus {
            name: name.to_string(),
            state: state.to_string(),
            population_percent: 0.0,
        }
    }

    fn quick(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::ZERO,
            max_attempts,
        }
    }

    // --- evaluate ---

    #[test]
    fn online_target_is_ready() {
        let rows = vec![row("other", "POPULATING"), row("frag", ONLINE)];
        assert_eq!(evaluate(&rows, "frag"), IndexState::Ready);
    }

    #[test]
    fn other_index_online_does_not_count() {
        let rows = vec![row("other", ONLINE), row("frag", "POPULATING")];
        assert_eq!(evaluate(&rows, "frag"), IndexState::NotReady);
    }

    #[test]
    fn non_online_states_are_not_ready() {
        for state in ["POPULATING", "FAILED", "online", ""] {
            assert_eq!(
                evaluate(&[row("frag", state)], "frag"),
                IndexState::NotReady,
                "state {state:?} must not be ready"
            );
        }
    }

    #[test]
    fn missing_index_is_not_ready() {
        assert_eq!(evaluate(&[], "frag"), IndexState::NotReady);
    }

    // --- wait_until_online ---

    #[tokio::test]
    async fn returns_once_index_comes_online() {
        let store = FakeStore::default().with_index_states(
            "frag",
            &["POPULATING", "POPULATING", ONLINE],
        );
        let cancel = CancelSignal::new();

        let attempts = wait_until_online(&store, "frag", &quick(10), &cancel)
            .await
            .unwrap();

        assert_eq!(attempts, 3);
        assert_eq!(store.index_listings(), 3);
    }

    #[tokio::test]
    async fn failed_index_keeps_polling_until_budget_runs_out() {
        let store = FakeStore::default().with_index_states("frag", &["FAILED"]);
        let cancel = CancelSignal::new();

        let err = wait_until_online(&store, "frag", &quick(4), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::IndexNotReady { attempts: 4, .. }));
        assert_eq!(store.index_listings(), 4);
    }

    #[tokio::test]
    async fn cancelled_run_stops_before_listing() {
        let store = FakeStore::default().with_index_states("frag", &[ONLINE]);
        let cancel = CancelSignal::new();
        cancel.cancel();

        let err = wait_until_online(&store, "frag", &quick(10), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::Cancelled));
        assert_eq!(store.index_listings(), 0);
    }

    #[tokio::test]
    async fn cancel_interrupts_the_wait_between_listings() {
        let store = FakeStore::default().with_index_states("frag", &["POPULATING"]);
        let cancel = Arc::new(CancelSignal::new());
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });
        let policy = PollPolicy {
            interval: Duration::from_secs(30),
            max_attempts: 10,
        };

        let started = Instant::now();
        let err = wait_until_online(&store, "frag", &policy, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, LinkError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(store.index_listings(), 1);
    }
}
