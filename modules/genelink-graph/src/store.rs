use async_trait::async_trait;
use genelink_common::{Config, TagRule};

use crate::client::GraphClient;
use crate::error::LinkError;
use crate::matching::BatchStats;
use crate::poller::IndexStatus;
use crate::{index, matching, tagging};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCreation {
    Created,
    AlreadyExists,
}

/// Database operations the linking run is built from.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn list_analyzers(&self) -> Result<Vec<String>, LinkError>;

    async fn create_fulltext_index(
        &self,
        name: &str,
        analyzer: &str,
    ) -> Result<IndexCreation, LinkError>;

    async fn list_indexes(&self) -> Result<Vec<IndexStatus>, LinkError>;

    /// Apply one exclusion tag; returns how many symbols carry it afterwards.
    async fn tag(&self, rule: TagRule, config: &Config) -> Result<i64, LinkError>;

    async fn link_fragments(&self, config: &Config) -> Result<BatchStats, LinkError>;
}

#[async_trait]
impl LinkStore for GraphClient {
    async fn list_analyzers(&self) -> Result<Vec<String>, LinkError> {
        index::list_analyzers(&self.graph).await
    }

    async fn create_fulltext_index(
        &self,
        name: &str,
        analyzer: &str,
    ) -> Result<IndexCreation, LinkError> {
        index::create_fulltext_index(&self.graph, name, analyzer).await
    }

    async fn list_indexes(&self) -> Result<Vec<IndexStatus>, LinkError> {
        index::list_indexes(&self.graph).await
    }

    async fn tag(&self, rule: TagRule, config: &Config) -> Result<i64, LinkError> {
        tagging::tag(&self.graph, rule, config).await
    }

    async fn link_fragments(&self, config: &Config) -> Result<BatchStats, LinkError> {
        matching::link_fragments(&self.graph, config).await
    }
}

/// In-memory store that records calls, for exercising the run without a database.
#[cfg(any(test, feature = "test-utils"))]
pub mod fake {
    use std::collections::{HashMap, VecDeque};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::cancel::CancelSignal;

    #[derive(Default)]
    pub struct FakeStore {
        analyzers: Vec<String>,
        index_name: String,
        index_states: Mutex<VecDeque<String>>,
        index_exists: bool,
        tag_counts: HashMap<TagRule, i64>,
        linked: i64,
        link_delay: Duration,
        cancel_after: Option<(String, Arc<CancelSignal>)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeStore {
        pub fn with_analyzers(mut self, analyzers: &[&str]) -> Self {
            self.analyzers = analyzers.iter().map(|a| a.to_string()).collect();
            self
        }

        /// States reported by successive listings; the last one repeats.
        pub fn with_index_states(mut self, name: &str, states: &[&str]) -> Self {
            self.index_name = name.to_string();
            self.index_states = Mutex::new(states.iter().map(|s| s.to_string()).collect());
            self
        }

        pub fn with_existing_index(mut self) -> Self {
            self.index_exists = true;
            self
        }

        pub fn with_tag_count(mut self, rule: TagRule, count: i64) -> Self {
            self.tag_counts.insert(rule, count);
            self
        }

        pub fn with_linked(mut self, total: i64) -> Self {
            self.linked = total;
            self
        }

        /// Simulate a slow `apoc.periodic.iterate` pass.
        pub fn with_link_delay(mut self, delay: Duration) -> Self {
            self.link_delay = delay;
            self
        }

        /// Fire `signal` as soon as `call` has been recorded.
        pub fn cancel_after(mut self, call: &str, signal: Arc<CancelSignal>) -> Self {
            self.cancel_after = Some((call.to_string(), signal));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn index_listings(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| c.as_str() == "list_indexes")
                .count()
        }

        fn record(&self, call: impl Into<String>) {
            let call = call.into();
            if let Some((trigger, signal)) = &self.cancel_after {
                if *trigger == call {
                    signal.cancel();
                }
            }
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl LinkStore for FakeStore {
        async fn list_analyzers(&self) -> Result<Vec<String>, LinkError> {
            self.record("list_analyzers");
            Ok(self.analyzers.clone())
        }

        async fn create_fulltext_index(
            &self,
            name: &str,
            analyzer: &str,
        ) -> Result<IndexCreation, LinkError> {
            self.record(format!("create_fulltext_index:{name}:{analyzer}"));
            if self.index_exists {
                Ok(IndexCreation::AlreadyExists)
            } else {
                Ok(IndexCreation::Created)
            }
        }

        async fn list_indexes(&self) -> Result<Vec<IndexStatus>, LinkError> {
            self.record("list_indexes");
            let mut states = self.index_states.lock().unwrap();
            let state = if states.len() > 1 {
                states.pop_front()
            } else {
                states.front().cloned()
            };
            Ok(state
                .map(|state| IndexStatus {
                    name: self.index_name.clone(),
                    state,
                    population_percent: 100.0,
                })
                .into_iter()
                .collect())
        }

        async fn tag(&self, rule: TagRule, _config: &Config) -> Result<i64, LinkError> {
            self.record(format!("tag:{}", rule.label()));
            Ok(self.tag_counts.get(&rule).copied().unwrap_or_default())
        }

        async fn link_fragments(&self, config: &Config) -> Result<BatchStats, LinkError> {
            self.record("link_fragments");
            if !self.link_delay.is_zero() {
                tokio::time::sleep(self.link_delay).await;
            }
            let batch_size = config.batch_size.max(1);
            Ok(BatchStats {
                batches: (self.linked + batch_size - 1) / batch_size,
                total: self.linked,
                ..BatchStats::default()
            })
        }
    }
}
