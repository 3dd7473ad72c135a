use std::fmt;

use genelink_common::{Config, TagRule};
use tracing::{error, info};

use crate::cancel::CancelSignal;
use crate::error::LinkError;
use crate::matching::BatchStats;
use crate::poller;
use crate::store::{IndexCreation, LinkStore};

/// What a completed run did.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkReport {
    pub analyzer: String,
    pub index: IndexCreation,
    pub poll_attempts: u32,
    pub tagged: Vec<(TagRule, i64)>,
    pub batches: BatchStats,
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = match self.index {
            IndexCreation::Created => "created",
            IndexCreation::AlreadyExists => "existing",
        };
        write!(
            f,
            "analyzer {}, {} index online after {} checks, tagged [",
            self.analyzer, index, self.poll_attempts
        )?;
        for (i, (rule, count)) in self.tagged.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{rule}: {count}")?;
        }
        write!(f, "], linked {}", self.batches)
    }
}

/// Runs the index setup, tagging and matching steps in order.
pub struct Linker<'a> {
    store: &'a dyn LinkStore,
    config: &'a Config,
    cancel: &'a CancelSignal,
}

impl<'a> Linker<'a> {
    pub fn new(store: &'a dyn LinkStore, config: &'a Config, cancel: &'a CancelSignal) -> Self {
        Self {
            store,
            config,
            cancel,
        }
    }

    pub async fn run(&self) -> Result<LinkReport, LinkError> {
        let config = self.config;
        info!(analyzer = config.analyzer.as_str(), "Custom full-text analyzer");
        info!(index = config.index_name.as_str(), "Full-text index name");

        let cancel = self.cancel;
        cancel.guard(self.require_analyzer()).await?;

        let index = cancel
            .guard(
                self.store
                    .create_fulltext_index(&config.index_name, &config.analyzer),
            )
            .await?;

        let poll_attempts =
            poller::wait_until_online(self.store, &config.index_name, &config.poll, cancel).await?;

        let mut tagged = Vec::with_capacity(TagRule::ALL.len());
        for rule in TagRule::ALL {
            tagged.push((rule, cancel.guard(self.store.tag(rule, config)).await?));
        }

        let batches = cancel.guard(self.store.link_fragments(config)).await?;

        Ok(LinkReport {
            analyzer: config.analyzer.clone(),
            index,
            poll_attempts,
            tagged,
            batches,
        })
    }

    async fn require_analyzer(&self) -> Result<(), LinkError> {
        let available = self.store.list_analyzers().await?;
        if available.iter().any(|a| a == &self.config.analyzer) {
            return Ok(());
        }
        error!(
            analyzer = self.config.analyzer.as_str(),
            "Custom full-text analyzer not available"
        );
        Err(LinkError::AnalyzerUnavailable {
            analyzer: self.config.analyzer.clone(),
            available,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use genelink_common::PollPolicy;

    use super::*;
    use crate::poller::ONLINE;
    use crate::store::fake::FakeStore;

    fn config() -> Config {
        Config {
            poll: PollPolicy {
                interval: Duration::ZERO,
                max_attempts: 5,
            },
            ..Config::default()
        }
    }

    fn ready_store() -> FakeStore {
        FakeStore::default()
            .with_analyzers(&["standard", "german"])
            .with_index_states("fragmentGeneSymbol", &["POPULATING", ONLINE])
    }

    #[tokio::test]
    async fn runs_every_step_in_order() {
        let store = ready_store()
            .with_tag_count(TagRule::SpecialChar, 4)
            .with_tag_count(TagRule::CommonWord, 2)
            .with_linked(25);
        let config = config();
        let cancel = CancelSignal::new();

        let report = Linker::new(&store, &config, &cancel).run().await.unwrap();

        assert_eq!(
            store.calls(),
            vec![
                "list_analyzers",
                "create_fulltext_index:fragmentGeneSymbol:german",
                "list_indexes",
                "list_indexes",
                "tag:OmitSpecialChar",
                "tag:OmitLength",
                "tag:OmitWord",
                "link_fragments",
            ]
        );
        assert_eq!(report.poll_attempts, 2);
        assert_eq!(report.index, IndexCreation::Created);
        assert_eq!(
            report.tagged,
            vec![
                (TagRule::SpecialChar, 4),
                (TagRule::Length, 0),
                (TagRule::CommonWord, 2)
            ]
        );
        assert_eq!(report.batches.total, 25);
        assert_eq!(report.batches.batches, 3);
    }

    #[tokio::test]
    async fn missing_analyzer_stops_before_index_creation() {
        let store = FakeStore::default()
            .with_analyzers(&["standard", "english"])
            .with_index_states("fragmentGeneSymbol", &[ONLINE]);
        let config = config();
        let cancel = CancelSignal::new();

        let err = Linker::new(&store, &config, &cancel).run().await.unwrap_err();

        assert!(matches!(err, LinkError::AnalyzerUnavailable { ref analyzer, .. } if analyzer == "german"));
        assert_eq!(store.calls(), vec!["list_analyzers"]);
    }

    #[tokio::test]
    async fn existing_index_is_not_an_error() {
        let store = ready_store().with_existing_index();
        let config = config();
        let cancel = CancelSignal::new();

        let report = Linker::new(&store, &config, &cancel).run().await.unwrap();

        assert_eq!(report.index, IndexCreation::AlreadyExists);
        assert!(store.calls().contains(&"link_fragments".to_string()));
    }

    #[tokio::test]
    async fn index_that_never_comes_online_skips_tagging() {
        let store = FakeStore::default()
            .with_analyzers(&["german"])
            .with_index_states("fragmentGeneSymbol", &["POPULATING"]);
        let config = config();
        let cancel = CancelSignal::new();

        let err = Linker::new(&store, &config, &cancel).run().await.unwrap_err();

        assert!(matches!(err, LinkError::IndexNotReady { attempts: 5, .. }));
        assert!(!store.calls().iter().any(|c| c.starts_with("tag:")));
    }

    #[test]
    fn report_display_lists_tag_counts() {
        let report = LinkReport {
            analyzer: "german".into(),
            index: IndexCreation::AlreadyExists,
            poll_attempts: 1,
            tagged: vec![(TagRule::SpecialChar, 3), (TagRule::Length, 1)],
            batches: BatchStats {
                batches: 1,
                total: 5,
                ..BatchStats::default()
            },
        };
        assert_eq!(
            report.to_string(),
            "analyzer german, existing index online after 1 checks, tagged [OmitSpecialChar: 3, OmitLength: 1], linked 5 symbols in 1 batches (0s), 0 failed batches"
        );
    }

    #[tokio::test]
    async fn cancel_during_tagging_skips_remaining_steps() {
        let cancel = Arc::new(CancelSignal::new());
        let store = ready_store().cancel_after("tag:OmitSpecialChar", cancel.clone());
        let config = config();

        let err = Linker::new(&store, &config, &cancel).run().await.unwrap_err();

        assert!(matches!(err, LinkError::Cancelled));
        let calls = store.calls();
        assert!(calls.contains(&"tag:OmitSpecialChar".to_string()));
        assert!(!calls.contains(&"tag:OmitLength".to_string()));
        assert!(!calls.contains(&"link_fragments".to_string()));
    }

    #[tokio::test]
    async fn cancel_abandons_a_long_link_pass() {
        let cancel = Arc::new(CancelSignal::new());
        let store = ready_store().with_link_delay(Duration::from_secs(60));
        let config = config();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            Linker::new(&store, &config, &cancel).run(),
        )
        .await
        .expect("cancel should end the run well before the link pass finishes");

        assert!(matches!(result, Err(LinkError::Cancelled)));
        assert!(store.calls().contains(&"link_fragments".to_string()));
    }
}
