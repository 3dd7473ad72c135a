use std::future::Future;

use genelink_common::{Config, GeneSchema, RunMode};
use genelink_graph::{CancelSignal, LinkError, LinkReport, LinkStore, Linker};
use tracing::info;

/// Exit status for a run cancelled by Ctrl-C.
pub const EXIT_CANCELLED: u8 = 130;

#[derive(Debug)]
pub enum Outcome {
    /// `RUN_MODE=test`: nothing touched the database.
    Skipped,
    Linked(LinkReport),
}

/// Command-line settings that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub schema: Option<GeneSchema>,
    pub analyzer: Option<String>,
    pub index_name: Option<String>,
    pub batch_size: Option<i64>,
    pub min_symbol_length: Option<i64>,
    pub poll_interval_secs: Option<u64>,
    pub max_poll_attempts: Option<u32>,
    pub test: bool,
}

impl Overrides {
    pub fn apply(self, config: &mut Config) {
        if let Some(schema) = self.schema {
            // Follow the schema's analyzer unless one was chosen explicitly
            if config.analyzer == config.schema.default_analyzer() {
                config.analyzer = schema.default_analyzer().to_string();
            }
            config.schema = schema;
        }
        if let Some(analyzer) = self.analyzer {
            config.analyzer = analyzer;
        }
        if let Some(index_name) = self.index_name {
            config.index_name = index_name;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(min) = self.min_symbol_length {
            config.min_symbol_length = min;
        }
        if let Some(secs) = self.poll_interval_secs {
            config.poll.interval = std::time::Duration::from_secs(secs);
        }
        if let Some(attempts) = self.max_poll_attempts {
            config.poll.max_attempts = attempts;
        }
        if self.test {
            config.run_mode = RunMode::Test;
        }
    }
}

/// Connect and link, unless the run mode says to stay away from the database.
pub async fn run<S, F, Fut>(
    config: &Config,
    cancel: &CancelSignal,
    connect: F,
) -> Result<Outcome, LinkError>
where
    S: LinkStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<S, LinkError>>,
{
    if config.run_mode == RunMode::Test {
        info!("RUN_MODE=test, there are no tests yet; skipping database work");
        return Ok(Outcome::Skipped);
    }

    let store = cancel.guard(connect()).await?;
    info!("Connected to Neo4j");

    let report = Linker::new(&store, config, cancel).run().await?;
    Ok(Outcome::Linked(report))
}

pub fn exit_status(result: &Result<Outcome, LinkError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(LinkError::Cancelled) => EXIT_CANCELLED,
        Err(_) => 1,
    }
}
