use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use genelink::{exit_status, Outcome, Overrides, EXIT_CANCELLED};
use genelink_common::{Config, GeneSchema};
use genelink_graph::{CancelSignal, GraphClient, LinkError};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "genelink",
    about = "Link gene symbols to text fragments through a Neo4j full-text index"
)]
struct Cli {
    /// Gene symbol node shape: gene-symbol or typed-gene
    #[arg(long)]
    schema: Option<GeneSchema>,

    /// Full-text analyzer the index must be built with
    #[arg(long)]
    analyzer: Option<String>,

    /// Name of the fragment full-text index
    #[arg(long)]
    index_name: Option<String>,

    /// Gene symbols per apoc.periodic.iterate batch
    #[arg(long)]
    batch_size: Option<i64>,

    /// Symbols shorter than this are excluded from matching
    #[arg(long)]
    min_symbol_length: Option<i64>,

    /// Seconds between index status checks
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Give up waiting for the index after this many checks
    #[arg(long)]
    max_poll_attempts: Option<u32>,

    /// Skip all database work (same as RUN_MODE=test)
    #[arg(long)]
    test: bool,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            schema: self.schema,
            analyzer: self.analyzer.clone(),
            index_name: self.index_name.clone(),
            batch_size: self.batch_size,
            min_symbol_length: self.min_symbol_length,
            poll_interval_secs: self.poll_interval_secs,
            max_poll_attempts: self.max_poll_attempts,
            test: self.test,
        }
    }
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("genelink=info".parse()?)
        .add_directive("neo4rs=warn".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    info!("genelink starting...");

    let mut config = Config::from_env()?;
    cli.overrides().apply(&mut config);
    config.validate()?;
    config.log_redacted();

    let cancel = Arc::new(CancelSignal::new());
    let signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received, cancelling run (press Ctrl-C again to exit now)");
        signal.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(EXIT_CANCELLED.into());
        }
    });

    let result = genelink::run(&config, &cancel, || async {
        GraphClient::connect_with(&config.connection)
            .await
            .map_err(LinkError::from)
    })
    .await;

    match &result {
        Ok(Outcome::Skipped) => info!("Nothing to do in test mode"),
        Ok(Outcome::Linked(report)) => info!("Link run complete. {report}"),
        Err(e) => error!(error = %e, "Link run failed"),
    }

    Ok(ExitCode::from(exit_status(&result)))
}
