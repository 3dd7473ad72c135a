use std::fmt;

use genelink_common::{Config, GeneSchema, TagRule};
use neo4rs::{query, Graph, Query};
use tracing::{info, warn};

use crate::error::LinkError;

/// Summary yielded by `apoc.periodic.iterate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub batches: i64,
    pub total: i64,
    pub time_taken_secs: i64,
    pub failed_batches: i64,
    pub failed_operations: i64,
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} symbols in {} batches ({}s), {} failed batches",
            self.total, self.batches, self.time_taken_secs, self.failed_batches
        )
    }
}

/// Outer statement: every gene symbol that no exclusion rule tagged.
pub fn untagged_symbols_cypher(schema: GeneSchema) -> String {
    format!(
        "MATCH {} WHERE {} RETURN gs",
        schema.node_pattern(),
        TagRule::untagged_predicate()
    )
}

/// Inner statement, run per batch. `$index` arrives through the iterate params.
pub const LINK_FRAGMENTS_CYPHER: &str = "CALL db.index.fulltext.queryNodes($index, gs.sid) YIELD node, score
MERGE (gs)<-[r:MENTIONS]-(node)
SET r.score = score";

const ITERATE: &str = "CALL apoc.periodic.iterate($outer, $inner, {
    batchSize: $batch_size,
    parallel: false,
    iterateList: true,
    params: {index: $index}
})
YIELD batches, total, timeTaken, failedBatches, failedOperations
RETURN batches, total, timeTaken, failedBatches, failedOperations";

fn link_query(config: &Config) -> Query {
    query(ITERATE)
        .param("outer", untagged_symbols_cypher(config.schema))
        .param("inner", LINK_FRAGMENTS_CYPHER)
        .param("batch_size", config.batch_size)
        .param("index", config.index_name.as_str())
}

/// Link every untagged gene symbol to the fragments the full-text index
/// matches it against, recording the relevance score on `MENTIONS`.
pub async fn link_fragments(g: &Graph, config: &Config) -> Result<BatchStats, LinkError> {
    info!(
        index = config.index_name.as_str(),
        batch_size = config.batch_size,
        "Matching gene symbols against fragment full-text index"
    );

    let mut stream = g.execute(link_query(config)).await?;
    let stats = match stream.next().await? {
        Some(row) => BatchStats {
            batches: row.get("batches")?,
            total: row.get("total")?,
            time_taken_secs: row.get("timeTaken")?,
            failed_batches: row.get("failedBatches")?,
            failed_operations: row.get("failedOperations")?,
        },
        None => BatchStats::default(),
    };

    if stats.failed_batches > 0 {
        warn!(
            failed_batches = stats.failed_batches,
            failed_operations = stats.failed_operations,
            "Some link batches failed"
        );
    }
    info!(
        batches = stats.batches,
        total = stats.total,
        time_taken_secs = stats.time_taken_secs,
        "Fragment matching complete"
    );
    Ok(stats)
}
