use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("Failed to decode result row: {0}")]
    Decode(#[from] neo4rs::DeError),

    #[error("Full-text analyzer {analyzer:?} is not available (have: {})", .available.join(", "))]
    AnalyzerUnavailable {
        analyzer: String,
        available: Vec<String>,
    },

    #[error("Index {index:?} did not come online after {attempts} attempts")]
    IndexNotReady { index: String, attempts: u32 },

    #[error("Run cancelled")]
    Cancelled,
}
