use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("NEO4J is not valid JSON, even after quote substitution: {0}")]
    InvalidConnectionBlob(#[source] serde_json::Error),

    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("Unknown gene schema {0:?} (expected \"gene-symbol\" or \"typed-gene\")")]
    UnknownSchema(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
