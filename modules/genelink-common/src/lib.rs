pub mod config;
pub mod error;
pub mod schema;

pub use config::{Config, Neo4jConnection, PollPolicy, RunMode};
pub use error::ConfigError;
pub use schema::{GeneSchema, TagRule};
