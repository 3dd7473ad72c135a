use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;
use crate::schema::GeneSchema;

pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_NEO4J_USER: &str = "neo4j";
pub const DEFAULT_NEO4J_PASSWORD: &str = "test";

pub const DEFAULT_INDEX_NAME: &str = "fragmentGeneSymbol";
pub const DEFAULT_MIN_SYMBOL_LENGTH: i64 = 2;
pub const DEFAULT_BATCH_SIZE: i64 = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 360;

/// Characters that break a Lucene query when a symbol is passed through verbatim.
pub const DEFAULT_SPECIAL_CHARS: [&str; 8] = ["(", ")", "/", "*", " ", "[", "]", ":"];

/// Bolt connection parameters.
///
/// Deserializable so the single-variable `NEO4J` blob can carry them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Neo4jConnection {
    #[serde(alias = "url", alias = "host", default = "default_uri")]
    pub uri: String,
    #[serde(alias = "username", default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
}

fn default_uri() -> String {
    DEFAULT_NEO4J_URI.to_string()
}

fn default_user() -> String {
    DEFAULT_NEO4J_USER.to_string()
}

fn default_password() -> String {
    DEFAULT_NEO4J_PASSWORD.to_string()
}

impl Default for Neo4jConnection {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
        }
    }
}

impl Neo4jConnection {
    /// `NEO4J` (JSON blob) wins when present; otherwise the discrete
    /// `GC_NEO4J_*` variables are read, each with a default.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(blob) = lookup("NEO4J") {
            return parse_connection_blob(&blob);
        }
        Ok(Self {
            uri: lookup("GC_NEO4J_URL").unwrap_or_else(default_uri),
            user: lookup("GC_NEO4J_USER").unwrap_or_else(default_user),
            password: lookup("GC_NEO4J_PASSWORD").unwrap_or_else(default_password),
        })
    }
}

/// Parse a JSON connection object. Deployments commonly hand this over
/// with single quotes, so a failed strict parse is retried once with every
/// `'` swapped for `"`.
pub fn parse_connection_blob(raw: &str) -> Result<Neo4jConnection, ConfigError> {
    match serde_json::from_str(raw) {
        Ok(conn) => Ok(conn),
        Err(_) => serde_json::from_str(&raw.replace('\'', "\""))
            .map_err(ConfigError::InvalidConnectionBlob),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Prod,
    /// No database interaction at all.
    Test,
}

impl RunMode {
    /// Anything other than `test` (any case) is a production run.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("test") {
            RunMode::Test
        } else {
            RunMode::Prod
        }
    }
}

/// Bounds on how long to wait for the full-text index to come online.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Upper bound on wall time spent sleeping between polls.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Everything a run needs, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub connection: Neo4jConnection,
    pub run_mode: RunMode,
    pub schema: GeneSchema,
    pub index_name: String,
    pub analyzer: String,
    pub special_chars: Vec<String>,
    pub min_symbol_length: i64,
    pub batch_size: i64,
    pub poll: PollPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let schema = GeneSchema::default();
        Self {
            connection: Neo4jConnection::default(),
            run_mode: RunMode::default(),
            schema,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            analyzer: schema.default_analyzer().to_string(),
            special_chars: DEFAULT_SPECIAL_CHARS.iter().map(|c| c.to_string()).collect(),
            min_symbol_length: DEFAULT_MIN_SYMBOL_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
            poll: PollPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let schema = match lookup("GENE_SCHEMA") {
            Some(s) => s.parse()?,
            None => GeneSchema::default(),
        };
        let interval_secs: u64 = parse_or(
            lookup,
            "INDEX_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL.as_secs(),
        )?;

        let config = Self {
            connection: Neo4jConnection::from_lookup(lookup)?,
            run_mode: lookup("RUN_MODE")
                .map(|m| RunMode::parse(&m))
                .unwrap_or_default(),
            schema,
            index_name: lookup("FULLTEXT_INDEX_NAME")
                .unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            analyzer: lookup("FULLTEXT_ANALYZER")
                .unwrap_or_else(|| schema.default_analyzer().to_string()),
            special_chars: DEFAULT_SPECIAL_CHARS.iter().map(|c| c.to_string()).collect(),
            min_symbol_length: parse_or(lookup, "MIN_SYMBOL_LENGTH", DEFAULT_MIN_SYMBOL_LENGTH)?,
            batch_size: parse_or(lookup, "LINK_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
            poll: PollPolicy {
                interval: Duration::from_secs(interval_secs),
                max_attempts: parse_or(lookup, "INDEX_POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS)?,
            },
        };
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index_name.trim().is_empty() {
            return Err(ConfigError::Validation("index name must not be empty".into()));
        }
        if self.analyzer.trim().is_empty() {
            return Err(ConfigError::Validation("analyzer must not be empty".into()));
        }
        if self.batch_size < 1 {
            return Err(ConfigError::Validation(format!(
                "batch size must be at least 1, got {}",
                self.batch_size
            )));
        }
        if self.min_symbol_length < 1 {
            return Err(ConfigError::Validation(format!(
                "minimum symbol length must be at least 1, got {}",
                self.min_symbol_length
            )));
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::Validation(
                "index poll needs at least one attempt".into(),
            ));
        }
        Ok(())
    }

    /// Log every setting, masking the password.
    pub fn log_redacted(&self) {
        info!(
            uri = self.connection.uri.as_str(),
            user = self.connection.user.as_str(),
            password = redact(&self.connection.password),
            run_mode = ?self.run_mode,
            schema = %self.schema,
            "Connection config"
        );
        info!(
            index = self.index_name.as_str(),
            analyzer = self.analyzer.as_str(),
            min_symbol_length = self.min_symbol_length,
            batch_size = self.batch_size,
            poll_interval_secs = self.poll.interval.as_secs(),
            poll_max_attempts = self.poll.max_attempts,
            "Link config"
        );
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(empty)"
    } else {
        "********"
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            key: key.to_string(),
            value,
        }),
    }
}
