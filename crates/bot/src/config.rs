//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LINE_CHANNEL_ACCESS_TOKEN` - Messaging API channel access token
//! - `LINE_CHANNEL_SECRET` - Channel secret for webhook signatures
//! - `NEO4J_URI` + `NEO4J_PASSWORD`, or `CATALOG_PATH` for the in-memory graph
//!
//! ## Optional
//! - `BOT_HOST` - Bind address (default: 127.0.0.1)
//! - `BOT_PORT` - Listen port (default: 5000)
//! - `LINE_API_BASE` - Messaging API base URL (default: <https://api.line.me>)
//! - `NEO4J_USER` - Neo4j user (default: neo4j)
//! - `EMBEDDING_API_KEY` - Enables the remote embedding service
//! - `EMBEDDING_API_URL` - Embeddings endpoint (default: `OpenAI`)
//! - `EMBEDDING_MODEL` - Embedding model (default: text-embedding-3-small)
//! - `INTENT_EXAMPLES_PATH` - Training phrases YAML (default: embedded)
//! - `GRAPH_TIMEOUT_SECS` - Graph statement timeout (default: 10)
//! - `HTTP_TIMEOUT_SECS` - Outbound HTTP timeout (default: 10)
//! - `TITLE_CACHE_TTL_SECS` - Product title cache lifetime (default: 300)
//! - `LOG_FORMAT` - `json` for structured logs, text otherwise
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::line::LINE_API_BASE;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Bot application configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// LINE Messaging API credentials
    pub line: LineConfig,
    /// Graph backend
    pub graph: GraphConfig,
    /// Remote embedding service (optional, local embedder otherwise)
    pub embedding: Option<EmbeddingConfig>,
    /// Training phrases file (optional, embedded set otherwise)
    pub intent_examples_path: Option<PathBuf>,
    /// Timeout for each graph statement
    pub graph_timeout: Duration,
    /// Timeout for outbound HTTP calls
    pub http_timeout: Duration,
    /// How long product titles stay cached
    pub title_cache_ttl: Duration,
    /// Emit JSON logs
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// LINE Messaging API configuration.
///
/// Implements `Debug` manually to redact the credentials.
#[derive(Clone)]
pub struct LineConfig {
    /// Channel access token for the reply API
    pub channel_access_token: SecretString,
    /// Channel secret for webhook signature verification
    pub channel_secret: SecretString,
    /// API base URL
    pub api_base: String,
}

impl std::fmt::Debug for LineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineConfig")
            .field("channel_access_token", &"[REDACTED]")
            .field("channel_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Where products, carts and history are stored.
#[derive(Debug, Clone)]
pub enum GraphConfig {
    /// Neo4j over Bolt.
    Neo4j(Neo4jConfig),
    /// In-process graph seeded from a catalog file.
    Memory { catalog_path: PathBuf },
}

/// Neo4j connection settings.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: SecretString,
}

impl std::fmt::Debug for Neo4jConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Remote embedding service configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct EmbeddingConfig {
    pub api_key: SecretString,
    pub url: String,
    pub model: String,
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_key", &"[REDACTED]")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let host = env
            .or_default("BOT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOT_HOST".to_string(), e.to_string()))?;
        let port = env.parsed("BOT_PORT", 5000_u16)?;

        let line = LineConfig::from_env(&env)?;
        let graph = GraphConfig::from_env(&env)?;
        let embedding = EmbeddingConfig::from_env(&env)?;

        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            line,
            graph,
            embedding,
            intent_examples_path: env.optional("INTENT_EXAMPLES_PATH").map(PathBuf::from),
            graph_timeout: Duration::from_secs(env.parsed("GRAPH_TIMEOUT_SECS", 10)?),
            http_timeout: Duration::from_secs(env.parsed("HTTP_TIMEOUT_SECS", 10)?),
            title_cache_ttl: Duration::from_secs(env.parsed("TITLE_CACHE_TTL_SECS", 300)?),
            json_logs: env
                .optional("LOG_FORMAT")
                .is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Settings for the operator CLI, which never talks to LINE.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// `None` when neither `NEO4J_URI` nor `CATALOG_PATH` is set.
    pub graph: Option<GraphConfig>,
    pub embedding: Option<EmbeddingConfig>,
    pub intent_examples_path: Option<PathBuf>,
    pub graph_timeout: Duration,
    pub http_timeout: Duration,
}

impl ToolConfig {
    /// Load from environment variables and `.env`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load through a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable is invalid.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let graph = if env.optional("NEO4J_URI").is_some() || env.optional("CATALOG_PATH").is_some()
        {
            Some(GraphConfig::from_env(&env)?)
        } else {
            None
        };

        Ok(Self {
            graph,
            embedding: EmbeddingConfig::from_env(&env)?,
            intent_examples_path: env.optional("INTENT_EXAMPLES_PATH").map(PathBuf::from),
            graph_timeout: Duration::from_secs(env.parsed("GRAPH_TIMEOUT_SECS", 10)?),
            http_timeout: Duration::from_secs(env.parsed("HTTP_TIMEOUT_SECS", 10)?),
        })
    }

    /// The configured graph backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no backend is configured.
    pub fn graph(&self) -> Result<&GraphConfig, ConfigError> {
        self.graph
            .as_ref()
            .ok_or_else(|| ConfigError::MissingEnvVar("NEO4J_URI or CATALOG_PATH".to_string()))
    }
}

impl LineConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            channel_access_token: env.secret("LINE_CHANNEL_ACCESS_TOKEN")?,
            channel_secret: env.secret("LINE_CHANNEL_SECRET")?,
            api_base: env.url("LINE_API_BASE", LINE_API_BASE)?,
        })
    }
}

impl GraphConfig {
    /// Neo4j when `NEO4J_URI` is set, otherwise the in-memory graph.
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        if let Some(uri) = env.optional("NEO4J_URI") {
            return Ok(Self::Neo4j(Neo4jConfig {
                uri,
                user: env.or_default("NEO4J_USER", "neo4j"),
                password: env.secret("NEO4J_PASSWORD")?,
            }));
        }

        env.optional("CATALOG_PATH")
            .map(|path| Self::Memory {
                catalog_path: PathBuf::from(path),
            })
            .ok_or_else(|| ConfigError::MissingEnvVar("NEO4J_URI or CATALOG_PATH".to_string()))
    }
}

impl EmbeddingConfig {
    /// Returns `None` if `EMBEDDING_API_KEY` is not set (local embedder).
    fn from_env(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let Some(key) = env.optional("EMBEDDING_API_KEY") else {
            return Ok(None);
        };
        warn_if_weak(&key, "EMBEDDING_API_KEY");

        Ok(Some(Self {
            api_key: SecretString::from(key),
            url: env.url("EMBEDDING_API_URL", DEFAULT_EMBEDDING_URL)?,
            model: env.or_default("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup; empty values count as unset.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// An absolute http(s) URL, without a trailing slash.
    fn url(&self, key: &str, default: &str) -> Result<String, ConfigError> {
        let value = self.or_default(key, default);
        let parsed = url::Url::parse(&value)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        Ok(value.trim_end_matches('/').to_string())
    }

    /// Required secret; weak values are logged, not rejected.
    fn secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        warn_if_weak(&value, key);
        Ok(SecretString::from(value))
    }
}

fn warn_if_weak(secret: &str, var_name: &str) {
    if let Err(e) = validate_secret_strength(secret, var_name) {
        tracing::warn!("{var_name} validation warning: {e}");
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const LINE_VARS: [(&str, &str); 2] = [
        ("LINE_CHANNEL_ACCESS_TOKEN", "kQ8vZ2mN4pR7tW1yB5dF9hJ3lX6cV0sA"),
        ("LINE_CHANNEL_SECRET", "e4a9c0c53b05d472f93d01e2a0b52c6f"),
    ];

    #[test]
    fn test_memory_graph_with_defaults() {
        let mut pairs = LINE_VARS.to_vec();
        pairs.push(("CATALOG_PATH", "data/catalog.json"));

        let config = BotConfig::from_vars(vars(&pairs)).expect("config");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.line.api_base, LINE_API_BASE);
        assert!(matches!(
            &config.graph,
            GraphConfig::Memory { catalog_path } if catalog_path == &PathBuf::from("data/catalog.json")
        ));
        assert!(config.embedding.is_none());
        assert_eq!(config.graph_timeout, Duration::from_secs(10));
        assert_eq!(config.title_cache_ttl, Duration::from_secs(300));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_neo4j_takes_precedence() {
        let mut pairs = LINE_VARS.to_vec();
        pairs.extend([
            ("NEO4J_URI", "bolt://localhost:7687"),
            ("NEO4J_PASSWORD", "Zt8#qLw2!vNx5@Rb"),
            ("CATALOG_PATH", "data/catalog.json"),
            ("GRAPH_TIMEOUT_SECS", "3"),
        ]);

        let config = BotConfig::from_vars(vars(&pairs)).expect("config");
        match config.graph {
            GraphConfig::Neo4j(neo4j) => {
                assert_eq!(neo4j.uri, "bolt://localhost:7687");
                assert_eq!(neo4j.user, "neo4j");
                assert_eq!(neo4j.password.expose_secret(), "Zt8#qLw2!vNx5@Rb");
            }
            GraphConfig::Memory { .. } => panic!("expected Neo4j"),
        }
        assert_eq!(config.graph_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_line_token() {
        let result = BotConfig::from_vars(vars(&[("CATALOG_PATH", "c.json")]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar(var)) if var == "LINE_CHANNEL_ACCESS_TOKEN"
        ));
    }

    #[test]
    fn test_missing_graph_backend() {
        let result = BotConfig::from_vars(vars(&LINE_VARS));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
    }

    #[test]
    fn test_neo4j_requires_password() {
        let mut pairs = LINE_VARS.to_vec();
        pairs.push(("NEO4J_URI", "bolt://localhost:7687"));
        let result = BotConfig::from_vars(vars(&pairs));
        assert!(matches!(
            result,
            Err(ConfigError::MissingEnvVar(var)) if var == "NEO4J_PASSWORD"
        ));
    }

    #[test]
    fn test_invalid_port() {
        let mut pairs = LINE_VARS.to_vec();
        pairs.extend([("CATALOG_PATH", "c.json"), ("BOT_PORT", "eighty")]);
        let result = BotConfig::from_vars(vars(&pairs));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(var, _)) if var == "BOT_PORT"));
    }

    #[test]
    fn test_embedding_config() {
        let mut pairs = LINE_VARS.to_vec();
        pairs.extend([
            ("CATALOG_PATH", "c.json"),
            ("EMBEDDING_API_KEY", "sk-9fQ2xLm4Rt7Vb1Nc8Zp3"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let config = BotConfig::from_vars(vars(&pairs)).expect("config");
        let embedding = config.embedding.expect("embedding");
        assert_eq!(embedding.url, DEFAULT_EMBEDDING_URL);
        assert_eq!(embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert!(config.json_logs);
    }

    #[test]
    fn test_api_urls_are_validated() {
        let mut pairs = LINE_VARS.to_vec();
        pairs.extend([
            ("CATALOG_PATH", "c.json"),
            ("LINE_API_BASE", "http://localhost:8080/"),
        ]);
        let config = BotConfig::from_vars(vars(&pairs)).expect("config");
        assert_eq!(config.line.api_base, "http://localhost:8080");

        let mut bad = LINE_VARS.to_vec();
        bad.extend([("CATALOG_PATH", "c.json"), ("LINE_API_BASE", "ftp://line")]);
        assert!(matches!(
            BotConfig::from_vars(vars(&bad)),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "LINE_API_BASE"
        ));

        bad.pop();
        bad.push(("LINE_API_BASE", "not a url"));
        assert!(BotConfig::from_vars(vars(&bad)).is_err());
    }

    #[test]
    fn test_tool_config_needs_no_line_credentials() {
        let config = ToolConfig::from_vars(vars(&[])).expect("tool config");
        assert!(config.graph.is_none());
        assert!(config.embedding.is_none());
        assert!(matches!(
            config.graph(),
            Err(ConfigError::MissingEnvVar(_))
        ));

        let config =
            ToolConfig::from_vars(vars(&[("CATALOG_PATH", "catalog.json")])).expect("tool config");
        assert!(matches!(config.graph(), Ok(GraphConfig::Memory { .. })));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_validate_secret_strength() {
        assert!(matches!(
            validate_secret_strength("your-channel-secret", "TEST_VAR"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR").is_err());
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let line = LineConfig {
            channel_access_token: SecretString::from("super-secret-token"),
            channel_secret: SecretString::from("super-secret-channel"),
            api_base: LINE_API_BASE.to_string(),
        };
        let output = format!("{line:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("super-secret"));

        let neo4j = Neo4jConfig {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: SecretString::from("graph-password-value"),
        };
        let output = format!("{neo4j:?}");
        assert!(output.contains("bolt://localhost:7687"));
        assert!(!output.contains("graph-password-value"));
    }
}
