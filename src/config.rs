use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_DOCUMENTS_DIR: &str = "pdfs";
const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_MAX_POLLS: u32 = 60;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Credential sent to the Gemini API with every call.
    pub gemini_api_key: String,
    /// Model identifier used for `generateContent`.
    pub gemini_model: String,
    /// Base URL of the Gemini REST API.
    pub gemini_base_url: String,
    /// Directory holding `a.txt`, `b.txt`, and `c.txt`.
    pub documents_dir: PathBuf,
    /// Interface the HTTP server binds to.
    pub server_host: String,
    /// Port the HTTP server binds to.
    pub server_port: u16,
    /// Upload polling policy applied while the provider processes a file.
    pub upload_poll: PollPolicy,
}

/// Fixed-interval polling with an upper bound on the number of status checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PollPolicy {
    /// Delay between two consecutive status checks.
    pub interval: Duration,
    /// Maximum number of status checks before giving up.
    pub max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = load_env("GEMINI_API_KEY")?;
        if api_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue("GEMINI_API_KEY".into()));
        }

        let interval_secs = parse_optional("UPLOAD_POLL_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let max_polls: u32 = parse_optional("UPLOAD_MAX_POLLS")?.unwrap_or(DEFAULT_MAX_POLLS);
        if max_polls == 0 {
            return Err(ConfigError::InvalidValue("UPLOAD_MAX_POLLS".into()));
        }

        Ok(Self {
            gemini_api_key: api_key,
            gemini_model: load_env_optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            documents_dir: load_env_optional("DOCUMENTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENTS_DIR)),
            server_host: load_env_optional("SERVER_HOST")
                .unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_optional("SERVER_PORT")?.unwrap_or(DEFAULT_SERVER_PORT),
            upload_poll: PollPolicy {
                interval: Duration::from_secs(interval_secs),
                max_polls,
            },
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Read `.env` from the working directory into the process environment.
///
/// Variables already set in the environment win over the file.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Load configuration from the environment and install it in the global cache.
///
/// A second call returns the configuration installed by the first.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    load_dotenv();
    let config = Config::from_env()?;
    tracing::debug!(
        model = %config.gemini_model,
        base_url = %config.gemini_base_url,
        documents_dir = %config.documents_dir.display(),
        server_port = config.server_port,
        poll_interval = ?config.upload_poll.interval,
        max_polls = config.upload_poll.max_polls,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
