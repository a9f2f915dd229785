use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use thiserror::Error;
use url::Url;

use crate::conversation::persona::load_persona;
use crate::conversation::Sampling;
use crate::groq_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// 50000 turns, user and assistant message each.
pub const DEFAULT_WINDOW: usize = 100_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,

    #[error("model identifier must not be empty")]
    MissingModel,

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("window must be a positive even number of messages, got {0}")]
    InvalidWindow(usize),

    #[error("timeout must be at least one second")]
    InvalidTimeout,

    #[error("session idle timeout must be at least one second")]
    InvalidSessionIdle,

    #[error("temperature must be between 0 and 2, got {0}")]
    InvalidTemperature(f32),

    #[error("failed to read persona file {path}: {source}")]
    Persona {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("persona file {0} is empty")]
    EmptyPersona(PathBuf),
}

/// Settings shared by every subcommand. Each flag can also come from the
/// environment (or a `.env` file).
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model identifier sent with every request
    #[arg(long, env = "MEDIA_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    /// Base URL of the chat completions API
    #[arg(long, env = "MEDIA_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Number of recent messages sent as context (two per turn)
    #[arg(long, env = "MEDIA_WINDOW", default_value_t = DEFAULT_WINDOW, global = true)]
    pub window: usize,

    /// Seconds to wait for a reply before giving up on a turn
    #[arg(long, env = "MEDIA_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,

    /// Seconds a web session may sit unused before it is discarded
    #[arg(long, env = "MEDIA_SESSION_IDLE_SECS", default_value_t = DEFAULT_SESSION_IDLE_SECS, global = true)]
    pub session_idle_secs: u64,

    /// Sampling temperature
    #[arg(long, env = "MEDIA_TEMPERATURE", default_value_t = 0.5, global = true)]
    pub temperature: f32,

    /// Upper bound on generated tokens per reply
    #[arg(long, env = "MEDIA_MAX_TOKENS", default_value_t = 1024, global = true)]
    pub max_tokens: u32,

    /// File whose contents replace the built-in persona
    #[arg(long, env = "MEDIA_PERSONA_FILE", global = true)]
    pub persona_file: Option<PathBuf>,
}

/// Validated runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
    pub window: usize,
    pub timeout: Duration,
    pub session_idle: Duration,
    pub sampling: Sampling,
    pub persona: String,
}

impl AppConfig {
    pub fn from_args(args: &ModelArgs) -> Result<Self, ConfigError> {
        let api_key = args
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?
            .to_string();

        let model = args.model.trim();
        if model.is_empty() {
            return Err(ConfigError::MissingModel);
        }

        if args.window == 0 || args.window % 2 != 0 {
            return Err(ConfigError::InvalidWindow(args.window));
        }

        if args.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        if args.session_idle_secs == 0 {
            return Err(ConfigError::InvalidSessionIdle);
        }

        if !(0.0..=2.0).contains(&args.temperature) {
            return Err(ConfigError::InvalidTemperature(args.temperature));
        }

        Ok(Self {
            api_key,
            model: model.to_string(),
            base_url: Url::parse(&args.base_url)?,
            window: args.window,
            timeout: Duration::from_secs(args.timeout_secs),
            session_idle: Duration::from_secs(args.session_idle_secs),
            sampling: Sampling {
                temperature: args.temperature,
                max_tokens: args.max_tokens,
            },
            persona: load_persona(args.persona_file.as_deref())?,
        })
    }
}
