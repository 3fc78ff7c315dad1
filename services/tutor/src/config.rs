use async_openai::config::OpenAIConfig;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported OpenAI-compatible model backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
    Gemini,
}

impl Provider {
    pub fn default_api_base(&self) -> &'static str {
        match self {
            Provider::Ollama => "http://localhost:11434/v1",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }
}

/// Holds all runtime settings loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub config_path: PathBuf,
    pub domain: Option<String>,
    pub provider: Provider,
    pub api_base: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub history_window: usize,
    pub record_backend_errors: bool,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let config_path = std::env::var("TUTOR_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./prompts/master_prompt.json"));

        let domain = std::env::var("TUTOR_DOMAIN").ok();

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "ollama" => Provider::Ollama,
            "openai" => Provider::OpenAI,
            "gemini" => Provider::Gemini,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of ollama, openai, gemini", other),
                ));
            }
        };

        let api_key = match provider {
            Provider::Ollama => None,
            Provider::OpenAI => Some(std::env::var("OPENAI_API_KEY").map_err(|_| {
                ConfigError::MissingVar(
                    "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                )
            })?),
            Provider::Gemini => Some(std::env::var("GEMINI_API_KEY").map_err(|_| {
                ConfigError::MissingVar(
                    "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                )
            })?),
        };

        let api_base = std::env::var("LLM_API_BASE")
            .unwrap_or_else(|_| provider.default_api_base().to_string());

        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "llama3".to_string());

        let history_window = match std::env::var("HISTORY_WINDOW") {
            Ok(value) => value
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "HISTORY_WINDOW".to_string(),
                        format!("'{}' is not a positive integer", value),
                    )
                })?,
            Err(_) => socratic_core::tutor::DEFAULT_HISTORY_WINDOW,
        };

        let record_backend_errors = match std::env::var("RECORD_BACKEND_ERRORS") {
            Ok(value) => value.parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue(
                    "RECORD_BACKEND_ERRORS".to_string(),
                    format!("'{}' is not 'true' or 'false'", value),
                )
            })?,
            Err(_) => true,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            config_path,
            domain,
            provider,
            api_base,
            api_key,
            chat_model,
            history_window,
            record_backend_errors,
            log_level,
        })
    }

    /// Client settings for the OpenAI-compatible backend.
    pub fn openai_config(&self) -> OpenAIConfig {
        let config = OpenAIConfig::new().with_api_base(&self.api_base);
        match &self.api_key {
            Some(key) => config.with_api_key(key),
            None => config,
        }
    }
}
