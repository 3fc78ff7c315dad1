use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Command-line flags. Each one overrides its environment variable.
#[derive(Debug, Parser)]
#[command(name = "socratic-tutor", version, about = "An adaptive Socratic tutor in your terminal")]
pub struct Cli {
    /// Path to the pedagogical configuration document (TUTOR_CONFIG_PATH).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Mastery domain to study; skips the selection menu (TUTOR_DOMAIN).
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Model identifier sent to the backend (CHAT_MODEL).
    #[arg(short, long)]
    pub model: Option<String>,
}

impl Cli {
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(path) = self.config {
            config.config_path = path;
        }
        if let Some(domain) = self.domain {
            config.domain = Some(domain);
        }
        if let Some(model) = self.model {
            config.chat_model = model;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use tracing::Level;

    fn base_config() -> Config {
        Config {
            config_path: PathBuf::from("./prompts/master_prompt.json"),
            domain: None,
            provider: Provider::Ollama,
            api_base: Provider::Ollama.default_api_base().to_string(),
            api_key: None,
            chat_model: "llama3".to_string(),
            history_window: 10,
            record_backend_errors: true,
            log_level: Level::INFO,
        }
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::try_parse_from([
            "socratic-tutor",
            "--config",
            "custom.json",
            "-d",
            "rust",
            "--model",
            "gemma3:12b",
        ])
        .unwrap();

        let config = cli.apply(base_config());
        assert_eq!(config.config_path, PathBuf::from("custom.json"));
        assert_eq!(config.domain.as_deref(), Some("rust"));
        assert_eq!(config.chat_model, "gemma3:12b");
    }

    #[test]
    fn test_no_flags_keep_environment_values() {
        let cli = Cli::try_parse_from(["socratic-tutor"]).unwrap();
        let config = cli.apply(base_config());
        assert_eq!(config.chat_model, "llama3");
        assert_eq!(config.domain, None);
    }
}
