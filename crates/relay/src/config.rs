//! Layered relay configuration.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (include_str! from relay.toml)
//! 2. `~/.config/relay/relay.toml` (optional)
//! 3. An explicit `--config` file (required), or `./relay.toml` (optional)
//! 4. `RELAY__SECTION__KEY` environment variables

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use derive_getters::Getters;
use relay_conversation::ContextConfig;
use relay_error::{ConfigError, RelayError, RelayResult};
use relay_models::OpenWebUiConfig;
use relay_rate_limit::{RateLimitConfig, RetryConfig};
use relay_social::DiscordConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../relay.toml");

/// Log line encoding.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    #[display("json")]
    Json,
    /// Human-readable lines
    #[display("text")]
    Text,
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_level")]
    level: String,
    /// Line encoding
    #[serde(default)]
    format: LogFormat,
    /// Append logs to this file instead of stdout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Create a logging section.
    pub fn new(level: impl Into<String>, format: LogFormat, file: Option<PathBuf>) -> Self {
        Self {
            level: level.into(),
            format,
            file,
        }
    }

    /// Replace the filter directive.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

/// Top-level relay configuration.
///
/// # Example
///
/// ```no_run
/// use relay::RelayConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RelayConfig::load(None)?;
/// config.validate()?;
/// println!("model: {}", config.openwebui().model());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RelayConfig {
    /// Chat platform connection and authorization
    #[serde(default)]
    discord: DiscordConfig,
    /// Completion endpoint
    #[serde(default)]
    openwebui: OpenWebUiConfig,
    /// Conversation window timing
    #[serde(default)]
    context: ContextConfig,
    /// Admission control
    #[serde(default)]
    rate_limit: RateLimitConfig,
    /// Retry policy for completions
    #[serde(default)]
    retry: RetryConfig,
    /// Log output
    #[serde(default)]
    logging: LoggingConfig,
}

fn defaults() -> ConfigBuilder<DefaultState> {
    Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> RelayResult<RelayConfig> {
    builder
        .build()
        .map_err(|e| {
            RelayError::from(ConfigError::new(format!(
                "Failed to build configuration: {}",
                e
            )))
        })?
        .try_deserialize()
        .map_err(|e| {
            RelayError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })
}

impl RelayConfig {
    /// Assemble a configuration from its sections.
    pub fn new(
        discord: DiscordConfig,
        openwebui: OpenWebUiConfig,
        context: ContextConfig,
        rate_limit: RateLimitConfig,
        retry: RetryConfig,
        logging: LoggingConfig,
    ) -> Self {
        Self {
            discord,
            openwebui,
            context,
            rate_limit,
            retry,
            logging,
        }
    }

    /// Load every source in precedence order.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` is given but missing, or any source
    /// fails to parse.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> RelayResult<Self> {
        debug!("Loading configuration: env > file > home dir > bundled defaults");
        let mut builder = defaults();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/relay/relay.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = match explicit {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("relay").required(false)),
        };

        builder = builder.add_source(
            Environment::with_prefix("RELAY")
                .separator("__")
                .try_parsing(true),
        );

        finish(builder)
    }

    /// Bundled defaults overlaid with a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> RelayResult<Self> {
        debug!("Loading configuration from file");
        finish(defaults().add_source(File::from(path.as_ref()).required(true)))
    }

    /// Bundled defaults overlaid with TOML text.
    pub fn from_toml_str(text: &str) -> RelayResult<Self> {
        finish(defaults().add_source(File::from_str(text, FileFormat::Toml)))
    }

    /// Reject settings the relay cannot run with.
    ///
    /// Also creates the log file's directory when one is configured.
    pub fn validate(&self) -> RelayResult<()> {
        if self.discord.token().trim().is_empty() {
            return Err(ConfigError::new("discord.token is required").into());
        }
        self.validate_without_discord()
    }

    /// [`validate`](Self::validate) minus the Discord token, for console chat.
    pub fn validate_without_discord(&self) -> RelayResult<()> {
        if self.openwebui.endpoint().trim().is_empty() {
            return Err(ConfigError::new("openwebui.endpoint is required").into());
        }
        if self.openwebui.api_key().trim().is_empty() {
            return Err(ConfigError::new("openwebui.api_key is required").into());
        }
        if *self.openwebui.timeout_secs() == 0 {
            return Err(ConfigError::new("openwebui.timeout_secs must be positive").into());
        }
        if *self.context.max_age_minutes() == 0 {
            return Err(ConfigError::new("context.max_age_minutes must be positive").into());
        }
        if *self.retry.deadline_secs() == 0 {
            return Err(ConfigError::new("retry.deadline_secs must be positive").into());
        }
        if self.rate_limit.channel_requests_per_minute() > self.rate_limit.requests_per_minute() {
            return Err(ConfigError::new(
                "rate_limit.channel_requests_per_minute must not exceed rate_limit.requests_per_minute",
            )
            .into());
        }

        if let Some(parent) = self
            .logging
            .file()
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::new(format!(
                    "Failed to create log directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Replace the logging section.
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// A filled-in configuration for `init-config`.
    pub fn example() -> Self {
        Self {
            discord: DiscordConfig::new("your-discord-bot-token")
                .with_authorized_guilds(vec!["123456789012345678".to_string()]),
            openwebui: OpenWebUiConfig::new("http://localhost:8080", "sk-your-api-key", "llama3")
                .with_system_prompt("You are a friendly assistant in a Discord server."),
            context: ContextConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::new("info", LogFormat::Text, None),
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> RelayResult<String> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::new(format!("Failed to serialize configuration: {}", e)).into()
        })
    }

    /// Write [`example`](Self::example) to `path`, creating parent directories.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn write_example(path: impl AsRef<Path>) -> RelayResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::new(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, Self::example().to_toml()?).map_err(|e| {
            ConfigError::new(format!("Failed to write {}: {}", path.display(), e))
        })?;
        debug!("Wrote example configuration");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_parse() {
        let config = RelayConfig::from_toml_str("").unwrap();
        assert_eq!(config.discord().command_prefix(), "!");
        assert_eq!(config.openwebui().endpoint(), "http://localhost:8080");
        assert_eq!(*config.context().max_age_minutes(), 20);
        assert_eq!(config.rate_limit().requests_per_minute().get(), 30);
        assert_eq!(*config.retry().max_attempts(), 3);
        assert_eq!(*config.logging().format(), LogFormat::Json);
    }

    #[test]
    fn test_defaults_need_secrets() {
        let config = RelayConfig::from_toml_str("").unwrap();
        assert!(config.validate().is_err());
        assert!(config.validate_without_discord().is_err());
    }

    #[test]
    fn test_example_is_valid() {
        RelayConfig::example().validate().unwrap();
    }

    #[test]
    fn test_log_format_display() {
        assert_eq!(LogFormat::Json.to_string(), "json");
        assert_eq!(LogFormat::Text.to_string(), "text");
    }
}
