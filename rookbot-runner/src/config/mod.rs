//! Configuration module for the rookbot binary.
//!
//! Handles loading configuration from the TOML file and the token
//! override from the CLI or environment, then validates it into the
//! runtime types of `rookbot-core` and `rookbot-sdk`.

pub mod file;

use crate::config::file::{ChallengeSection, FileConfig, MatchmakingSection};
use rookbot_core::config::{ChallengePolicy, MatchmakingConfig};
use rookbot_sdk::config::ApiConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid base_url: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub api: ApiConfig,
    pub challenge: ChallengePolicy,
    pub matchmaking: MatchmakingConfig,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    token_override: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, token_override: Option<String>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            token_override,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and validate the configuration.
    ///
    /// A missing file is not an error: every setting has a default and
    /// the token may come from the environment.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let file_config = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "Config file {:?} not found, using defaults",
                    self.config_path
                );
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };
        self.build(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    /// Apply the token override, validate and convert.
    pub fn build(&self, mut file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
        if let Some(token) = &self.token_override {
            file_config.api.token = Some(token.clone());
        }

        self.validate(&file_config)?;

        let token = file_config.api.token.unwrap_or_default();
        let base_url = Url::parse(&file_config.api.base_url)?;
        Ok(LoadedConfig {
            api: ApiConfig::new(token, base_url),
            challenge: convert_challenge(file_config.challenge),
            matchmaking: convert_matchmaking(file_config.matchmaking),
        })
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config
            .api
            .token
            .as_deref()
            .is_none_or(|token| token.trim().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "no API token: set [api].token, --token or ROOKBOT_TOKEN".to_string(),
            ));
        }

        let matchmaking = &config.matchmaking;
        // The ticker sleeps for the interval even while disabled.
        if matchmaking.interval == 0 {
            return Err(ConfigError::ValidationError(
                "matchmaking interval must be at least one second".to_string(),
            ));
        }
        if matchmaking.enabled {
            if matchmaking.initial_times.is_empty() {
                return Err(ConfigError::ValidationError(
                    "matchmaking is enabled but initial_times is empty".to_string(),
                ));
            }
            if matchmaking.increments.is_empty() {
                return Err(ConfigError::ValidationError(
                    "matchmaking is enabled but increments is empty".to_string(),
                ));
            }
        }

        let challenge = &config.challenge;
        if challenge.min_initial > challenge.max_initial {
            return Err(ConfigError::ValidationError(format!(
                "challenge min_initial ({}) is greater than max_initial ({})",
                challenge.min_initial, challenge.max_initial
            )));
        }
        Ok(())
    }
}

fn convert_challenge(c: ChallengeSection) -> ChallengePolicy {
    ChallengePolicy {
        variants: c.variants,
        allow_rated: c.allow_rated,
        allow_casual: c.allow_casual,
        min_initial: c.min_initial,
        max_initial: c.max_initial,
        max_increment: c.max_increment,
        max_games: c.max_games,
    }
}

fn convert_matchmaking(m: MatchmakingSection) -> MatchmakingConfig {
    MatchmakingConfig {
        enabled: m.enabled,
        rated: m.rated,
        variant: m.variant,
        max_rating_diff: m.max_rating_diff,
        min_games: m.min_games,
        initial_times: m.initial_times,
        increments: m.increments,
        interval: Duration::from_secs(m.interval),
    }
}
