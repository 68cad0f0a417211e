//! TOML file configuration structures.
//!
//! These structs directly map to the `rookbot.toml` file format. Every
//! section and field is optional; missing values take the defaults below.

use rookbot_sdk::config::DEFAULT_BASE_URL;
use rookbot_sdk::objects::Variant;
use serde::{Deserialize, Serialize};

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub challenge: ChallengeSection,
    #[serde(default)]
    pub matchmaking: MatchmakingSection,
}

/// `[api]`: account credentials and server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    /// Personal API token. `--token` / `ROOKBOT_TOKEN` take precedence.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

/// `[challenge]`: which incoming challenges are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeSection {
    #[serde(default = "default_variants")]
    pub variants: Vec<Variant>,
    #[serde(default = "default_true")]
    pub allow_rated: bool,
    #[serde(default = "default_true")]
    pub allow_casual: bool,
    /// Seconds.
    #[serde(default)]
    pub min_initial: u32,
    /// Seconds.
    #[serde(default = "default_max_initial")]
    pub max_initial: u32,
    #[serde(default = "default_max_increment")]
    pub max_increment: u32,
    #[serde(default = "default_max_games")]
    pub max_games: usize,
}

impl Default for ChallengeSection {
    fn default() -> Self {
        Self {
            variants: default_variants(),
            allow_rated: true,
            allow_casual: true,
            min_initial: 0,
            max_initial: default_max_initial(),
            max_increment: default_max_increment(),
            max_games: default_max_games(),
        }
    }
}

/// `[matchmaking]`: challenges issued to other online bots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchmakingSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub rated: bool,
    #[serde(default = "default_variant")]
    pub variant: Variant,
    #[serde(default = "default_max_rating_diff")]
    pub max_rating_diff: u32,
    #[serde(default = "default_min_games")]
    pub min_games: u64,
    #[serde(default = "default_initial_times")]
    pub initial_times: Vec<u32>,
    #[serde(default = "default_increments")]
    pub increments: Vec<u32>,
    /// Seconds between passes while idle.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl Default for MatchmakingSection {
    fn default() -> Self {
        Self {
            enabled: false,
            rated: true,
            variant: default_variant(),
            max_rating_diff: default_max_rating_diff(),
            min_games: default_min_games(),
            initial_times: default_initial_times(),
            increments: default_increments(),
            interval: default_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_variants() -> Vec<Variant> {
    vec![Variant::Standard]
}

fn default_variant() -> Variant {
    Variant::Standard
}

fn default_max_initial() -> u32 {
    10_800
}

fn default_max_increment() -> u32 {
    180
}

fn default_max_games() -> usize {
    1
}

fn default_max_rating_diff() -> u32 {
    300
}

fn default_min_games() -> u64 {
    10
}

fn default_initial_times() -> Vec<u32> {
    vec![60, 180, 300]
}

fn default_increments() -> Vec<u32> {
    vec![0, 1, 2]
}

fn default_interval() -> u64 {
    60
}
