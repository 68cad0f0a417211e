//! Outgoing matchmaking configuration.

use std::time::Duration;

use rookbot_sdk::objects::Variant;

/// Settings for the periodic matchmaking pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchmakingConfig {
    pub enabled: bool,
    /// Whether issued challenges are rated.
    pub rated: bool,
    pub variant: Variant,
    /// Largest accepted rating gap in the game's perf category.
    pub max_rating_diff: u32,
    /// Fewest games, over all categories, an opponent must have played.
    pub min_games: u64,
    /// Pool of initial clock times in seconds.
    pub initial_times: Vec<u32>,
    /// Pool of increments in seconds.
    pub increments: Vec<u32>,
    /// Pause between passes while no game is running.
    pub interval: Duration,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rated: true,
            variant: Variant::Standard,
            max_rating_diff: 300,
            min_games: 10,
            initial_times: vec![60, 180, 300],
            increments: vec![0, 1, 2],
            interval: Duration::from_secs(60),
        }
    }
}
