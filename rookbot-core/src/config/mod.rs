//! Runtime configuration for the bot.
//!
//! These are validated values; reading and checking the TOML file is the
//! binary's job. Sections that can change at runtime are held in a
//! [`ConfigStore`] and swapped on reload.

mod challenge;
mod config_store;
mod matchmaking;

pub use challenge::ChallengePolicy;
pub use config_store::{ConfigStore, ConfigWatcher};
pub use matchmaking::MatchmakingConfig;
