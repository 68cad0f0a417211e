//! Long-running tasks driving the bot.
//!
//! - `EventWatcher`: answers challenges and launches game watchers
//! - `GameWatcher`: plays one game through a `MovePicker`
//! - `MatchmakingTicker`: challenges other bots while idle
//!
//! Each `run` takes a shutdown `watch::Receiver<bool>` and returns once it
//! flips to `true`.

pub mod event_watcher;
pub mod game_watcher;
pub mod matchmaking_ticker;

pub use event_watcher::EventWatcher;
pub use game_watcher::{ActiveGames, GameLauncher, GameSlot, GameWatcher};
pub use matchmaking_ticker::MatchmakingTicker;
