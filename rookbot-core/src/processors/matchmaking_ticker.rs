//! MatchmakingTicker processor.
//!
//! Runs a [`Matchmaker`] pass every `interval` while the bot has no game
//! in progress. A config reload restarts the wait with the new interval.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};

use super::game_watcher::ActiveGames;
use crate::matchmaker::{MatchOutcome, Matchmaker};

pub struct MatchmakingTicker {
    matchmaker: Matchmaker,
    games: ActiveGames,
}

impl MatchmakingTicker {
    pub fn new(matchmaker: Matchmaker, games: ActiveGames) -> Self {
        Self { matchmaker, games }
    }

    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut config_watcher = self.matchmaker.config().subscribe();
        let mut interval = self.interval();
        info!(interval_secs = interval.as_secs(), "MatchmakingTicker started");

        loop {
            tokio::select! {
                biased;

                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        info!("MatchmakingTicker received shutdown signal");
                        break;
                    }
                }

                Some(config) = config_watcher.changed() => {
                    interval = config.interval;
                    info!(
                        enabled = config.enabled,
                        interval_secs = interval.as_secs(),
                        "MatchmakingTicker reloaded config"
                    );
                }

                _ = tokio::time::sleep(interval) => self.tick().await,
            }
        }

        info!("MatchmakingTicker shutdown complete");
    }

    fn interval(&self) -> Duration {
        self.matchmaker.config().snapshot().interval
    }

    async fn tick(&self) {
        if !self.games.is_idle() {
            debug!(games = self.games.count(), "Games in progress, not matchmaking");
            return;
        }
        match self.matchmaker.run_once().await {
            Ok(MatchOutcome::Challenged { opponent, challenge_id, .. }) => {
                debug!(%opponent, %challenge_id, "Matchmaking pass issued a challenge");
            }
            Ok(outcome) => debug!(?outcome, "Matchmaking pass finished"),
            Err(e) => error!(error = %e, "Matchmaking pass failed"),
        }
    }
}
