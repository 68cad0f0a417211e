//! EventWatcher processor.
//!
//! Consumes the account's event stream:
//! - `challenge`: accepted or declined according to the [`ChallengePolicy`]
//! - `gameStart`: a [`GameWatcher`](super::GameWatcher) is launched
//! - `gameFinish`, `challengeCanceled`, `challengeDeclined`: logged
//!
//! Game watchers are spawned as separate tasks and keep running when the
//! event stream reconnects.

use compact_str::CompactString;
use rookbot_sdk::client::BotClient;
use rookbot_sdk::objects::Event;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::game_watcher::GameLauncher;
use crate::config::{ChallengePolicy, ConfigStore};

pub struct EventWatcher {
    client: BotClient,
    account_id: CompactString,
    policy: ConfigStore<ChallengePolicy>,
    launcher: GameLauncher,
}

impl EventWatcher {
    pub fn new(
        client: BotClient,
        account_id: impl Into<CompactString>,
        policy: ConfigStore<ChallengePolicy>,
        launcher: GameLauncher,
    ) -> Self {
        Self {
            client,
            account_id: account_id.into(),
            policy,
            launcher,
        }
    }

    /// Run until shutdown is signaled or the event stream is closed for
    /// good. Game watchers still running are waited for before returning.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut stream = self.client.event_stream();
        let mut games = JoinSet::new();
        info!("EventWatcher started");

        loop {
            tokio::select! {
                biased;

                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        info!("EventWatcher received shutdown signal");
                        break;
                    }
                }

                // Reap finished game tasks so the set does not grow.
                Some(_) = games.join_next(), if !games.is_empty() => {}

                event = stream.next_event() => {
                    let Some(event) = event else {
                        warn!("Event stream closed");
                        break;
                    };
                    self.handle(event, &shutdown_rx, &mut games).await;
                }
            }
        }

        if !games.is_empty() {
            info!(games = games.len(), "Waiting for game watchers to stop");
            while games.join_next().await.is_some() {}
        }
        info!("EventWatcher shutdown complete");
    }

    async fn handle(
        &self,
        event: Event,
        shutdown_rx: &watch::Receiver<bool>,
        games: &mut JoinSet<()>,
    ) {
        match event.kind() {
            "ping" => debug!("Event stream keep-alive"),
            "challenge" => self.on_challenge(&event).await,
            "gameStart" => match event.game_id() {
                Some(game_id) => {
                    info!(game_id, "Game started");
                    if let Some(watcher) = self.launcher.watcher(game_id) {
                        games.spawn(watcher.run(shutdown_rx.clone()));
                    }
                }
                None => warn!("gameStart event without a game id"),
            },
            "gameFinish" => info!(game_id = event.game_id(), "Game finished"),
            "challengeCanceled" | "challengeDeclined" => {
                let challenge_id = event.challenge().map(|c| c.id);
                info!(
                    kind = event.kind(),
                    challenge_id = challenge_id.as_deref(),
                    "Challenge closed"
                );
            }
            other => debug!(kind = other, "Ignoring event"),
        }
    }

    async fn on_challenge(&self, event: &Event) {
        let Some(challenge) = event.challenge() else {
            warn!("challenge event without a readable challenge");
            return;
        };
        if challenge.is_from(&self.account_id) {
            debug!(challenge_id = %challenge.id, "Own outgoing challenge, ignoring");
            return;
        }

        let challenger = challenge
            .challenger
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        let policy = self.policy.snapshot();
        match policy.evaluate(&challenge, self.launcher.games().count()) {
            Ok(()) => {
                info!(challenge_id = %challenge.id, challenger, "Accepting challenge");
                self.client.accept_challenge(&challenge.id).await;
            }
            Err(reason) => {
                info!(
                    challenge_id = %challenge.id,
                    challenger,
                    reason = %reason,
                    "Declining challenge"
                );
                self.client.decline_challenge(&challenge.id, reason).await;
            }
        }
    }
}
