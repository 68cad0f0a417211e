//! GameWatcher processor.
//!
//! One GameWatcher runs per game. It reads the game's state stream, works
//! out whose turn it is and, on the bot's turn, asks the [`MovePicker`] for
//! a move. It stops when the stream ends, the game is over or shutdown is
//! signaled.
//!
//! [`ActiveGames`] is the registry of games being watched. The event stream
//! re-announces running games on every reconnect, so a game is only
//! watched if it can be claimed there first.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use compact_str::CompactString;
use rookbot_sdk::client::{BotClient, EventStream};
use rookbot_sdk::objects::Event;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::moves::{Color, GameView, MovePicker, STARTPOS};

// ---------------------------------------------------------------------------
// Active game registry
// ---------------------------------------------------------------------------

/// Ids of the games currently watched, shared between processors.
#[derive(Debug, Clone, Default)]
pub struct ActiveGames {
    inner: Arc<Mutex<HashSet<CompactString>>>,
}

/// Membership of one game in [`ActiveGames`]; released on drop.
#[derive(Debug)]
pub struct GameSlot {
    games: ActiveGames,
    game_id: CompactString,
}

impl ActiveGames {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<CompactString>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `game_id`, or `None` if it is already watched.
    pub fn claim(&self, game_id: &str) -> Option<GameSlot> {
        let game_id = CompactString::from(game_id);
        if !self.lock().insert(game_id.clone()) {
            return None;
        }
        Some(GameSlot {
            games: self.clone(),
            game_id,
        })
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_idle(&self) -> bool {
        self.count() == 0
    }

    pub fn contains(&self, game_id: &str) -> bool {
        self.lock().contains(game_id)
    }
}

impl GameSlot {
    pub fn game_id(&self) -> &str {
        &self.game_id
    }
}

impl Drop for GameSlot {
    fn drop(&mut self) {
        self.games.lock().remove(&self.game_id);
    }
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PlayerPayload {
    /// Absent for engine opponents.
    #[serde(default)]
    id: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
struct VariantPayload {
    key: CompactString,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameFullPayload {
    variant: VariantPayload,
    white: PlayerPayload,
    black: PlayerPayload,
    #[serde(default)]
    initial_fen: Option<CompactString>,
    state: GameStatePayload,
}

#[derive(Debug, Deserialize)]
struct GameStatePayload {
    #[serde(default)]
    moves: String,
    #[serde(default)]
    wtime: u64,
    #[serde(default)]
    btime: u64,
    #[serde(default)]
    winc: u64,
    #[serde(default)]
    binc: u64,
    status: CompactString,
}

// ---------------------------------------------------------------------------
// GameWatcher
// ---------------------------------------------------------------------------

/// Builds [`GameWatcher`]s for games the bot plays.
#[derive(Clone)]
pub struct GameLauncher {
    client: BotClient,
    account_id: CompactString,
    picker: Arc<dyn MovePicker>,
    games: ActiveGames,
}

impl GameLauncher {
    pub fn new(
        client: BotClient,
        account_id: impl Into<CompactString>,
        picker: Arc<dyn MovePicker>,
        games: ActiveGames,
    ) -> Self {
        Self {
            client,
            account_id: account_id.into(),
            picker,
            games,
        }
    }

    pub fn games(&self) -> &ActiveGames {
        &self.games
    }

    /// A watcher for `game_id`, or `None` if the game is watched already.
    pub fn watcher(&self, game_id: &str) -> Option<GameWatcher> {
        let Some(slot) = self.games.claim(game_id) else {
            debug!(game_id, "Game already watched");
            return None;
        };
        Some(GameWatcher {
            stream: self.client.game_stream(game_id),
            client: self.client.clone(),
            account_id: self.account_id.clone(),
            picker: Arc::clone(&self.picker),
            view: None,
            moved_at_ply: None,
            slot,
        })
    }

    /// Spawn a watcher for `game_id` unless it is watched already.
    pub fn launch(
        &self,
        game_id: &str,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Option<JoinHandle<()>> {
        let watcher = self.watcher(game_id)?;
        Some(tokio::spawn(watcher.run(shutdown_rx)))
    }
}

/// Plays one game.
pub struct GameWatcher {
    stream: EventStream,
    client: BotClient,
    account_id: CompactString,
    picker: Arc<dyn MovePicker>,
    view: Option<GameView>,
    /// Ply at which a move was last submitted, so a repeated state does not
    /// cause a second submission.
    moved_at_ply: Option<usize>,
    slot: GameSlot,
}

/// Whether the watcher should keep reading.
enum Flow {
    Continue,
    Stop,
}

impl GameWatcher {
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(game_id = self.slot.game_id(), "GameWatcher started");

        loop {
            tokio::select! {
                biased;

                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        info!(
                            game_id = self.slot.game_id(),
                            "GameWatcher received shutdown signal"
                        );
                        break;
                    }
                }

                event = self.stream.next_event() => {
                    let Some(event) = event else {
                        info!(game_id = self.slot.game_id(), "Game stream ended");
                        break;
                    };
                    if let Flow::Stop = self.handle(event).await {
                        break;
                    }
                }
            }
        }

        info!(game_id = self.slot.game_id(), "GameWatcher finished");
    }

    async fn handle(&mut self, event: Event) -> Flow {
        let kind = CompactString::from(event.kind());
        match kind.as_str() {
            "gameFull" => match serde_json::from_value::<GameFullPayload>(event.into_value()) {
                Ok(full) => self.on_game_full(full).await,
                Err(e) => {
                    warn!(game_id = self.slot.game_id(), error = %e, "Unreadable gameFull event");
                    Flow::Continue
                }
            },
            "gameState" => match serde_json::from_value::<GameStatePayload>(event.into_value()) {
                Ok(state) => self.on_game_state(state).await,
                Err(e) => {
                    warn!(game_id = self.slot.game_id(), error = %e, "Unreadable gameState event");
                    Flow::Continue
                }
            },
            "ping" => Flow::Continue,
            other => {
                debug!(game_id = self.slot.game_id(), kind = other, "Ignoring game event");
                Flow::Continue
            }
        }
    }

    async fn on_game_full(&mut self, full: GameFullPayload) -> Flow {
        let is_me = |player: &PlayerPayload| {
            player
                .id
                .as_deref()
                .is_some_and(|id| id.eq_ignore_ascii_case(&self.account_id))
        };
        let color = if is_me(&full.white) {
            Color::White
        } else if is_me(&full.black) {
            Color::Black
        } else {
            warn!(game_id = self.slot.game_id(), "Not a player in this game");
            return Flow::Stop;
        };

        info!(
            game_id = self.slot.game_id(),
            color = %color,
            variant = %full.variant.key,
            "Joined game"
        );
        self.view = Some(GameView {
            game_id: self.slot.game_id().into(),
            variant: full.variant.key.parse().ok(),
            color,
            initial_fen: full.initial_fen.unwrap_or_else(|| STARTPOS.into()),
            moves: Vec::new(),
            status: CompactString::default(),
            wtime: 0,
            btime: 0,
            winc: 0,
            binc: 0,
        });
        self.on_game_state(full.state).await
    }

    async fn on_game_state(&mut self, state: GameStatePayload) -> Flow {
        let Some(view) = self.view.as_mut() else {
            debug!(game_id = self.slot.game_id(), "State before gameFull, ignoring");
            return Flow::Continue;
        };
        view.moves = state.moves.split_whitespace().map(CompactString::from).collect();
        view.status = state.status;
        view.wtime = state.wtime;
        view.btime = state.btime;
        view.winc = state.winc;
        view.binc = state.binc;

        if !view.is_started() {
            info!(game_id = self.slot.game_id(), status = %view.status, "Game over");
            return Flow::Stop;
        }
        if !view.is_my_turn() || self.moved_at_ply == Some(view.ply()) {
            return Flow::Continue;
        }

        let view = view.clone();
        self.play(&view).await;
        Flow::Continue
    }

    async fn play(&mut self, view: &GameView) {
        let game_id = self.slot.game_id();
        match self.picker.pick(view).await {
            Some(choice) => {
                debug!(game_id, uci = %choice.uci, ply = view.ply(), "Submitting move");
                if self
                    .client
                    .make_move(game_id, &choice.uci, choice.offer_draw)
                    .await
                {
                    self.moved_at_ply = Some(view.ply());
                } else {
                    warn!(game_id, uci = %choice.uci, "Move was not accepted");
                }
            }
            // Fewer than two plies means at least one side has not moved
            // yet and the game can still be aborted.
            None if view.ply() < 2 => {
                warn!(game_id, "No move available, aborting");
                self.client.abort_game(game_id).await;
                self.moved_at_ply = Some(view.ply());
            }
            None => {
                warn!(game_id, "No move available, resigning");
                self.client.resign_game(game_id).await;
                self.moved_at_ply = Some(view.ply());
            }
        }
    }
}
