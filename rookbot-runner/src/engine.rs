//! Move pickers shipped with the binary.

use async_trait::async_trait;
use rookbot_core::moves::{GameView, MoveChoice, MovePicker};

/// Placeholder used until a chess engine is plugged in. It never has a
/// move, so every game is aborted or resigned on the bot's first turn.
pub struct NoEngine;

#[async_trait]
impl MovePicker for NoEngine {
    async fn pick(&self, game: &GameView) -> Option<MoveChoice> {
        tracing::debug!(game_id = %game.game_id, ply = game.ply(), "No engine configured");
        None
    }
}
