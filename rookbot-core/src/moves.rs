//! Move selection seam.
//!
//! The game watcher knows when to move but not what to play. It hands a
//! [`GameView`] to a [`MovePicker`] and submits whatever comes back.

use async_trait::async_trait;
use compact_str::CompactString;
use rookbot_sdk::objects::Variant;
use std::fmt;

/// Starting position marker used by the platform for `initialFen`.
pub const STARTPOS: &str = "startpos";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Color::White => "white",
            Color::Black => "black",
        })
    }
}

/// What the bot knows about a game in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub game_id: CompactString,
    /// `None` for variants this client does not model, e.g. `fromPosition`.
    pub variant: Option<Variant>,
    /// The side the bot plays.
    pub color: Color,
    /// `startpos` or a FEN.
    pub initial_fen: CompactString,
    /// Moves so far in UCI notation.
    pub moves: Vec<CompactString>,
    pub status: CompactString,
    /// Remaining clock times and increments, in milliseconds.
    pub wtime: u64,
    pub btime: u64,
    pub winc: u64,
    pub binc: u64,
}

impl GameView {
    /// Half-moves played.
    pub fn ply(&self) -> usize {
        self.moves.len()
    }

    /// Side to move in the initial position.
    pub fn first_to_move(&self) -> Color {
        if self.initial_fen == STARTPOS || self.initial_fen.is_empty() {
            return Color::White;
        }
        match self.initial_fen.split_whitespace().nth(1) {
            Some("b") => Color::Black,
            _ => Color::White,
        }
    }

    pub fn side_to_move(&self) -> Color {
        if self.ply() % 2 == 0 {
            self.first_to_move()
        } else {
            self.first_to_move().opposite()
        }
    }

    pub fn is_my_turn(&self) -> bool {
        self.side_to_move() == self.color
    }

    pub fn is_started(&self) -> bool {
        self.status == "started"
    }

    /// The bot's remaining time and increment, in milliseconds.
    pub fn my_clock(&self) -> (u64, u64) {
        match self.color {
            Color::White => (self.wtime, self.winc),
            Color::Black => (self.btime, self.binc),
        }
    }
}

/// A move to submit, in UCI notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveChoice {
    pub uci: CompactString,
    pub offer_draw: bool,
}

impl MoveChoice {
    pub fn new(uci: impl Into<CompactString>) -> Self {
        Self {
            uci: uci.into(),
            offer_draw: false,
        }
    }

    pub fn with_draw_offer(mut self) -> Self {
        self.offer_draw = true;
        self
    }
}

/// Chooses the bot's moves.
///
/// Returning `None` means no move can be produced; the game is then
/// aborted if still possible and resigned otherwise.
#[async_trait]
pub trait MovePicker: Send + Sync {
    async fn pick(&self, game: &GameView) -> Option<MoveChoice>;
}
