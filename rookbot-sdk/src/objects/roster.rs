//! Online bot roster entries from `GET /api/bot/online`.

use compact_str::CompactString;
use serde::Deserialize;
use std::collections::HashMap;

use super::variant::PerfType;

/// Rating assumed for a pool the bot has never played in.
pub const DEFAULT_RATING: i32 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfRecord {
    pub rating: i32,
    pub games: u32,
}

impl Default for PerfRecord {
    fn default() -> Self {
        Self {
            rating: DEFAULT_RATING,
            games: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PerfPayload {
    #[serde(default)]
    rating: Option<i32>,
    #[serde(default)]
    games: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OnlineBotPayload {
    username: CompactString,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    perfs: HashMap<CompactString, PerfPayload>,
}

/// A bot currently online and a candidate opponent.
///
/// Two entries are equal when their names are equal.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "OnlineBotPayload")]
pub struct OnlineBot {
    pub name: CompactString,
    pub disabled: bool,
    perfs: [PerfRecord; PerfType::COUNT],
}

impl From<OnlineBotPayload> for OnlineBot {
    fn from(payload: OnlineBotPayload) -> Self {
        let mut bot = OnlineBot::new(payload.username);
        bot.disabled = payload.disabled;
        for (key, perf) in payload.perfs {
            // Pools such as puzzles or storm are not game categories.
            let Some(perf_type) = PerfType::from_key(&key) else {
                continue;
            };
            let record = &mut bot.perfs[perf_type.index()];
            if let Some(rating) = perf.rating {
                record.rating = rating;
            }
            if let Some(games) = perf.games {
                record.games = games;
            }
        }
        bot
    }
}

impl OnlineBot {
    /// An entry with default ratings and no games in every pool.
    pub fn new(name: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            disabled: false,
            perfs: [PerfRecord::default(); PerfType::COUNT],
        }
    }

    pub fn with_perf(mut self, perf_type: PerfType, rating: i32, games: u32) -> Self {
        self.perfs[perf_type.index()] = PerfRecord { rating, games };
        self
    }

    pub fn rating(&self, perf_type: PerfType) -> i32 {
        self.perfs[perf_type.index()].rating
    }

    pub fn num_games(&self, perf_type: PerfType) -> u32 {
        self.perfs[perf_type.index()].games
    }

    pub fn total_games(&self) -> u64 {
        self.perfs.iter().map(|p| u64::from(p.games)).sum()
    }
}

impl PartialEq for OnlineBot {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for OnlineBot {}
