use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// The authenticated account, fetched once at startup from `GET /api/account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: CompactString,
    /// Honorific such as `BOT` or `GM`; empty when the account has none.
    #[serde(default)]
    pub title: CompactString,
}

impl Account {
    /// Lowercased username, which is how the platform spells user ids.
    pub fn id(&self) -> CompactString {
        self.username.to_lowercase().into()
    }
}

/// One entry of `GET /api/account/playing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OngoingGame {
    pub game_id: CompactString,
    #[serde(default)]
    pub color: Option<CompactString>,
    #[serde(default)]
    pub is_my_turn: bool,
}

/// Response body of `GET /api/account/playing`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    #[serde(default)]
    pub now_playing: Vec<OngoingGame>,
}
