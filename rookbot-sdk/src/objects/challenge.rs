//! Challenge payloads: outgoing requests, decline reasons and the summaries
//! embedded in `challenge` events and `GET /api/challenge`.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::variant::Variant;

/// Machine-readable reason sent with a declined challenge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclineReason {
    #[default]
    Generic,
    Later,
    TooFast,
    TooSlow,
    TimeControl,
    Rated,
    Casual,
    Standard,
    Variant,
    NoBot,
    OnlyBot,
}

impl DeclineReason {
    pub fn as_key(self) -> &'static str {
        match self {
            DeclineReason::Generic => "generic",
            DeclineReason::Later => "later",
            DeclineReason::TooFast => "tooFast",
            DeclineReason::TooSlow => "tooSlow",
            DeclineReason::TimeControl => "timeControl",
            DeclineReason::Rated => "rated",
            DeclineReason::Casual => "casual",
            DeclineReason::Standard => "standard",
            DeclineReason::Variant => "variant",
            DeclineReason::NoBot => "noBot",
            DeclineReason::OnlyBot => "onlyBot",
        }
    }
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// An outgoing challenge. The color is always left to the server to pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRequest {
    pub opponent: CompactString,
    /// Initial clock time in seconds.
    pub initial_time: u32,
    /// Increment per move in seconds.
    pub increment: u32,
    pub variant: Variant,
    pub rated: bool,
}

impl ChallengeRequest {
    /// Form fields for `POST /api/challenge/{opponent}`.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("rated", self.rated.to_string()),
            ("clock.limit", self.initial_time.to_string()),
            ("clock.increment", self.increment.to_string()),
            ("variant", self.variant.as_key().to_owned()),
            ("color", "random".to_owned()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: CompactString,
    #[serde(default)]
    pub name: CompactString,
    #[serde(default)]
    pub title: Option<CompactString>,
    #[serde(default)]
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRef {
    pub key: CompactString,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    /// `clock`, `correspondence` or `unlimited`.
    #[serde(rename = "type", default)]
    pub kind: CompactString,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub increment: Option<u32>,
}

/// A challenge as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSummary {
    pub id: CompactString,
    #[serde(default)]
    pub status: CompactString,
    #[serde(default)]
    pub challenger: Option<UserRef>,
    #[serde(default)]
    pub dest_user: Option<UserRef>,
    pub variant: VariantRef,
    #[serde(default)]
    pub rated: bool,
    #[serde(default)]
    pub speed: CompactString,
    #[serde(default)]
    pub time_control: TimeControl,
}

impl ChallengeSummary {
    /// The variant, if it is one this client knows how to play.
    pub fn known_variant(&self) -> Option<Variant> {
        self.variant.key.parse().ok()
    }

    /// Whether `user_id` issued this challenge.
    pub fn is_from(&self, user_id: &str) -> bool {
        self.challenger
            .as_ref()
            .is_some_and(|c| c.id.eq_ignore_ascii_case(user_id))
    }
}

/// Response body of `GET /api/challenge`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenChallenges {
    #[serde(rename = "in", default)]
    pub incoming: Vec<ChallengeSummary>,
    #[serde(rename = "out", default)]
    pub outgoing: Vec<ChallengeSummary>,
}
