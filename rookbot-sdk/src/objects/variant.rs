use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule variants playable on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Variant {
    Standard,
    Chess960,
    Crazyhouse,
    Antichess,
    Atomic,
    Horde,
    KingOfTheHill,
    RacingKings,
    ThreeCheck,
}

impl Variant {
    pub const ALL: [Variant; 9] = [
        Variant::Standard,
        Variant::Chess960,
        Variant::Crazyhouse,
        Variant::Antichess,
        Variant::Atomic,
        Variant::Horde,
        Variant::KingOfTheHill,
        Variant::RacingKings,
        Variant::ThreeCheck,
    ];

    /// The key used on the wire, e.g. in the `variant` form field.
    pub fn as_key(self) -> &'static str {
        match self {
            Variant::Standard => "standard",
            Variant::Chess960 => "chess960",
            Variant::Crazyhouse => "crazyhouse",
            Variant::Antichess => "antichess",
            Variant::Atomic => "atomic",
            Variant::Horde => "horde",
            Variant::KingOfTheHill => "kingOfTheHill",
            Variant::RacingKings => "racingKings",
            Variant::ThreeCheck => "threeCheck",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);

impl FromStr for Variant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|v| v.as_key() == s)
            .ok_or_else(|| UnknownVariant(s.to_owned()))
    }
}

/// Rating pools tracked separately by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PerfType {
    UltraBullet,
    Bullet,
    Blitz,
    Rapid,
    Classical,
    Correspondence,
    Chess960,
    Crazyhouse,
    Antichess,
    Atomic,
    Horde,
    KingOfTheHill,
    RacingKings,
    ThreeCheck,
}

impl PerfType {
    pub const COUNT: usize = 14;

    pub const ALL: [PerfType; PerfType::COUNT] = [
        PerfType::UltraBullet,
        PerfType::Bullet,
        PerfType::Blitz,
        PerfType::Rapid,
        PerfType::Classical,
        PerfType::Correspondence,
        PerfType::Chess960,
        PerfType::Crazyhouse,
        PerfType::Antichess,
        PerfType::Atomic,
        PerfType::Horde,
        PerfType::KingOfTheHill,
        PerfType::RacingKings,
        PerfType::ThreeCheck,
    ];

    pub fn as_key(self) -> &'static str {
        match self {
            PerfType::UltraBullet => "ultraBullet",
            PerfType::Bullet => "bullet",
            PerfType::Blitz => "blitz",
            PerfType::Rapid => "rapid",
            PerfType::Classical => "classical",
            PerfType::Correspondence => "correspondence",
            PerfType::Chess960 => "chess960",
            PerfType::Crazyhouse => "crazyhouse",
            PerfType::Antichess => "antichess",
            PerfType::Atomic => "atomic",
            PerfType::Horde => "horde",
            PerfType::KingOfTheHill => "kingOfTheHill",
            PerfType::RacingKings => "racingKings",
            PerfType::ThreeCheck => "threeCheck",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        PerfType::ALL.into_iter().find(|p| p.as_key() == key)
    }

    /// Position of this category in [`PerfType::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PerfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Estimated game duration in seconds, assuming 40 moves per side.
pub fn estimated_duration(initial_time: u32, increment: u32) -> u64 {
    u64::from(initial_time) + 40 * u64::from(increment)
}

/// Resolve the rating pool a game with this variant and clock is played in.
///
/// Non-standard variants each have their own pool. Standard games are
/// bucketed by [`estimated_duration`].
pub fn perf_type_of(variant: Variant, initial_time: u32, increment: u32) -> PerfType {
    match variant {
        Variant::Standard => match estimated_duration(initial_time, increment) {
            d if d < 30 => PerfType::UltraBullet,
            d if d < 180 => PerfType::Bullet,
            d if d < 480 => PerfType::Blitz,
            d if d < 1200 => PerfType::Rapid,
            _ => PerfType::Classical,
        },
        Variant::Chess960 => PerfType::Chess960,
        Variant::Crazyhouse => PerfType::Crazyhouse,
        Variant::Antichess => PerfType::Antichess,
        Variant::Atomic => PerfType::Atomic,
        Variant::Horde => PerfType::Horde,
        Variant::KingOfTheHill => PerfType::KingOfTheHill,
        Variant::RacingKings => PerfType::RacingKings,
        Variant::ThreeCheck => PerfType::ThreeCheck,
    }
}
