//! Incoming challenge policy.

use rookbot_sdk::objects::{ChallengeSummary, DeclineReason, Variant};

/// Which incoming challenges the bot accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengePolicy {
    pub variants: Vec<Variant>,
    pub allow_rated: bool,
    pub allow_casual: bool,
    /// Shortest accepted initial clock time in seconds.
    pub min_initial: u32,
    /// Longest accepted initial clock time in seconds.
    pub max_initial: u32,
    pub max_increment: u32,
    /// Concurrent games before new challenges are declined with `later`.
    pub max_games: usize,
}

impl Default for ChallengePolicy {
    fn default() -> Self {
        Self {
            variants: vec![Variant::Standard],
            allow_rated: true,
            allow_casual: true,
            min_initial: 0,
            max_initial: 10_800,
            max_increment: 180,
            max_games: 1,
        }
    }
}

impl ChallengePolicy {
    /// Decide on `challenge` while `active_games` games are in progress.
    ///
    /// The first failing check picks the decline reason: time control,
    /// variant, rating mode, clock bounds, then load.
    pub fn evaluate(
        &self,
        challenge: &ChallengeSummary,
        active_games: usize,
    ) -> Result<(), DeclineReason> {
        if challenge.time_control.kind != "clock" {
            return Err(DeclineReason::TimeControl);
        }

        match challenge.known_variant() {
            Some(variant) if self.variants.contains(&variant) => {}
            Some(Variant::Standard) => return Err(DeclineReason::Variant),
            _ if self.variants == [Variant::Standard] => return Err(DeclineReason::Standard),
            _ => return Err(DeclineReason::Variant),
        }

        if challenge.rated && !self.allow_rated {
            return Err(DeclineReason::Casual);
        }
        if !challenge.rated && !self.allow_casual {
            return Err(DeclineReason::Rated);
        }

        let initial = challenge.time_control.limit.unwrap_or(0);
        let increment = challenge.time_control.increment.unwrap_or(0);
        if initial < self.min_initial {
            return Err(DeclineReason::TooFast);
        }
        if initial > self.max_initial || increment > self.max_increment {
            return Err(DeclineReason::TooSlow);
        }

        if active_games >= self.max_games {
            return Err(DeclineReason::Later);
        }
        Ok(())
    }
}
