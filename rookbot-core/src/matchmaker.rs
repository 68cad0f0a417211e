//! Outgoing matchmaking.
//!
//! One pass reads the online-bot roster, draws a time control from the
//! configured pools and challenges the first bot, in random order, that is
//! close enough in rating and experienced enough. The draw and the choice
//! live in [`plan_match`], which takes the RNG as a parameter.

use compact_str::CompactString;
use futures_util::StreamExt;
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use rookbot_sdk::client::BotClient;
use rookbot_sdk::objects::{ChallengeRequest, OnlineBot, PerfType, perf_type_of};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigStore, MatchmakingConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchmakingError {
    /// The bot's own account is missing from the online roster. Without
    /// it there are no ratings to compare against.
    #[error("own account {username} not found in the online bot roster")]
    SelfNotInRoster { username: CompactString },

    #[error("no {0} configured to choose from")]
    EmptyPool(&'static str),
}

/// Result of a matchmaking pass that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Matchmaking is switched off.
    Disabled,
    /// No bot on the roster qualified.
    NoOpponent,
    Challenged {
        opponent: CompactString,
        challenge_id: CompactString,
        perf_type: PerfType,
    },
    /// An opponent was chosen but the challenge could not be created.
    ChallengeFailed { opponent: CompactString },
}

/// The challenge a pass decided on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPlan {
    pub request: ChallengeRequest,
    pub perf_type: PerfType,
}

fn qualifies(
    me: &OnlineBot,
    candidate: &OnlineBot,
    perf: PerfType,
    config: &MatchmakingConfig,
) -> bool {
    if candidate == me {
        return false;
    }
    if me.rating(perf).abs_diff(candidate.rating(perf)) > config.max_rating_diff {
        return false;
    }
    candidate.total_games() >= config.min_games
}

/// Choose an opponent and time control from `roster`.
///
/// Disabled entries are dropped and the rest shuffled before the first
/// qualifying candidate is taken. Self is the entry named exactly
/// `username`, the same name equality [`OnlineBot`] uses to exclude it.
/// `Ok(None)` means nobody qualified.
pub fn plan_match<R: Rng + ?Sized>(
    roster: Vec<OnlineBot>,
    username: &str,
    config: &MatchmakingConfig,
    rng: &mut R,
) -> Result<Option<MatchPlan>, MatchmakingError> {
    let mut bots: Vec<OnlineBot> = roster.into_iter().filter(|bot| !bot.disabled).collect();

    let me = bots
        .iter()
        .find(|bot| bot.name == username)
        .cloned()
        .ok_or_else(|| MatchmakingError::SelfNotInRoster {
            username: username.into(),
        })?;

    bots.shuffle(rng);

    let initial_time = *config
        .initial_times
        .choose(rng)
        .ok_or(MatchmakingError::EmptyPool("initial times"))?;
    let increment = *config
        .increments
        .choose(rng)
        .ok_or(MatchmakingError::EmptyPool("increments"))?;
    let perf_type = perf_type_of(config.variant, initial_time, increment);

    let opponent = bots
        .into_iter()
        .find(|bot| qualifies(&me, bot, perf_type, config));

    Ok(opponent.map(|bot| MatchPlan {
        request: ChallengeRequest {
            opponent: bot.name,
            initial_time,
            increment,
            variant: config.variant,
            rated: config.rated,
        },
        perf_type,
    }))
}

/// Issues challenges to other online bots.
pub struct Matchmaker {
    client: BotClient,
    username: CompactString,
    config: ConfigStore<MatchmakingConfig>,
}

impl Matchmaker {
    pub fn new(
        client: BotClient,
        username: impl Into<CompactString>,
        config: ConfigStore<MatchmakingConfig>,
    ) -> Self {
        Self {
            client,
            username: username.into(),
            config,
        }
    }

    pub fn config(&self) -> &ConfigStore<MatchmakingConfig> {
        &self.config
    }

    /// Run one matchmaking pass.
    pub async fn run_once(&self) -> Result<MatchOutcome, MatchmakingError> {
        let config = self.config.snapshot();
        if !config.enabled {
            debug!("Matchmaking disabled, skipping pass");
            return Ok(MatchOutcome::Disabled);
        }

        let roster: Vec<OnlineBot> = self.client.online_bots().collect().await;
        debug!(bots = roster.len(), "Fetched online bot roster");

        let plan = plan_match(roster, &self.username, &config, &mut rand::rng())
            .inspect_err(|e| error!(error = %e, "Matchmaking pass aborted"))?;
        let Some(MatchPlan { request, perf_type }) = plan else {
            warn!("Could not find any bot to challenge");
            return Ok(MatchOutcome::NoOpponent);
        };

        info!(
            opponent = %request.opponent,
            perf = %perf_type,
            initial_time = request.initial_time,
            increment = request.increment,
            rated = request.rated,
            "Challenging bot"
        );
        match self.client.create_challenge(&request).await {
            Some(challenge_id) => Ok(MatchOutcome::Challenged {
                opponent: request.opponent,
                challenge_id,
                perf_type,
            }),
            None => Ok(MatchOutcome::ChallengeFailed {
                opponent: request.opponent,
            }),
        }
    }
}
