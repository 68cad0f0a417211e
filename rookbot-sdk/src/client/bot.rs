//! Challenge and game lifecycle client.
//!
//! Every method is a thin wrapper over [`ActionClient`] against a fixed
//! endpoint. Boolean methods return `false` on any failure after retries;
//! the failure itself has already been logged.

use std::time::Duration;

use compact_str::CompactString;
use futures_util::stream::Stream;
use serde::Deserialize;
use tracing::{info, warn};

use super::action::{ActionClient, ApiRequest};
use super::stream::{EventStream, read_ndjson};
use super::ClientError;
use crate::config::ApiConfig;
use crate::objects::{
    Account, ChallengeRequest, DeclineReason, NowPlaying, OnlineBot, OpenChallenges,
};

/// Timeout for challenge creation, which the server may hold open briefly.
const CREATE_CHALLENGE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: CompactString,
}

/// `POST /api/challenge/{user}` answers either with the challenge itself or
/// wrapped in a `challenge` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreatedChallenge {
    Wrapped { challenge: IdOnly },
    Bare(IdOnly),
}

impl CreatedChallenge {
    fn into_id(self) -> CompactString {
        match self {
            CreatedChallenge::Wrapped { challenge } => challenge.id,
            CreatedChallenge::Bare(challenge) => challenge.id,
        }
    }
}

fn encode(segment: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(segment)
}

/// Typed client for the bot API.
#[derive(Debug, Clone)]
pub struct BotClient {
    api: ActionClient,
}

impl BotClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            api: ActionClient::new(config),
        }
    }

    pub fn from_action_client(api: ActionClient) -> Self {
        Self { api }
    }

    pub fn action_client(&self) -> &ActionClient {
        &self.api
    }

    /// `GET /api/account` – the authenticated identity.
    ///
    /// Unlike the other methods this returns the error: without an identity
    /// the bot cannot run.
    pub async fn account(&self) -> Result<Account, ClientError> {
        self.api.send_json(&ApiRequest::get("/api/account")).await
    }

    /// `GET /api/stream/event` – the account's never-ending event feed.
    pub fn event_stream(&self) -> EventStream {
        EventStream::new(self.api.clone(), "/api/stream/event")
    }

    /// `GET /api/bot/game/stream/{id}` – state updates for one game. Ends
    /// when the server closes it after the game is over.
    pub fn game_stream(&self, game_id: &str) -> EventStream {
        EventStream::new(
            self.api.clone(),
            format!("/api/bot/game/stream/{}", encode(game_id)),
        )
    }

    /// `GET /api/bot/online` – snapshot of online bots, one per line.
    pub fn online_bots(&self) -> impl Stream<Item = OnlineBot> + Send {
        read_ndjson(self.api.clone(), "/api/bot/online")
    }

    /// `POST /api/challenge/{id}/accept`
    pub async fn accept_challenge(&self, challenge_id: &str) -> bool {
        let path = format!("/api/challenge/{}/accept", encode(challenge_id));
        self.api.call(&ApiRequest::post(path)).await.success
    }

    /// `POST /api/challenge/{id}/decline`
    pub async fn decline_challenge(&self, challenge_id: &str, reason: DeclineReason) -> bool {
        let path = format!("/api/challenge/{}/decline", encode(challenge_id));
        let request = ApiRequest::post(path).form("reason", reason.as_key());
        self.api.call(&request).await.success
    }

    /// `POST /api/challenge/{opponent}` – returns the new challenge id.
    pub async fn create_challenge(&self, challenge: &ChallengeRequest) -> Option<CompactString> {
        let path = format!("/api/challenge/{}", encode(&challenge.opponent));
        let request = ApiRequest::post(path)
            .form_fields(challenge.form_fields())
            .timeout(CREATE_CHALLENGE_TIMEOUT);
        let outcome = self.api.call(&request).await;
        if !outcome.success {
            warn!(opponent = %challenge.opponent, "Could not create challenge");
            return None;
        }
        let id = outcome.json::<CreatedChallenge>()?.into_id();
        info!(opponent = %challenge.opponent, challenge_id = %id, "Challenge created");
        Some(id)
    }

    /// `POST /api/challenge/{id}/cancel`
    pub async fn cancel_challenge(&self, challenge_id: &str) -> bool {
        let path = format!("/api/challenge/{}/cancel", encode(challenge_id));
        self.api.call(&ApiRequest::post(path)).await.success
    }

    /// `GET /api/challenge` – open incoming and outgoing challenges.
    pub async fn open_challenges(&self) -> OpenChallenges {
        self.api
            .call(&ApiRequest::get("/api/challenge"))
            .await
            .json()
            .unwrap_or_default()
    }

    /// `GET /api/account/playing` – ids of the games in progress.
    pub async fn ongoing_games(&self) -> Vec<CompactString> {
        self.api
            .call(&ApiRequest::get("/api/account/playing"))
            .await
            .json::<NowPlaying>()
            .unwrap_or_default()
            .now_playing
            .into_iter()
            .map(|game| game.game_id)
            .collect()
    }

    /// `POST /api/bot/game/{id}/move/{uci}`
    pub async fn make_move(&self, game_id: &str, uci: &str, offer_draw: bool) -> bool {
        let path = format!("/api/bot/game/{}/move/{}", encode(game_id), encode(uci));
        let request = ApiRequest::post(path).query("offeringDraw", offer_draw);
        self.api.call(&request).await.success
    }

    /// `POST /api/bot/game/{id}/abort`
    pub async fn abort_game(&self, game_id: &str) -> bool {
        let path = format!("/api/bot/game/{}/abort", encode(game_id));
        self.api.call(&ApiRequest::post(path)).await.success
    }

    /// `POST /api/bot/game/{id}/resign`
    pub async fn resign_game(&self, game_id: &str) -> bool {
        let path = format!("/api/bot/game/{}/resign", encode(game_id));
        self.api.call(&ApiRequest::post(path)).await.success
    }

    /// `POST /api/bot/account/upgrade` – turn the account into a bot
    /// account. Irreversible.
    pub async fn upgrade_account(&self) -> bool {
        self.api
            .call(&ApiRequest::post("/api/bot/account/upgrade"))
            .await
            .success
    }
}
