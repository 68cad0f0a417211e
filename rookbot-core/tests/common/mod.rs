#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::{self, StreamExt};
use rookbot_core::moves::{GameView, MoveChoice, MovePicker};
use rookbot_sdk::client::{ActionClient, Backoff, BotClient, RetryPolicy};
use rookbot_sdk::config::ApiConfig;
use serde_json::{Value, json};
use url::Url;

pub const ACCOUNT: &str = "RookBot";

/// Scripted platform: feeds are fixed bodies, actions are recorded.
#[derive(Default)]
pub struct Platform {
    /// Served on the first event stream connection, if set.
    pub first_event_feed: Option<String>,
    pub event_feed: String,
    /// Written to the event body after the feed, each after its delay.
    pub delayed_events: Vec<(Duration, Value)>,
    /// Keep the event body open instead of ending it.
    pub hold_event_feed: bool,
    pub event_connections: usize,
    pub game_feeds: HashMap<String, String>,
    pub roster: String,
    pub accepted: Vec<String>,
    pub declined: Vec<(String, String)>,
    pub created: Vec<(String, HashMap<String, String>)>,
    pub moves: Vec<(String, String)>,
    pub aborted: Vec<String>,
    pub resigned: Vec<String>,
}

pub type Shared = Arc<Mutex<Platform>>;

/// NDJSON body from a list of JSON values.
pub fn ndjson(lines: &[Value]) -> String {
    lines.iter().map(|line| format!("{line}\n")).collect()
}

async fn event_feed(State(state): State<Shared>) -> Body {
    let (feed, delayed, hold) = {
        let mut state = state.lock().unwrap();
        state.event_connections += 1;
        let feed = match state.first_event_feed.take() {
            Some(first) => first,
            None => state.event_feed.clone(),
        };
        (feed, state.delayed_events.clone(), state.hold_event_feed)
    };

    let head = stream::once(async move { Ok::<_, Infallible>(feed) });
    let delayed = stream::iter(delayed).then(|(delay, event)| async move {
        tokio::time::sleep(delay).await;
        Ok(format!("{event}\n"))
    });
    let body = head.chain(delayed);
    if hold {
        Body::from_stream(body.chain(stream::pending()))
    } else {
        Body::from_stream(body)
    }
}

async fn game_feed(State(state): State<Shared>, Path(id): Path<String>) -> (StatusCode, String) {
    match state.lock().unwrap().game_feeds.get(&id) {
        Some(body) => (StatusCode::OK, body.clone()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

async fn roster(State(state): State<Shared>) -> String {
    state.lock().unwrap().roster.clone()
}

async fn accept(State(state): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    state.lock().unwrap().accepted.push(id);
    Json(json!({ "ok": true }))
}

async fn decline(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let reason = form.get("reason").cloned().unwrap_or_default();
    state.lock().unwrap().declined.push((id, reason));
    Json(json!({ "ok": true }))
}

async fn create(
    State(state): State<Shared>,
    Path(opponent): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.created.push((opponent, form));
    let id = format!("ch{}", state.created.len());
    Json(json!({ "id": id, "status": "created" }))
}

async fn make_move(
    State(state): State<Shared>,
    Path((game, uci)): Path<(String, String)>,
    Query(_query): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.lock().unwrap().moves.push((game, uci));
    Json(json!({ "ok": true }))
}

async fn abort(State(state): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    state.lock().unwrap().aborted.push(id);
    Json(json!({ "ok": true }))
}

async fn resign(State(state): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    state.lock().unwrap().resigned.push(id);
    Json(json!({ "ok": true }))
}

/// Serve `platform` on an ephemeral port and return a client for it.
pub async fn serve(platform: Platform) -> (BotClient, Shared) {
    let state: Shared = Arc::new(Mutex::new(platform));
    let router = Router::new()
        .route("/api/stream/event", get(event_feed))
        .route("/api/bot/game/stream/{id}", get(game_feed))
        .route("/api/bot/online", get(roster))
        .route("/api/challenge/{id}", post(create))
        .route("/api/challenge/{id}/accept", post(accept))
        .route("/api/challenge/{id}/decline", post(decline))
        .route("/api/bot/game/{id}/move/{uci}", post(make_move))
        .route("/api/bot/game/{id}/abort", post(abort))
        .route("/api/bot/game/{id}/resign", post(resign))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let base_url = Url::parse(&format!("http://{addr}")).unwrap();
    let api = ActionClient::new(&ApiConfig::new("lip_test", base_url)).with_retry_policies(
        RetryPolicy::transport()
            .with_backoff(Backoff::Constant(Duration::from_millis(10)))
            .with_max_elapsed(Duration::from_millis(200)),
        RetryPolicy::server()
            .with_backoff(Backoff::Constant(Duration::from_millis(10)))
            .with_max_elapsed(Duration::from_millis(200)),
    );
    (BotClient::from_action_client(api), state)
}

/// Poll the recorded platform state until `done` holds or the wait runs out.
pub async fn wait_until(state: &Shared, done: impl Fn(&Platform) -> bool) -> bool {
    let poll = async {
        loop {
            let finished = done(&state.lock().unwrap());
            if finished {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll).await.is_ok()
}

/// Plays the given moves in order, then has nothing left.
pub struct ScriptedPicker {
    moves: Mutex<Vec<&'static str>>,
}

impl ScriptedPicker {
    pub fn new(moves: &[&'static str]) -> Self {
        let mut moves = moves.to_vec();
        moves.reverse();
        Self {
            moves: Mutex::new(moves),
        }
    }
}

#[async_trait]
impl MovePicker for ScriptedPicker {
    async fn pick(&self, _game: &GameView) -> Option<MoveChoice> {
        self.moves.lock().unwrap().pop().map(MoveChoice::new)
    }
}

pub fn challenge_event(id: &str, challenger: &str, variant: &str, rated: bool) -> Value {
    json!({
        "type": "challenge",
        "challenge": {
            "id": id,
            "status": "created",
            "challenger": { "id": challenger.to_lowercase(), "name": challenger },
            "destUser": { "id": "rookbot", "name": ACCOUNT },
            "variant": { "key": variant },
            "rated": rated,
            "speed": "blitz",
            "timeControl": { "type": "clock", "limit": 300, "increment": 3 }
        }
    })
}

pub fn game_full(id: &str, white: &str, black: &str, moves: &str) -> Value {
    json!({
        "type": "gameFull",
        "id": id,
        "variant": { "key": "standard" },
        "white": { "id": white, "name": white },
        "black": { "id": black, "name": black },
        "initialFen": "startpos",
        "state": game_state(moves, "started")
    })
}

pub fn game_state(moves: &str, status: &str) -> Value {
    json!({
        "type": "gameState",
        "moves": moves,
        "wtime": 180000,
        "btime": 180000,
        "winc": 0,
        "binc": 0,
        "status": status
    })
}
