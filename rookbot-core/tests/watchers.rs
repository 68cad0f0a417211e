mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    ACCOUNT, Platform, ScriptedPicker, challenge_event, game_full, game_state, ndjson, wait_until,
};
use rookbot_core::config::{ChallengePolicy, ConfigStore};
use rookbot_core::processors::{ActiveGames, EventWatcher, GameLauncher};
use rookbot_sdk::objects::Variant;
use serde_json::json;
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn event_watcher_answers_challenges_by_policy() {
    let platform = Platform {
        event_feed: ndjson(&[
            challenge_event("c1", "Friendly", "standard", true),
            json!({}),
            challenge_event("c2", "Atomist", "atomic", true),
            challenge_event("c3", ACCOUNT, "standard", true),
            json!({
                "type": "challengeCanceled",
                "challenge": { "id": "c4", "variant": { "key": "standard" } }
            }),
        ]),
        ..Platform::default()
    };
    let (client, state) = common::serve(platform).await;

    let games = ActiveGames::new();
    let launcher = GameLauncher::new(
        client.clone(),
        "rookbot",
        Arc::new(ScriptedPicker::new(&[])),
        games,
    );
    let watcher = EventWatcher::new(
        client,
        "rookbot",
        ConfigStore::new(ChallengePolicy::default()),
        launcher,
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::time::timeout(WAIT, watcher.run(shutdown_rx)).await.unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.accepted, vec!["c1"]);
    assert_eq!(state.declined, vec![("c2".to_owned(), "standard".to_owned())]);
}

#[tokio::test]
async fn busy_bot_declines_with_later() {
    let platform = Platform {
        event_feed: ndjson(&[challenge_event("c1", "Friendly", "standard", false)]),
        ..Platform::default()
    };
    let (client, state) = common::serve(platform).await;

    let games = ActiveGames::new();
    let _running = games.claim("elsewhere").unwrap();
    let launcher = GameLauncher::new(
        client.clone(),
        "rookbot",
        Arc::new(ScriptedPicker::new(&[])),
        games,
    );
    let policy = ChallengePolicy {
        variants: vec![Variant::Standard, Variant::Chess960],
        max_games: 1,
        ..ChallengePolicy::default()
    };
    let watcher = EventWatcher::new(client, "rookbot", ConfigStore::new(policy), launcher);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::time::timeout(WAIT, watcher.run(shutdown_rx)).await.unwrap();

    let state = state.lock().unwrap();
    assert!(state.accepted.is_empty());
    assert_eq!(state.declined, vec![("c1".to_owned(), "later".to_owned())]);
}

#[tokio::test]
async fn game_start_launches_a_watcher_that_plays() {
    let mut platform = Platform {
        event_feed: ndjson(&[
            json!({ "type": "gameStart", "game": { "gameId": "g1", "id": "g1" } }),
            // Announced again, as after a reconnect.
            json!({ "type": "gameStart", "game": { "gameId": "g1", "id": "g1" } }),
        ]),
        ..Platform::default()
    };
    platform.game_feeds.insert(
        "g1".to_owned(),
        ndjson(&[
            game_full("g1", "rookbot", "opponent", ""),
            game_state("e2e4", "started"),
            game_state("e2e4 e7e5", "started"),
            game_state("e2e4 e7e5 g1f3", "started"),
            game_state("e2e4 e7e5 g1f3 b8c6", "resign"),
        ]),
    );
    let (client, state) = common::serve(platform).await;

    let games = ActiveGames::new();
    let launcher = GameLauncher::new(
        client.clone(),
        "rookbot",
        Arc::new(ScriptedPicker::new(&["e2e4", "g1f3"])),
        games.clone(),
    );
    let watcher = EventWatcher::new(
        client,
        "rookbot",
        ConfigStore::new(ChallengePolicy::default()),
        launcher,
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::time::timeout(WAIT, watcher.run(shutdown_rx)).await.unwrap();

    let state = state.lock().unwrap();
    assert_eq!(
        state.moves,
        vec![
            ("g1".to_owned(), "e2e4".to_owned()),
            ("g1".to_owned(), "g1f3".to_owned()),
        ]
    );
    assert!(state.resigned.is_empty());
    assert!(games.is_idle());
}

#[tokio::test]
async fn without_a_move_the_watcher_aborts_early_and_resigns_late() {
    let mut platform = Platform::default();
    platform
        .game_feeds
        .insert("early".to_owned(), ndjson(&[game_full("early", "opponent", "rookbot", "e2e4")]));
    platform.game_feeds.insert(
        "late".to_owned(),
        ndjson(&[game_full("late", "rookbot", "opponent", "e2e4 e7e5")]),
    );
    let (client, state) = common::serve(platform).await;

    let games = ActiveGames::new();
    let launcher = GameLauncher::new(
        client,
        "rookbot",
        Arc::new(ScriptedPicker::new(&[])),
        games.clone(),
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let early = launcher.launch("early", shutdown_rx.clone()).unwrap();
    let late = launcher.launch("late", shutdown_rx.clone()).unwrap();
    assert!(launcher.launch("late", shutdown_rx).is_none());

    tokio::time::timeout(WAIT, early).await.unwrap().unwrap();
    tokio::time::timeout(WAIT, late).await.unwrap().unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.aborted, vec!["early"]);
    assert_eq!(state.resigned, vec!["late"]);
    assert!(state.moves.is_empty());
    assert!(games.is_idle());
}

#[tokio::test]
async fn watcher_ignores_games_it_does_not_play() {
    let mut platform = Platform::default();
    platform
        .game_feeds
        .insert("tv".to_owned(), ndjson(&[game_full("tv", "alice", "bob", "")]));
    let (client, state) = common::serve(platform).await;

    let launcher = GameLauncher::new(
        client,
        "rookbot",
        Arc::new(ScriptedPicker::new(&["e2e4"])),
        ActiveGames::new(),
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = launcher.launch("tv", shutdown_rx).unwrap();
    tokio::time::timeout(WAIT, handle).await.unwrap().unwrap();

    let state = state.lock().unwrap();
    assert!(state.moves.is_empty());
    assert!(state.aborted.is_empty());
    assert!(state.resigned.is_empty());
}

#[tokio::test]
async fn shutdown_stops_the_event_watcher() {
    let platform = Platform::default();
    let (client, _state) = common::serve(platform).await;
    let launcher = GameLauncher::new(
        client.clone(),
        "rookbot",
        Arc::new(ScriptedPicker::new(&[])),
        ActiveGames::new(),
    );
    let watcher = EventWatcher::new(
        client,
        "rookbot",
        ConfigStore::new(ChallengePolicy::default()),
        launcher,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(WAIT, watcher.run(shutdown_rx)).await.unwrap();
}

#[tokio::test]
async fn event_watcher_keeps_reading_after_a_game_ends() {
    let mut platform = Platform {
        event_feed: ndjson(&[json!({
            "type": "gameStart",
            "game": { "gameId": "g1", "id": "g1" }
        })]),
        delayed_events: vec![(
            Duration::from_millis(500),
            challenge_event("c1", "Friendly", "standard", true),
        )],
        hold_event_feed: true,
        ..Platform::default()
    };
    platform.game_feeds.insert(
        "g1".to_owned(),
        ndjson(&[
            game_full("g1", "opponent", "rookbot", ""),
            game_state("e2e4", "mate"),
        ]),
    );
    let (client, state) = common::serve(platform).await;

    let games = ActiveGames::new();
    let launcher = GameLauncher::new(
        client.clone(),
        "rookbot",
        Arc::new(ScriptedPicker::new(&[])),
        games.clone(),
    );
    let watcher = EventWatcher::new(
        client,
        "rookbot",
        ConfigStore::new(ChallengePolicy::default()),
        launcher,
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(watcher.run(shutdown_rx));

    assert!(wait_until(&state, |p| p.accepted == vec!["c1"]).await);
    assert!(!task.is_finished());
    assert!(games.is_idle());
    assert_eq!(state.lock().unwrap().event_connections, 1);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn event_watcher_survives_a_reconnect() {
    let mut first = ndjson(&[challenge_event("c1", "Friendly", "standard", true)]);
    first.push_str("{\"type\": \"challenge\", oops\n");
    let platform = Platform {
        first_event_feed: Some(first),
        event_feed: ndjson(&[challenge_event("c2", "Patzer", "standard", false)]),
        ..Platform::default()
    };
    let (client, state) = common::serve(platform).await;

    let launcher = GameLauncher::new(
        client.clone(),
        "rookbot",
        Arc::new(ScriptedPicker::new(&[])),
        ActiveGames::new(),
    );
    let watcher = EventWatcher::new(
        client,
        "rookbot",
        ConfigStore::new(ChallengePolicy::default()),
        launcher,
    );
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::time::timeout(WAIT, watcher.run(shutdown_rx)).await.unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.event_connections, 2);
    assert_eq!(state.accepted, vec!["c1", "c2"]);
}
