mod common;

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use futures_util::{StreamExt, stream};
use rookbot_sdk::client::{EventStream, read_ndjson};
use rookbot_sdk::objects::{Event, OnlineBot, PerfType};

type Connections = Arc<AtomicUsize>;

/// A feed whose body on the n-th connection is `bodies[n]`; connections
/// past the end get an empty body.
fn scripted_feed(bodies: &'static [&'static str]) -> (Router, Connections) {
    let connections = Connections::default();
    let router = Router::new()
        .route(
            "/api/stream/event",
            get(move |State(connections): State<Connections>| async move {
                let n = connections.fetch_add(1, Ordering::SeqCst);
                bodies.get(n).copied().unwrap_or("")
            }),
        )
        .with_state(connections.clone());
    (router, connections)
}

async fn open(router: Router) -> EventStream {
    common::bot_client(common::serve(router).await)
        .event_stream()
        .with_reconnect_backoff(common::fast_reconnect())
}

async fn collect(mut stream: EventStream) -> Vec<Event> {
    let mut events = Vec::new();
    let read_all = async {
        while let Some(event) = stream.next_event().await {
            events.push(event);
        }
    };
    tokio::time::timeout(Duration::from_secs(5), read_all)
        .await
        .expect("stream did not end");
    events
}

fn kinds(events: &[Event]) -> Vec<&str> {
    events.iter().map(Event::kind).collect()
}

#[tokio::test]
async fn blank_lines_are_delivered_as_pings() {
    let (router, _) = scripted_feed(&["\n \n\t\n"]);
    let events = collect(open(router).await).await;

    assert_eq!(events.len(), 3);
    assert!(events.iter().all(Event::is_ping));
}

#[tokio::test]
async fn events_keep_their_order_and_the_feed_ends_with_the_body() {
    let (router, connections) = scripted_feed(&[concat!(
        "{\"type\":\"challenge\",\"challenge\":{\"id\":\"c1\"}}\n",
        "\n",
        "{\"type\":\"gameStart\",\"game\":{\"gameId\":\"g1\"}}\r\n",
        "{\"type\":\"gameFinish\",\"game\":{\"gameId\":\"g1\"}}",
    )]);
    let events = collect(open(router).await).await;

    assert_eq!(
        kinds(&events),
        vec!["challenge", "ping", "gameStart", "gameFinish"]
    );
    assert_eq!(events[2].game_id(), Some("g1"));
    assert_eq!(connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_line_triggers_a_reconnect() {
    let (router, connections) = scripted_feed(&[
        "{\"type\":\"first\"}\n{not json\n{\"type\":\"lost\"}\n",
        "{\"type\":\"second\"}\n",
    ]);
    let events = collect(open(router).await).await;

    assert_eq!(kinds(&events), vec!["first", "second"]);
    assert_eq!(connections.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn server_errors_on_open_are_reconnected() {
    let connections = Connections::default();
    let router = Router::new()
        .route(
            "/api/stream/event",
            get(|State(connections): State<Connections>| async move {
                if connections.fetch_add(1, Ordering::SeqCst) < 2 {
                    (StatusCode::SERVICE_UNAVAILABLE, "")
                } else {
                    (StatusCode::OK, "{\"type\":\"gameStart\",\"game\":{\"id\":\"g7\"}}\n")
                }
            }),
        )
        .with_state(connections.clone());
    let events = collect(open(router).await).await;

    assert_eq!(kinds(&events), vec!["gameStart"]);
    assert_eq!(events[0].game_id(), Some("g7"));
    assert_eq!(connections.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_on_open_end_the_stream() {
    let connections = Connections::default();
    let router = Router::new()
        .route(
            "/api/stream/event",
            get(|State(connections): State<Connections>| async move {
                connections.fetch_add(1, Ordering::SeqCst);
                (StatusCode::UNAUTHORIZED, "{\"error\":\"No such token\"}")
            }),
        )
        .with_state(connections.clone());
    let events = collect(open(router).await).await;

    assert!(events.is_empty());
    assert_eq!(connections.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn into_stream_yields_the_same_events() {
    let (router, _) = scripted_feed(&["{\"type\":\"a\"}\n{\"type\":\"b\"}\n"]);
    let events: Vec<Event> = open(router).await.into_stream().collect().await;

    assert_eq!(kinds(&events), vec!["a", "b"]);
}

#[tokio::test]
async fn roster_feed_skips_blank_and_bad_lines() {
    let router = Router::new().route(
        "/api/bot/online",
        get(|| async {
            concat!(
                "{\"username\":\"Alpha\",\"perfs\":{\"blitz\":{\"rating\":1600,\"games\":40}}}\n",
                "\n",
                "this is not json\n",
                "{\"username\":\"Beta\",\"perfs\":{}}\n",
            )
        }),
    );
    let bots: Vec<OnlineBot> = common::bot_client(common::serve(router).await)
        .online_bots()
        .collect()
        .await;

    assert_eq!(bots.len(), 2);
    assert_eq!(bots[0].name, "Alpha");
    assert_eq!(bots[0].rating(PerfType::Blitz), 1600);
    assert_eq!(bots[0].num_games(PerfType::Blitz), 40);
    assert_eq!(bots[1].rating(PerfType::Blitz), 1500);
    assert_eq!(bots[1].num_games(PerfType::Blitz), 0);
}

#[tokio::test]
async fn unreachable_roster_feed_is_empty() {
    let client = common::action_client(common::dead_url().await);
    let bots: Vec<OnlineBot> = read_ndjson(client, "/api/bot/online").collect().await;

    assert!(bots.is_empty());
}

#[tokio::test]
async fn cancelled_read_keeps_the_connection() {
    let connections = Connections::default();
    let router = Router::new()
        .route(
            "/api/stream/event",
            get(move |State(connections): State<Connections>| async move {
                connections.fetch_add(1, Ordering::SeqCst);
                let first = stream::once(async {
                    Ok::<_, Infallible>("{\"type\":\"challenge\",\"challenge\":{\"id\":\"c1\"}}\n")
                });
                let second = stream::once(async {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    Ok("{\"type\":\"gameStart\",\"game\":{\"gameId\":\"g1\"}}\n")
                });
                Body::from_stream(first.chain(second))
            }),
        )
        .with_state(connections.clone());
    let mut stream = open(router).await;

    let first = stream.next_event().await.unwrap();
    assert_eq!(first.kind(), "challenge");

    // Nothing arrives in time; the pending read is dropped.
    let pending = tokio::time::timeout(Duration::from_millis(50), stream.next_event()).await;
    assert!(pending.is_err());

    let events = collect(stream).await;
    assert_eq!(kinds(&events), vec!["gameStart"]);
    assert_eq!(connections.load(Ordering::SeqCst), 1);
}
