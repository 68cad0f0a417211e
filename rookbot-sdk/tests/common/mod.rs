#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use rookbot_sdk::client::{ActionClient, Backoff, BotClient, RetryPolicy};
use rookbot_sdk::config::ApiConfig;
use url::Url;

pub const TOKEN: &str = "lip_test_token";

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

/// A base URL nothing is listening on.
pub async fn dead_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{addr}")).unwrap()
}

pub fn transport_policy() -> RetryPolicy {
    RetryPolicy::transport()
        .with_backoff(Backoff::Constant(Duration::from_millis(10)))
        .with_max_elapsed(Duration::from_millis(200))
}

pub fn server_policy() -> RetryPolicy {
    RetryPolicy::server()
        .with_backoff(Backoff::Exponential {
            base: Duration::from_millis(10),
            ceiling: None,
        })
        .with_max_elapsed(Duration::from_millis(300))
}

/// An action client with short retry budgets.
pub fn action_client(base_url: Url) -> ActionClient {
    ActionClient::new(&ApiConfig::new(TOKEN, base_url))
        .with_retry_policies(transport_policy(), server_policy())
}

pub fn bot_client(base_url: Url) -> BotClient {
    BotClient::from_action_client(action_client(base_url))
}

pub fn fast_reconnect() -> Backoff {
    Backoff::Constant(Duration::from_millis(10))
}
