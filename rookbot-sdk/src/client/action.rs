//! Authenticated single-request client with layered retries.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use super::ClientError;
use super::retry::{RetryPolicy, retry};
use crate::config::ApiConfig;

/// Timeout for ordinary (non-stream) requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const USER_AGENT: &str = concat!("rookbot/", env!("CARGO_PKG_VERSION"));

/// One API request: method, path relative to the base URL and optional
/// query/form parameters.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub form: Vec<(&'static str, String)>,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            form: Vec::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub fn form(mut self, key: &'static str, value: impl ToString) -> Self {
        self.form.push((key, value.to_string()));
        self
    }

    pub fn form_fields(mut self, fields: Vec<(&'static str, String)>) -> Self {
        self.form.extend(fields);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// What the caller of [`ActionClient::call`] gets back: never an error.
#[derive(Debug, Clone, Default)]
pub struct CallOutcome {
    pub success: bool,
    /// Final HTTP status, if any response was received.
    pub status: Option<StatusCode>,
    /// Body of a successful response.
    pub body: Option<Bytes>,
}

impl CallOutcome {
    /// Decode the body, or `None` if the call failed or the body is not `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        let body = self.body.as_ref()?;
        match serde_json::from_slice(body) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(error = %e, "Failed to decode response body");
                None
            }
        }
    }
}

fn build_http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            warn!(
                error = %e,
                "Failed to build the HTTP client, using defaults without connect timeout"
            );
            Client::new()
        })
}

/// Authenticated HTTP client applying the transport and server retry
/// policies to every request.
///
/// Cloning is cheap and clones share one connection pool.
#[derive(Clone)]
pub struct ActionClient {
    http: Client,
    base_url: Url,
    token: String,
    transport_policy: RetryPolicy,
    server_policy: RetryPolicy,
}

impl std::fmt::Debug for ActionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionClient")
            .field("base_url", &self.base_url.as_str())
            .field("transport_policy", &self.transport_policy)
            .field("server_policy", &self.server_policy)
            .finish_non_exhaustive()
    }
}

impl ActionClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            http: build_http_client(),
            base_url: config.base_url.clone(),
            token: config.token.clone(),
            transport_policy: RetryPolicy::transport(),
            server_policy: RetryPolicy::server(),
        }
    }

    /// Replace the default `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Override the retry policies, e.g. to shorten budgets in tests.
    pub fn with_retry_policies(mut self, transport: RetryPolicy, server: RetryPolicy) -> Self {
        self.transport_policy = transport;
        self.server_policy = server;
        self
    }

    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Open a long-lived GET stream: one attempt, no overall timeout.
    pub(crate) async fn open_stream(&self, path: &str) -> Result<reqwest::Response, ClientError> {
        let url = self.url(path)?;
        let resp = self.http.get(url).bearer_auth(&self.token).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, body));
        }
        Ok(resp)
    }

    /// [`open_stream`](Self::open_stream) under both retry layers.
    pub(crate) async fn open_stream_retried(
        &self,
        path: &str,
    ) -> Result<reqwest::Response, ClientError> {
        let transport = &self.transport_policy;
        retry(&self.server_policy, move || {
            retry(transport, move || self.open_stream(path))
        })
        .await
    }

    /// Send `request` through both retry layers and return the body of a
    /// successful response.
    pub async fn send(&self, request: &ApiRequest) -> Result<Bytes, ClientError> {
        self.send_with_status(request).await.map(|(_, body)| body)
    }

    async fn send_with_status(
        &self,
        request: &ApiRequest,
    ) -> Result<(StatusCode, Bytes), ClientError> {
        let transport = &self.transport_policy;
        retry(&self.server_policy, move || {
            retry(transport, move || self.send_once(request))
        })
        .await
    }

    /// [`send`](Self::send) and decode the body as JSON.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> Result<T, ClientError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(ClientError::Json)
    }

    /// Like [`send`](Self::send), but failures are logged and folded into
    /// the returned [`CallOutcome`].
    pub async fn call(&self, request: &ApiRequest) -> CallOutcome {
        match self.send_with_status(request).await {
            Ok((status, body)) => CallOutcome {
                success: true,
                status: Some(status),
                body: Some(body),
            },
            Err(e) => {
                match &e {
                    ClientError::Server { status, body }
                    | ClientError::Rejected { status, body } => {
                        error!(
                            request = %request.describe(),
                            status = %status,
                            body = %body,
                            "API request failed"
                        );
                    }
                    other => {
                        error!(request = %request.describe(), error = %other, "API request failed");
                    }
                }
                CallOutcome {
                    success: false,
                    status: e.status(),
                    body: None,
                }
            }
        }
    }

    /// One attempt, no retries.
    async fn send_once(&self, request: &ApiRequest) -> Result<(StatusCode, Bytes), ClientError> {
        let url = self.url(&request.path)?;
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .bearer_auth(&self.token)
            .timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(request = %request.describe(), status = %status, "Non-success response");
            return Err(ClientError::from_status(status, body));
        }
        Ok((status, resp.bytes().await?))
    }
}
