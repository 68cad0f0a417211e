//! NDJSON feed readers.
//!
//! [`EventStream`] is the persistent reader used for the event and game
//! streams. It is a small state machine:
//!
//! ```text
//!   Connecting --open ok--> Streaming --fault--> Connecting
//!        |                      |
//!        +--4xx--> Closed <--end of body
//! ```
//!
//! Any fault while streaming (read error, malformed line) is logged and the
//! feed is reopened after a jittered exponential delay. There is no limit
//! on the number of reconnects. The delay resets after every successful
//! open.
//!
//! [`read_ndjson`] is the finite variant used for roster snapshots: it
//! opens once, decodes every line and stops at the end of the body.

use std::marker::PhantomData;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::ClientError;
use super::action::ActionClient;
use super::retry::{Backoff, jittered};
use crate::ndjson::LineBuffer;
use crate::objects::Event;

/// Delay between reconnect attempts: 250 ms doubling up to 30 s.
pub const RECONNECT_BACKOFF: Backoff = Backoff::Exponential {
    base: Duration::from_millis(250),
    ceiling: Some(Duration::from_secs(30)),
};

type Body = BoxStream<'static, reqwest::Result<Bytes>>;

/// Failures while consuming an open stream. Each one triggers a reconnect.
#[derive(Debug, thiserror::Error)]
pub enum StreamFault {
    #[error("failed to open stream: {0}")]
    Open(ClientError),

    #[error("failed to read stream: {0}")]
    Read(#[from] reqwest::Error),

    #[error("malformed line: {0}")]
    Decode(#[from] serde_json::Error),
}

enum ReaderState {
    /// Waiting to (re)open the feed, not before `retry_at` if set.
    Connecting { retry_at: Option<Instant> },
    Streaming { body: Body, lines: LineBuffer },
    Closed,
}

/// A persistent, self-healing event feed.
///
/// Use [`next_event`](Self::next_event) directly or convert it with
/// [`into_stream`](Self::into_stream).
pub struct EventStream {
    client: ActionClient,
    path: String,
    reconnect: Backoff,
    failures: u32,
    state: ReaderState,
}

impl EventStream {
    pub fn new(client: ActionClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            reconnect: RECONNECT_BACKOFF,
            failures: 0,
            state: ReaderState::Connecting { retry_at: None },
        }
    }

    pub fn with_reconnect_backoff(mut self, backoff: Backoff) -> Self {
        self.reconnect = backoff;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next event, or `None` once the server has ended the feed or refused
    /// to open it.
    ///
    /// Cancel-safe: dropping the returned future keeps the open body and
    /// any buffered lines, so it can be raced in `select!`.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match &mut self.state {
                ReaderState::Closed => return None,

                ReaderState::Connecting { retry_at } => {
                    if let Some(deadline) = *retry_at {
                        tokio::time::sleep_until(deadline).await;
                    }
                    match self.client.open_stream(&self.path).await {
                        Ok(resp) => {
                            info!(path = %self.path, "Stream connected");
                            self.failures = 0;
                            self.state = ReaderState::Streaming {
                                body: resp.bytes_stream().boxed(),
                                lines: LineBuffer::new(),
                            };
                        }
                        Err(e @ (ClientError::Rejected { .. } | ClientError::Url(_))) => {
                            error!(
                                path = %self.path,
                                error = %e,
                                "Stream refused, not reconnecting"
                            );
                            self.state = ReaderState::Closed;
                            return None;
                        }
                        Err(e) => self.fault(StreamFault::Open(e)),
                    }
                }

                ReaderState::Streaming { body, lines } => {
                    if let Some(line) = lines.next_line() {
                        match Event::decode_line(&line) {
                            Ok(event) => return Some(event),
                            Err(e) => {
                                self.fault(StreamFault::Decode(e));
                                continue;
                            }
                        }
                    }

                    let next = body.next().await;
                    match next {
                        Some(Ok(chunk)) => lines.extend(&chunk),
                        Some(Err(e)) => self.fault(StreamFault::Read(e)),
                        None => {
                            let rest = lines.finish();
                            self.state = ReaderState::Closed;
                            info!(path = %self.path, "Stream ended by server");
                            return rest.and_then(|rest| self.decode_final_line(&rest));
                        }
                    }
                }
            }
        }
    }

    fn decode_final_line(&self, line: &[u8]) -> Option<Event> {
        match Event::decode_line(line) {
            Ok(event) if !event.is_ping() => Some(event),
            Ok(_) => None,
            Err(e) => {
                warn!(path = %self.path, error = %e, "Dropping truncated final line");
                None
            }
        }
    }

    /// Log the fault and schedule a reconnect after the backoff delay.
    fn fault(&mut self, fault: StreamFault) {
        let delay = jittered(self.reconnect.delay(self.failures));
        self.failures = self.failures.saturating_add(1);
        error!(
            path = %self.path,
            error = %fault,
            attempt = self.failures,
            delay_ms = delay.as_millis() as u64,
            "Stream fault, reconnecting"
        );
        self.state = ReaderState::Connecting {
            retry_at: Some(Instant::now() + delay),
        };
    }

    pub fn into_stream(self) -> impl Stream<Item = Event> + Send + 'static {
        futures_util::stream::unfold(self, |mut reader| async move {
            let event = reader.next_event().await?;
            Some((event, reader))
        })
    }
}

struct NdjsonReader<T> {
    client: ActionClient,
    path: String,
    body: Option<Body>,
    lines: LineBuffer,
    opened: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> NdjsonReader<T> {
    async fn next_item(&mut self) -> Option<T> {
        if !self.opened {
            self.opened = true;
            match self.client.open_stream_retried(&self.path).await {
                Ok(resp) => self.body = Some(resp.bytes_stream().boxed()),
                Err(e) => {
                    error!(path = %self.path, error = %e, "Could not open feed");
                    return None;
                }
            }
        }

        loop {
            let line = match self.lines.next_line() {
                Some(line) => line,
                None => {
                    let body = self.body.as_mut()?;
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            self.lines.extend(&chunk);
                            continue;
                        }
                        Some(Err(e)) => {
                            error!(path = %self.path, error = %e, "Feed interrupted");
                            self.body = None;
                            return None;
                        }
                        None => {
                            self.body = None;
                            self.lines.finish()?
                        }
                    }
                }
            };

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice(&line) {
                Ok(item) => return Some(item),
                Err(e) => warn!(path = %self.path, error = %e, "Skipping undecodable line"),
            }
        }
    }
}

/// Read a finite NDJSON feed once, yielding one `T` per non-blank line.
///
/// Opening goes through the client's retry layers. A feed that cannot be
/// opened yields nothing. There is no reconnect.
pub fn read_ndjson<T>(client: ActionClient, path: impl Into<String>) -> impl Stream<Item = T> + Send
where
    T: DeserializeOwned + Send + 'static,
{
    let reader = NdjsonReader::<T> {
        client,
        path: path.into(),
        body: None,
        lines: LineBuffer::new(),
        opened: false,
        _item: PhantomData,
    };
    futures_util::stream::unfold(reader, |mut reader| async move {
        let item = reader.next_item().await?;
        Some((item, reader))
    })
}
