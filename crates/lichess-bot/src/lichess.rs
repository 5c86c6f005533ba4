//! Lichess Bot API client

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::BotConfig;
use crate::error::BotError;
use crate::events::{GameEvent, IncomingEvent};
use crate::transport::{EventStream, Transport};

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
}

#[derive(Clone)]
pub struct LichessClient {
    client: Client,
    base_url: String,
    token: String,
}

impl LichessClient {
    pub fn new(config: &BotConfig) -> Result<Self, BotError> {
        // No overall timeout: event and game streams stay open for hours.
        let client = Client::builder()
            .user_agent("lichess-bot/0.1")
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Response, BotError> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(resp, path).await
    }

    async fn post(&self, path: &str) -> Result<Response, BotError> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(resp, path).await
    }

    async fn stream<T>(&self, path: &str) -> Result<EventStream<T>, BotError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .header("Accept", "application/x-ndjson")
            .send()
            .await?;
        let resp = check_status(resp, path).await?;
        debug!(path, "Stream opened");
        Ok(ndjson_stream(resp.bytes_stream()))
    }
}

#[async_trait]
impl Transport for LichessClient {
    async fn account_id(&self) -> Result<String, BotError> {
        let account: Account = self.get("/api/account").await?.json().await?;
        Ok(account.id)
    }

    async fn stream_incoming_events(&self) -> Result<EventStream<IncomingEvent>, BotError> {
        self.stream("/api/stream/event").await
    }

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), BotError> {
        self.post(&format!("/api/challenge/{challenge_id}/accept"))
            .await?;
        Ok(())
    }

    async fn stream_game_state(&self, game_id: &str) -> Result<EventStream<GameEvent>, BotError> {
        self.stream(&format!("/api/bot/game/stream/{game_id}")).await
    }

    async fn make_move(&self, game_id: &str, uci: &str) -> Result<(), BotError> {
        self.post(&format!("/api/bot/game/{game_id}/move/{uci}"))
            .await?;
        Ok(())
    }

    async fn resign_game(&self, game_id: &str) -> Result<(), BotError> {
        self.post(&format!("/api/bot/game/{game_id}/resign"))
            .await?;
        Ok(())
    }
}

async fn check_status(resp: Response, path: &str) -> Result<Response, BotError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(path, %status, body = %body, "Lichess request failed");
    Err(BotError::Transport(format!("HTTP {status} on {path}: {body}")))
}

struct LineState<S> {
    chunks: Pin<Box<S>>,
    buf: Vec<u8>,
    done: bool,
}

/// Decode newline-delimited JSON from a stream of byte chunks. Blank lines
/// (Lichess keep-alives) are skipped; a malformed line yields an error item
/// without ending the stream.
pub(crate) fn ndjson_stream<T, S, B, E>(chunks: S) -> EventStream<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = LineState {
        chunks: Box::pin(chunks),
        buf: Vec::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = next_line(&mut state.buf, state.done) {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                let item = serde_json::from_slice::<T>(&line).map_err(BotError::from);
                return Some((item, state));
            }

            if state.done {
                return None;
            }

            match state.chunks.next().await {
                Some(Ok(chunk)) => state.buf.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(BotError::Transport(e.to_string())), state));
                }
                None => state.done = true,
            }
        }
    })
    .boxed()
}

/// Take the next complete line out of `buf`. With `flush`, a trailing
/// unterminated line is returned too.
fn next_line(buf: &mut Vec<u8>, flush: bool) -> Option<Vec<u8>> {
    if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
        let mut line: Vec<u8> = buf.drain(..=pos).collect();
        line.pop();
        return Some(line);
    }
    if flush && !buf.is_empty() {
        return Some(std::mem::take(buf));
    }
    None
}
