//! Chat endpoint client with streaming support

use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reach_core::{format_message, TurnReader, WireMessage};
use reqwest::{header::CONTENT_TYPE, Client, Response};
use tokio_util::sync::CancellationToken;

use super::types::*;
use crate::config::ChatConfig;
use crate::error::{ChatError, Result};

/// HTTP client for one chat endpoint
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: String,
    client: Client,
    idle_timeout: Option<Duration>,
}

impl ChatClient {
    /// Create a client with default timeouts
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::from_config(&ChatConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
    }

    /// Create a client from the widget config
    pub fn from_config(config: &ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            client,
            idle_timeout: config.idle_timeout(),
        })
    }

    /// Abort a turn after this long without response bytes; `None` waits forever
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    // ========================================================================
    // Internal HTTP Methods
    // ========================================================================

    /// POST the conversation and check the status
    async fn post_chat(&self, messages: &[WireMessage]) -> Result<Response> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { messages })
            .send();

        let response = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ChatError::IdleTimeout(limit))??,
            None => request.await?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ErrorBody::message_from(&body);
            tracing::warn!(status = status.as_u16(), ?message, "chat request rejected");
            return Err(ChatError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    // ========================================================================
    // Chat API
    // ========================================================================

    /// Send the conversation and follow the reply.
    ///
    /// Yields a [`TurnEvent::Delta`] each time the accumulated text grows and
    /// exactly one terminal event. Cancelling `cancel` drops the response body
    /// and seals whatever text has arrived.
    pub fn send_stream(
        &self,
        messages: Vec<WireMessage>,
        cancel: CancellationToken,
    ) -> impl Stream<Item = TurnEvent> + Send + 'static {
        let this = self.clone();

        async_stream::stream! {
            tracing::info!(endpoint = %this.endpoint, messages = messages.len(), "sending chat request");

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = this.post_chat(&messages) => Some(result),
            };

            let response = match response {
                None => {
                    tracing::info!("turn cancelled before a response");
                    yield sealed(String::new(), TurnEnd::Cancelled);
                    return;
                }
                Some(Ok(response)) => response,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "chat request failed");
                    yield TurnEvent::Failed { message: e.user_message() };
                    return;
                }
            };

            if !is_streaming(&response) {
                let reply = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    reply = read_reply(response, this.idle_timeout) => Some(reply),
                };
                match reply {
                    None => {
                        tracing::info!("turn cancelled while reading the reply");
                        yield sealed(String::new(), TurnEnd::Cancelled);
                    }
                    Some(Ok(reply)) => {
                        tracing::info!(bytes = reply.len(), "received reply");
                        yield sealed(reply, TurnEnd::Completed);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "reply read failed");
                        yield TurnEvent::Failed { message: e.user_message() };
                    }
                }
                return;
            }

            let mut body = Box::pin(response.bytes_stream());
            let mut reader = TurnReader::new();

            let end = loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break TurnEnd::Cancelled,
                    next = next_chunk(&mut body, this.idle_timeout) => next,
                };

                match next {
                    Ok(Some(chunk)) => {
                        let outcome = reader.push_chunk(&chunk);
                        if outcome.appended {
                            let text = reader.text().to_string();
                            let blocks = format_message(&text);
                            yield TurnEvent::Delta { text, blocks };
                        }
                        if outcome.finished {
                            break TurnEnd::Finished;
                        }
                    }
                    Ok(None) => break TurnEnd::Completed,
                    Err(e) => {
                        tracing::warn!(error = %e, "stream interrupted");
                        break TurnEnd::Interrupted(e.user_message());
                    }
                }
            };
            drop(body);

            // A trailing line is only complete when the body ended normally
            if end == TurnEnd::Completed {
                reader.finish();
            } else {
                reader.abandon();
            }
            tracing::info!(end = ?end, bytes = reader.text().len(), "turn ended");
            yield sealed(reader.into_text(), end);
        }
    }
}

fn sealed(text: String, end: TurnEnd) -> TurnEvent {
    let blocks = format_message(&text);
    TurnEvent::Sealed { text, blocks, end }
}

fn is_streaming(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_streaming_content_type)
}

/// Non-streaming body: `reply` or `text`, else the fallback reply.
///
/// The body is read chunk by chunk under the same idle limit as a stream.
async fn read_reply(response: Response, idle_timeout: Option<Duration>) -> Result<String> {
    let mut body = Box::pin(response.bytes_stream());
    let mut raw = Vec::new();
    while let Some(chunk) = next_chunk(&mut body, idle_timeout).await? {
        raw.extend_from_slice(&chunk);
    }

    Ok(match serde_json::from_slice::<ReplyBody>(&raw) {
        Ok(body) => body.into_reply(),
        Err(e) => {
            tracing::debug!(error = %e, "unreadable reply body");
            FALLBACK_REPLY.to_string()
        }
    })
}

/// Next body chunk, `None` at end of body.
async fn next_chunk<S>(body: &mut S, idle_timeout: Option<Duration>) -> Result<Option<Bytes>>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin,
{
    let next = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, body.next())
            .await
            .map_err(|_| ChatError::IdleTimeout(limit))?,
        None => body.next().await,
    };
    next.transpose().map_err(|e| ChatError::Stream(e.to_string()))
}
