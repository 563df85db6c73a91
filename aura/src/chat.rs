//! Streaming chat with the business assistant.
//!
//! [`Aura::open_chat`] is the transport: one POST, status classification, raw
//! byte stream. [`Aura::chat_stream`] adds SSE decoding. [`ChatSession`] owns
//! a transcript and drives the whole pipeline for one conversation view.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, watch};

use crate::client::Aura;
use crate::error::{Error, Result};
use crate::message::ChatTurn;
use crate::stream::{DeltaStream, FinishReason, StreamItem, decode_deltas};
use crate::transcript::{Transcript, TranscriptAccumulator};

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The new user message.
    pub message: String,
    /// Turns preceding the message, oldest first.
    pub conversation_history: Vec<ChatTurn>,
}

impl ChatRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(message: impl Into<String>, conversation_history: Vec<ChatTurn>) -> Self {
        Self {
            message: message.into(),
            conversation_history,
        }
    }
}

/// Result of a completed chat exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// Full text of the assistant reply.
    pub content: String,
    /// How the stream ended.
    pub finish: FinishReason,
}

impl Aura {
    /// Opens the chat stream and returns the raw response body.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRequest`] for a blank message; [`Error::RateLimited`],
    /// [`Error::PaymentRequired`] or [`Error::Transport`] when the function
    /// refuses or the response carries no body.
    pub async fn open_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<Bytes>>> {
        if request.message.trim().is_empty() {
            return Err(Error::invalid_request("message must not be empty"));
        }

        let function = self.config.chat_function.as_str();
        tracing::debug!(
            function,
            history = request.conversation_history.len(),
            "opening chat stream"
        );

        let response = self
            .build_request(Method::POST, function)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;
        let response = Self::check_status(function, response).await?;

        if response.status() == reqwest::StatusCode::NO_CONTENT
            || response.content_length() == Some(0)
        {
            return Err(Error::transport(format!("[{function}] response has no body")));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from))
            .boxed())
    }

    /// Opens the chat stream and decodes it into text deltas.
    ///
    /// # Errors
    ///
    /// See [`Aura::open_chat`]. Errors while reading the body arrive as
    /// stream items instead.
    pub async fn chat_stream(&self, request: &ChatRequest) -> Result<DeltaStream> {
        let bytes = self.open_chat(request).await?;
        let idle = self
            .config
            .idle_timeout_secs
            .map(std::time::Duration::from_secs);
        Ok(decode_deltas(bytes, idle))
    }
}

/// One conversation view: transcript plus at most one request in flight.
///
/// The transcript is republished on a [`watch`] channel after every change,
/// including each streamed delta.
#[derive(Debug)]
pub struct ChatSession {
    client: Aura,
    state: Mutex<TranscriptAccumulator>,
    publisher: watch::Sender<Vec<ChatTurn>>,
}

impl ChatSession {
    /// Opening message shown before the user says anything.
    pub const GREETING: &'static str = "Hello! I'm your AI Business Assistant. I can help you with business planning, market research, SWOT analysis, financial strategies, HR management, digital marketing, and much more. What would you like to work on today?";

    /// Creates a session whose transcript starts with [`Self::GREETING`].
    #[must_use]
    pub fn new(client: Aura) -> Self {
        Self::with_transcript(
            client,
            Transcript::from(vec![ChatTurn::assistant(Self::GREETING)]),
        )
    }

    /// Creates a session over an existing transcript.
    #[must_use]
    pub fn with_transcript(client: Aura, transcript: Transcript) -> Self {
        let acc = TranscriptAccumulator::new(transcript);
        let (publisher, _) = watch::channel(acc.snapshot());
        Self {
            client,
            state: Mutex::new(acc),
            publisher,
        }
    }

    /// Subscribes to transcript updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<ChatTurn>> {
        self.publisher.subscribe()
    }

    /// Latest published transcript, including a reply still being streamed.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.publisher.borrow().clone()
    }

    /// Returns `true` while a request is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.try_lock().is_err()
    }

    /// Sends a message and streams the reply into the transcript.
    ///
    /// # Errors
    ///
    /// See [`ChatSession::send_with`].
    pub async fn send(&self, message: &str) -> Result<ChatOutcome> {
        self.send_with(message, |_| {}).await
    }

    /// Like [`send`](Self::send), calling `on_delta` with each text fragment.
    ///
    /// The user turn is kept whatever happens. On a transport failure the
    /// assistant turn is removed again; if the stream turns out to be corrupt,
    /// the text received so far is kept as the reply. Dropping the returned
    /// future cancels the request and removes the unfinished reply.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`] if another request is in flight, [`Error::InvalidRequest`]
    /// for a blank message, and any transport error from [`Aura::open_chat`]
    /// or from reading the stream.
    pub async fn send_with<F>(&self, message: &str, mut on_delta: F) -> Result<ChatOutcome>
    where
        F: FnMut(&str) + Send,
    {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::invalid_request("message must not be empty"));
        }

        let state = self.state.try_lock().map_err(|_| Error::Busy)?;
        let mut flight = InFlight {
            state,
            publisher: &self.publisher,
        };

        let request = ChatRequest::new(message, flight.state.transcript().turns().to_vec());
        flight.state.push_user(message);
        flight.publish();

        let mut deltas = self.client.chat_stream(&request).await?;

        flight.state.begin();
        flight.publish();

        while let Some(item) = deltas.next().await {
            match item {
                Ok(StreamItem::Delta(text)) => {
                    flight.state.append(&text);
                    on_delta(&text);
                    flight.publish();
                }
                Ok(StreamItem::Finished(finish)) => {
                    return Ok(flight.complete(finish));
                }
                Err(err) => {
                    flight.state.discard();
                    flight.publish();
                    return Err(err);
                }
            }
        }

        Ok(flight.complete(FinishReason::Closed))
    }
}

/// Exclusive access to the accumulator for one request.
///
/// Dropping it with a reply still in flight (cancellation) removes the reply.
struct InFlight<'a> {
    state: MutexGuard<'a, TranscriptAccumulator>,
    publisher: &'a watch::Sender<Vec<ChatTurn>>,
}

impl InFlight<'_> {
    fn publish(&self) {
        self.publisher.send_replace(self.state.snapshot());
    }

    fn complete(&mut self, finish: FinishReason) -> ChatOutcome {
        let content = self
            .state
            .finalize()
            .map(|turn| turn.content.clone())
            .unwrap_or_default();
        self.publish();
        tracing::debug!(?finish, len = content.len(), "chat reply complete");
        ChatOutcome { content, finish }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.state.discard().is_some() {
            tracing::debug!("chat request cancelled, dropping unfinished reply");
            self.publish();
        }
    }
}
