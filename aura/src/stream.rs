//! Streaming chat decoding.
//!
//! [`DeltaDecoder`] is the synchronous state machine: feed it raw chunks in
//! arrival order and it returns the text deltas they complete. [`decode_deltas`]
//! wraps it around an async byte stream, adding the optional idle timeout.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sse::{EventParser, LineFramer, LineOutcome};

/// Boxed stream of decoded chat items.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<StreamItem>> + Send>>;

/// An item produced by the chat stream decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// Text to append to the assistant turn.
    Delta(String),
    /// No further items follow.
    Finished(FinishReason),
}

impl StreamItem {
    /// Returns the text if this is a delta.
    #[must_use]
    pub fn as_delta(&self) -> Option<&str> {
        match self {
            Self::Delta(text) => Some(text),
            Self::Finished(_) => None,
        }
    }
}

/// Why a chat stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The terminal sentinel was received.
    #[default]
    Done,
    /// The transport closed without a sentinel.
    Closed,
    /// A frame stayed unparseable after its retry; content before it is kept.
    Malformed,
}

/// Incremental decoder from raw chunks to [`StreamItem`]s.
#[derive(Debug, Default)]
pub struct DeltaDecoder {
    framer: LineFramer,
    parser: EventParser,
    finished: Option<FinishReason>,
}

impl DeltaDecoder {
    /// Creates a decoder awaiting its first chunk.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk.
    ///
    /// The returned items end with [`StreamItem::Finished`] when the chunk
    /// completed the sentinel or a fatal frame. Chunks fed after that are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamItem> {
        let mut items = Vec::new();
        if self.finished.is_some() {
            return items;
        }

        self.framer.push(chunk);
        while let Some(line) = self.framer.next_line() {
            match self.parser.parse_line(&line) {
                Ok(LineOutcome::Skip) => {}
                Ok(LineOutcome::Delta(text)) => items.push(StreamItem::Delta(text)),
                Ok(LineOutcome::Done) => {
                    items.push(self.finish_with(FinishReason::Done));
                    break;
                }
                Ok(LineOutcome::Retry) => {
                    self.framer.unshift(&line);
                    break;
                }
                Err(err) => {
                    tracing::warn!(%err, "abandoning chat stream, keeping partial content");
                    items.push(self.finish_with(FinishReason::Malformed));
                    break;
                }
            }
        }

        items
    }

    /// Flushes the buffered remainder after the transport closed.
    ///
    /// Always ends with [`StreamItem::Finished`] unless the decoder had
    /// already finished.
    pub fn finish(&mut self) -> Vec<StreamItem> {
        let mut items = Vec::new();
        if self.finished.is_some() {
            return items;
        }

        for line in self.framer.finish() {
            match self.parser.parse_final_line(&line) {
                LineOutcome::Delta(text) => items.push(StreamItem::Delta(text)),
                LineOutcome::Done => {
                    items.push(self.finish_with(FinishReason::Done));
                    return items;
                }
                LineOutcome::Skip | LineOutcome::Retry => {}
            }
        }

        items.push(self.finish_with(FinishReason::Closed));
        items
    }

    /// The finish reason, once the decoder has finished.
    #[must_use]
    pub const fn finished(&self) -> Option<FinishReason> {
        self.finished
    }

    fn finish_with(&mut self, reason: FinishReason) -> StreamItem {
        self.finished = Some(reason);
        StreamItem::Finished(reason)
    }
}

/// Decodes an async byte stream into chat items.
///
/// Transport errors end the stream with `Err`. With `idle_timeout` set, a gap
/// longer than the limit between chunks is reported as [`Error::Transport`].
/// Dropping the returned stream drops `bytes`, releasing the connection.
pub fn decode_deltas<S, E>(bytes: S, idle_timeout: Option<Duration>) -> DeltaStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Error> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = DeltaDecoder::new();

        while decoder.finished().is_none() {
            let next = match idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, bytes.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!(secs = limit.as_secs(), "chat stream idle, giving up");
                        yield Err(Error::transport(format!("stream idle for {}s", limit.as_secs())));
                        break;
                    }
                },
                None => bytes.next().await,
            };

            let items = match next {
                Some(Ok(chunk)) => decoder.feed(&chunk),
                Some(Err(e)) => {
                    yield Err(e.into());
                    break;
                }
                None => decoder.finish(),
            };

            for item in items {
                if let Some(text) = item.as_delta() {
                    tracing::trace!(len = text.len(), "chat delta");
                }
                yield Ok(item);
            }
        }
    };

    Box::pin(stream)
}
