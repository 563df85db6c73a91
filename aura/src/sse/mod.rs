//! Server-sent-event framing and parsing for the chat stream.
//!
//! Bytes flow through [`LineFramer`] (chunks to lines) and [`EventParser`]
//! (lines to deltas). [`crate::stream::DeltaDecoder`] drives both.

mod framer;
mod parser;

pub use framer::LineFramer;
pub use parser::{
    DATA_PREFIX, DONE_SENTINEL, EventParser, LineOutcome, data_payload, delta_content,
};
