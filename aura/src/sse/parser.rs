//! Server-sent-event line parsing.

use serde_json::Value;

use crate::error::{Error, Result};

/// Prefix of an SSE data line.
pub const DATA_PREFIX: &str = "data:";

/// Payload that terminates the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// JSON pointer to the text of the first choice.
const CONTENT_POINTER: &str = "/choices/0/delta/content";

/// Text carried by a streaming completion event, if any and non-empty.
///
/// Events are read loosely: `null` or differently typed fields count as
/// "no text", not as a broken frame.
#[must_use]
pub fn delta_content(event: &Value) -> Option<&str> {
    event
        .pointer(CONTENT_POINTER)
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
}

/// What a single line contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Comment, blank, non-data, or event without text.
    Skip,
    /// A text fragment for the transcript.
    Delta(String),
    /// The terminal sentinel was seen; nothing after it is read.
    Done,
    /// The payload did not parse; re-buffer the line and try again after more input.
    Retry,
}

/// Turns framed lines into stream outcomes.
///
/// A data line whose JSON fails to parse is answered with
/// [`LineOutcome::Retry`] once. If the very same line fails again on the
/// next attempt, the stream is considered corrupt and
/// [`Error::MalformedFrame`] is returned.
#[derive(Debug, Default, Clone)]
pub struct EventParser {
    retrying: Option<String>,
}

impl EventParser {
    /// Creates a parser with no retry pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a line read while more input may still arrive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedFrame`] when a line that was already retried
    /// fails to parse a second time.
    pub fn parse_line(&mut self, line: &str) -> Result<LineOutcome> {
        let Some(payload) = data_payload(line) else {
            return Ok(LineOutcome::Skip);
        };

        if payload == DONE_SENTINEL {
            self.retrying = None;
            return Ok(LineOutcome::Done);
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(event) => {
                self.retrying = None;
                Ok(outcome_of(&event))
            }
            Err(e) if self.retrying.as_deref() == Some(line) => {
                self.retrying = None;
                tracing::warn!(error = %e, line, "stream frame failed to parse after retry");
                Err(Error::malformed_frame(line))
            }
            Err(e) => {
                tracing::debug!(error = %e, "incomplete stream frame, waiting for more data");
                self.retrying = Some(line.to_owned());
                Ok(LineOutcome::Retry)
            }
        }
    }

    /// Parses a line from the end-of-stream flush.
    ///
    /// No more input is coming, so unparseable payloads are dropped instead
    /// of retried.
    pub fn parse_final_line(&mut self, line: &str) -> LineOutcome {
        let Some(payload) = data_payload(line) else {
            return LineOutcome::Skip;
        };

        if payload == DONE_SENTINEL {
            return LineOutcome::Done;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(event) => outcome_of(&event),
            Err(e) => {
                tracing::debug!(error = %e, line, "discarding trailing stream frame");
                LineOutcome::Skip
            }
        }
    }

    /// Returns `true` while a line is waiting for its retry.
    #[must_use]
    pub const fn is_retrying(&self) -> bool {
        self.retrying.is_some()
    }
}

/// Extracts the trimmed payload of a data line.
///
/// Comments (`:`-prefixed), blank lines and non-data fields yield `None`.
#[must_use]
pub fn data_payload(line: &str) -> Option<&str> {
    if line.starts_with(':') || line.trim().is_empty() {
        return None;
    }
    line.strip_prefix(DATA_PREFIX).map(str::trim)
}

fn outcome_of(event: &Value) -> LineOutcome {
    delta_content(event).map_or(LineOutcome::Skip, |text| LineOutcome::Delta(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &str = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;

    #[test]
    fn parses_text_delta() {
        let mut parser = EventParser::new();
        assert_eq!(
            parser.parse_line(HELLO).expect("ok"),
            LineOutcome::Delta("Hello".into())
        );
    }

    #[test]
    fn accepts_prefix_without_space() {
        let mut parser = EventParser::new();
        let line = r#"data:{"choices":[{"delta":{"content":"x"}}]}"#;
        assert_eq!(
            parser.parse_line(line).expect("ok"),
            LineOutcome::Delta("x".into())
        );
    }

    #[test]
    fn skips_comments_blanks_and_other_fields() {
        let mut parser = EventParser::new();
        for line in [": keep-alive", "", "   ", "\t", "event: message", "id: 7"] {
            assert_eq!(parser.parse_line(line).expect("ok"), LineOutcome::Skip, "{line:?}");
        }
        assert!(!parser.is_retrying());
    }

    #[test]
    fn skips_events_without_content() {
        let mut parser = EventParser::new();
        for line in [
            r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"data: {"choices":[{"delta":{"content":""}}]}"#,
            r#"data: {"choices":[]}"#,
            r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        ] {
            assert_eq!(parser.parse_line(line).expect("ok"), LineOutcome::Skip);
        }
    }

    #[test]
    fn skips_valid_json_of_unexpected_shape() {
        let mut parser = EventParser::new();
        for line in [
            r#"data: {"choices":[{"delta":null}]}"#,
            r#"data: {"choices":null}"#,
            r#"data: {"choices":[{"delta":{"content":42}}]}"#,
            r#"data: {"choices":[{"delta":{"content":null}}]}"#,
            r#"data: {"choices":{"delta":{"content":"x"}}}"#,
            r#"data: {"error":{"message":"overloaded"}}"#,
            r#"data: [1,2,3]"#,
            r#"data: "text""#,
        ] {
            assert_eq!(parser.parse_line(line).expect("ok"), LineOutcome::Skip, "{line}");
            assert_eq!(parser.parse_final_line(line), LineOutcome::Skip, "{line}");
        }
        assert!(!parser.is_retrying());
    }

    #[test]
    fn delta_content_reads_first_choice() {
        let event: Value = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#,
        )
        .expect("json");
        assert_eq!(delta_content(&event), Some("a"));
        assert_eq!(delta_content(&Value::Null), None);
    }

    #[test]
    fn detects_done_sentinel() {
        let mut parser = EventParser::new();
        assert_eq!(parser.parse_line("data: [DONE]").expect("ok"), LineOutcome::Done);
        assert_eq!(parser.parse_line("data:  [DONE]  ").expect("ok"), LineOutcome::Done);
    }

    #[test]
    fn retries_once_then_fails() {
        let mut parser = EventParser::new();
        let line = r#"data: {"choices":[{"delta""#;

        assert_eq!(parser.parse_line(line).expect("ok"), LineOutcome::Retry);
        assert!(parser.is_retrying());

        let err = parser.parse_line(line).expect_err("second failure is fatal");
        assert!(matches!(err, Error::MalformedFrame { line: ref l } if l == line));
        assert!(!parser.is_retrying());
    }

    #[test]
    fn retry_is_cleared_by_successful_line() {
        let mut parser = EventParser::new();
        assert_eq!(parser.parse_line("data: {bad").expect("ok"), LineOutcome::Retry);
        assert_eq!(
            parser.parse_line(HELLO).expect("ok"),
            LineOutcome::Delta("Hello".into())
        );
        // A fresh failure gets its own retry.
        assert_eq!(parser.parse_line("data: {bad").expect("ok"), LineOutcome::Retry);
    }

    #[test]
    fn final_line_never_retries() {
        let mut parser = EventParser::new();
        assert_eq!(parser.parse_final_line("data: {\"choi"), LineOutcome::Skip);
        assert_eq!(
            parser.parse_final_line(HELLO),
            LineOutcome::Delta("Hello".into())
        );
        assert_eq!(parser.parse_final_line("data: [DONE]"), LineOutcome::Done);
    }

    #[test]
    fn data_payload_trims() {
        assert_eq!(data_payload("data:   {}  "), Some("{}"));
        assert_eq!(data_payload(":data: x"), None);
        assert_eq!(data_payload("retry: 100"), None);
    }
}
