//! Conversation transcript and the accumulator for the in-flight reply.

use serde::{Deserialize, Serialize};

use crate::message::ChatTurn;

/// Ordered sequence of completed turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Appends a completed turn.
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// Appends a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatTurn::user(content));
    }

    /// All completed turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Most recent turn.
    #[must_use]
    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if there are no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterates over the turns.
    pub fn iter(&self) -> std::slice::Iter<'_, ChatTurn> {
        self.turns.iter()
    }
}

impl From<Vec<ChatTurn>> for Transcript {
    fn from(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a ChatTurn;
    type IntoIter = std::slice::Iter<'a, ChatTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

/// Owns the transcript and the single assistant turn being streamed.
///
/// The in-flight turn lives outside the transcript until it is finalized, so
/// completed turns are never mutated.
#[derive(Debug, Clone, Default)]
pub struct TranscriptAccumulator {
    transcript: Transcript,
    in_flight: Option<ChatTurn>,
}

impl TranscriptAccumulator {
    /// Wraps an existing transcript.
    #[must_use]
    pub const fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            in_flight: None,
        }
    }

    /// Completed turns.
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Consumes the accumulator, dropping any unfinished turn.
    #[must_use]
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Appends a user turn to the transcript.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.transcript.push_user(content);
    }

    /// Starts a new, empty assistant turn.
    ///
    /// A turn still in flight is finalized first.
    pub fn begin(&mut self) {
        if self.in_flight.is_some() {
            tracing::debug!("begin() with a turn in flight, finalizing it");
            self.finalize();
        }
        self.in_flight = Some(ChatTurn::assistant(String::new()));
    }

    /// Appends a delta to the in-flight turn.
    ///
    /// Returns `false` (and drops the delta) when no turn is in flight.
    pub fn append(&mut self, delta: &str) -> bool {
        match &mut self.in_flight {
            Some(turn) => {
                turn.content.push_str(delta);
                true
            }
            None => false,
        }
    }

    /// Moves the in-flight turn into the transcript and returns it.
    ///
    /// A turn that never received any text is dropped instead, so the
    /// transcript never holds an empty assistant reply.
    pub fn finalize(&mut self) -> Option<&ChatTurn> {
        let turn = self.in_flight.take()?;
        if turn.content.is_empty() {
            return None;
        }
        self.transcript.push(turn);
        self.transcript.last()
    }

    /// Drops the in-flight turn, returning it.
    pub fn discard(&mut self) -> Option<ChatTurn> {
        self.in_flight.take()
    }

    /// The turn currently being streamed.
    #[must_use]
    pub const fn in_flight(&self) -> Option<&ChatTurn> {
        self.in_flight.as_ref()
    }

    /// Full transcript for display: completed turns plus the in-flight turn.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChatTurn> {
        self.transcript
            .iter()
            .chain(self.in_flight.as_ref())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn append_builds_in_flight_turn() {
        let mut acc = TranscriptAccumulator::default();
        acc.push_user("hi");
        acc.begin();
        assert!(acc.append("He"));
        assert!(acc.append("llo"));

        let snapshot = acc.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1], ChatTurn::assistant("Hello"));
        assert_eq!(acc.transcript().len(), 1);

        let turn = acc.finalize().expect("finalized");
        assert_eq!(turn.content, "Hello");
        assert_eq!(acc.transcript().len(), 2);
        assert!(acc.in_flight().is_none());
    }

    #[test]
    fn append_without_begin_is_dropped() {
        let mut acc = TranscriptAccumulator::default();
        assert!(!acc.append("lost"));
        assert!(acc.snapshot().is_empty());
    }

    #[test]
    fn empty_turn_is_not_kept() {
        let mut acc = TranscriptAccumulator::default();
        acc.begin();
        assert_eq!(acc.snapshot().len(), 1);
        assert!(acc.finalize().is_none());
        assert!(acc.snapshot().is_empty());
    }

    #[test]
    fn discard_removes_partial_turn() {
        let mut acc = TranscriptAccumulator::new(Transcript::from(vec![ChatTurn::user("q")]));
        acc.begin();
        acc.append("partial");
        let dropped = acc.discard().expect("in flight");
        assert_eq!(dropped.content, "partial");
        assert_eq!(acc.snapshot(), vec![ChatTurn::user("q")]);
    }

    #[test]
    fn into_transcript_drops_unfinished_turn() {
        let mut acc = TranscriptAccumulator::default();
        acc.push_user("q");
        acc.begin();
        acc.append("half an ans");

        let transcript = acc.into_transcript();
        assert_eq!(transcript.turns(), [ChatTurn::user("q")]);
    }

    #[test]
    fn begin_finalizes_previous_turn() {
        let mut acc = TranscriptAccumulator::default();
        acc.begin();
        acc.append("one");
        acc.begin();
        acc.append("two");
        acc.finalize();

        let roles: Vec<Role> = acc.transcript().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::Assistant]);
        assert_eq!(acc.transcript().turns()[0].content, "one");
    }

    #[test]
    fn transcript_serializes_as_array() {
        let transcript = Transcript::from(vec![ChatTurn::user("a"), ChatTurn::assistant("b")]);
        let json = serde_json::to_value(&transcript).expect("serialize");
        assert!(json.is_array());
        assert_eq!(json[1]["role"], "assistant");
    }
}
