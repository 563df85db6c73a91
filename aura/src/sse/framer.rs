//! Incremental line framing of a chunked byte stream.

/// Splits an arbitrarily chunked byte stream into newline-terminated lines.
///
/// Bytes are decoded as UTF-8 as they arrive. A multi-byte sequence cut by a
/// chunk boundary is held back until the rest of it arrives; invalid bytes are
/// replaced with `U+FFFD`. Decoded text that has not yet seen a `\n` stays in
/// the pending buffer.
#[derive(Debug, Default, Clone)]
pub struct LineFramer {
    buffer: String,
    partial: Vec<u8>,
}

impl LineFramer {
    /// Creates an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a chunk and appends it to the pending buffer.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.partial.is_empty() {
            self.decode(chunk);
        } else {
            let mut bytes = std::mem::take(&mut self.partial);
            bytes.extend_from_slice(chunk);
            self.decode(&bytes);
        }
    }

    fn decode(&mut self, mut bytes: &[u8]) {
        loop {
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = bytes.split_at(e.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            bytes = &rest[len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk.
                            self.partial.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Removes and returns the next complete line, without its terminator.
    ///
    /// A single trailing `\r` is stripped so CRLF streams frame identically.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.find('\n')?;
        let mut line: String = self.buffer.drain(..=end).collect();
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }

    /// Puts a line (and its newline) back in front of the pending buffer.
    pub fn unshift(&mut self, line: &str) {
        self.buffer.insert(0, '\n');
        self.buffer.insert_str(0, line);
    }

    /// Flushes everything still buffered once the input has ended.
    ///
    /// The remainder is split with the same rule as [`next_line`](Self::next_line);
    /// the last line has no terminator. Returns nothing when the buffer is empty.
    pub fn finish(&mut self) -> Vec<String> {
        if !self.partial.is_empty() {
            let rest = std::mem::take(&mut self.partial);
            self.buffer.push_str(&String::from_utf8_lossy(&rest));
        }

        let remainder = std::mem::take(&mut self.buffer);
        if remainder.is_empty() {
            return Vec::new();
        }

        remainder
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned())
            .collect()
    }

    /// Text decoded but not yet returned as a line.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Returns `true` if no text or undecoded bytes are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.partial.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(framer: &mut LineFramer) -> Vec<String> {
        std::iter::from_fn(|| framer.next_line()).collect()
    }

    #[test]
    fn splits_complete_lines() {
        let mut framer = LineFramer::new();
        framer.push(b"one\ntwo\n");
        assert_eq!(drain(&mut framer), vec!["one", "two"]);
        assert!(framer.is_empty());
    }

    #[test]
    fn buffers_partial_line_across_chunks() {
        let mut framer = LineFramer::new();
        framer.push(b"data: {\"a\"");
        assert!(framer.next_line().is_none());
        assert_eq!(framer.pending(), "data: {\"a\"");

        framer.push(b":1}\nnext");
        assert_eq!(drain(&mut framer), vec!["data: {\"a\":1}"]);
        assert_eq!(framer.pending(), "next");
    }

    #[test]
    fn strips_carriage_return() {
        let mut framer = LineFramer::new();
        framer.push(b"a\r\n\r\nb\r\n");
        assert_eq!(drain(&mut framer), vec!["a", "", "b"]);
    }

    #[test]
    fn carries_split_utf8_sequence() {
        let bytes = "héllo\n".as_bytes();
        let mut framer = LineFramer::new();
        // 'é' is two bytes; cut between them.
        framer.push(&bytes[..2]);
        assert!(framer.next_line().is_none());
        framer.push(&bytes[2..]);
        assert_eq!(framer.next_line().as_deref(), Some("héllo"));
    }

    #[test]
    fn replaces_invalid_bytes() {
        let mut framer = LineFramer::new();
        framer.push(b"a\xffb\n");
        assert_eq!(framer.next_line().as_deref(), Some("a\u{fffd}b"));
    }

    #[test]
    fn unshift_restores_line_in_front() {
        let mut framer = LineFramer::new();
        framer.push(b"first\nsecond");
        let line = framer.next_line().expect("line");
        framer.unshift(&line);
        assert_eq!(framer.pending(), "first\nsecond");
        assert_eq!(framer.next_line().as_deref(), Some("first"));
    }

    #[test]
    fn finish_flushes_unterminated_remainder() {
        let mut framer = LineFramer::new();
        framer.push(b"x\r\ny");
        assert_eq!(framer.next_line().as_deref(), Some("x"));
        assert_eq!(framer.finish(), vec!["y"]);
        assert!(framer.is_empty());
        assert!(framer.finish().is_empty());
    }

    #[test]
    fn finish_on_empty_buffer_yields_nothing() {
        let mut framer = LineFramer::new();
        framer.push(b"done\n");
        let _ = drain(&mut framer);
        assert!(framer.finish().is_empty());
    }
}
