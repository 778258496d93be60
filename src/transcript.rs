//! Transcript state for the console.
//!
//! The transcript is a plain ordered sequence of lines, independent of any
//! rendering surface. The TUI projects it onto the terminal; tests drive the
//! state directly.

/// What a transcript entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Echo of a submitted command.
    Command,
    /// Payload text returned by the query endpoint.
    Response,
    /// A request that failed at the network layer.
    Failure,
    /// A request that hit the configured timeout.
    Timeout,
}

/// A single transcript entry. Response entries may span multiple display
/// rows; they are split only at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    pub text: String,
}

impl TranscriptLine {
    /// Number of display rows this entry occupies.
    pub fn display_rows(&self) -> usize {
        self.text.lines().count().max(1)
    }
}

/// Ordered log of command/response lines shown to the user.
///
/// Created empty, appended to on each submit/outcome, fully cleared on a
/// clear action. Not persisted.
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the echo of a submitted command, rendered as `cmd><value>`.
    pub fn push_command(&mut self, command: &str) {
        self.lines.push(TranscriptLine {
            kind: LineKind::Command,
            text: format!("cmd>{}", command),
        });
    }

    /// Append a response payload. A trailing newline is implied by the
    /// line-oriented display and stripped here.
    pub fn push_response(&mut self, payload: &str) {
        let text = payload.strip_suffix('\n').unwrap_or(payload);
        self.lines.push(TranscriptLine {
            kind: LineKind::Response,
            text: text.to_string(),
        });
    }

    /// Append a network-failure notice.
    pub fn push_failure(&mut self, detail: &str) {
        self.lines.push(TranscriptLine {
            kind: LineKind::Failure,
            text: format!("[failed] {}", detail),
        });
    }

    /// Append a timeout notice.
    pub fn push_timeout(&mut self) {
        self.lines.push(TranscriptLine {
            kind: LineKind::Timeout,
            text: "[timed out]".to_string(),
        });
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of display rows across all entries.
    pub fn display_height(&self) -> usize {
        self.lines.iter().map(TranscriptLine::display_rows).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_echo_format() {
        let mut transcript = Transcript::new();
        transcript.push_command("volt 3");
        assert_eq!(transcript.lines()[0].text, "cmd>volt 3");
        assert_eq!(transcript.lines()[0].kind, LineKind::Command);
    }

    #[test]
    fn test_response_strips_trailing_newline() {
        let mut transcript = Transcript::new();
        transcript.push_response("ok\n");
        assert_eq!(transcript.lines()[0].text, "ok");
    }

    #[test]
    fn test_multiline_response_is_one_entry() {
        let mut transcript = Transcript::new();
        transcript.push_response("ch0=1.2\nch1=3.4\n");
        assert_eq!(transcript.lines().len(), 1);
        assert_eq!(transcript.lines()[0].display_rows(), 2);
        assert_eq!(transcript.display_height(), 2);
    }

    #[test]
    fn test_empty_response_still_occupies_a_row() {
        let mut transcript = Transcript::new();
        transcript.push_response("");
        assert_eq!(transcript.display_height(), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut transcript = Transcript::new();
        transcript.push_command("status");
        transcript.push_response("ok");
        transcript.clear();
        assert!(transcript.is_empty());
        transcript.clear();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_failure_and_timeout_are_marked() {
        let mut transcript = Transcript::new();
        transcript.push_failure("connection refused");
        transcript.push_timeout();
        assert_eq!(transcript.lines()[0].kind, LineKind::Failure);
        assert!(transcript.lines()[0].text.starts_with("[failed]"));
        assert_eq!(transcript.lines()[1].kind, LineKind::Timeout);
        assert_eq!(transcript.lines()[1].text, "[timed out]");
    }
}
