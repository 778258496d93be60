//! The console component.
//!
//! Owns the transcript, the status line, and the submission bookkeeping.
//! Performs no I/O: `submit` returns a dispatch instruction for the caller
//! to execute, and outcomes are fed back through `apply_outcome`. This keeps
//! the state machine testable without a terminal or a server.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transcript::Transcript;

/// Local command that clears the transcript without a round trip.
pub const CLEAR_COMMAND: &str = "clc";

/// How outcomes of overlapping requests are applied to the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderingPolicy {
    /// Buffer early arrivals and deliver outcomes in submission order.
    #[default]
    Submission,
    /// Append outcomes as their responses arrive.
    Arrival,
}

/// Result of a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The query endpoint answered; the payload goes to the transcript.
    Success(String),
    /// The request failed at the network layer or with an error status.
    NetworkFailure(String),
    /// The request hit the configured timeout.
    TimedOut,
}

/// A dispatched submission: the caller sends `command` to the query endpoint
/// and reports the outcome back under `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub seq: u64,
    pub command: String,
}

/// What a submit turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    /// The transcript was cleared locally; nothing to send.
    ClearedLocal,
    /// Send this to the query endpoint.
    Dispatch(Submission),
}

/// Console state machine: command input on one side, transcript and status
/// line on the other.
pub struct Console {
    transcript: Transcript,
    status: String,
    ordering: OrderingPolicy,
    next_seq: u64,
    /// Dispatched submissions whose outcome has not arrived yet.
    outstanding: BTreeSet<u64>,
    /// Arrived outcomes waiting for an earlier submission to resolve.
    /// Only populated under `OrderingPolicy::Submission`.
    buffered: BTreeMap<u64, RequestOutcome>,
}

impl Console {
    pub fn new(ordering: OrderingPolicy) -> Self {
        Self {
            transcript: Transcript::new(),
            status: String::new(),
            ordering,
            next_seq: 0,
            outstanding: BTreeSet::new(),
            buffered: BTreeMap::new(),
        }
    }

    /// Handle a submitted command string.
    ///
    /// `clc` clears the transcript locally and dispatches nothing. An empty
    /// submission still makes a round trip: a single space is sent instead.
    /// Everything else is echoed as `cmd><value>` and handed back to the
    /// caller for dispatch.
    pub fn submit(&mut self, raw: &str) -> SubmitAction {
        if raw == CLEAR_COMMAND {
            debug!("local clear command");
            self.transcript.clear();
            return SubmitAction::ClearedLocal;
        }

        let command = if raw.is_empty() { " " } else { raw };
        self.transcript.push_command(command);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.outstanding.insert(seq);
        debug!(seq, command, "dispatching");

        SubmitAction::Dispatch(Submission {
            seq,
            command: command.to_string(),
        })
    }

    /// Record the outcome of an outstanding submission.
    ///
    /// Outcomes with an unknown or already-resolved seq are ignored. Under
    /// submission ordering, an outcome is held back until every earlier
    /// submission has resolved.
    pub fn apply_outcome(&mut self, seq: u64, outcome: RequestOutcome) {
        if !self.outstanding.remove(&seq) {
            debug!(seq, "ignoring outcome for unknown or resolved seq");
            return;
        }

        match self.ordering {
            OrderingPolicy::Arrival => self.deliver(outcome),
            OrderingPolicy::Submission => {
                self.buffered.insert(seq, outcome);
                self.drain_in_order();
            }
        }
    }

    /// Deliver every buffered outcome that no outstanding submission
    /// precedes. Buffered and outstanding seqs are disjoint, so the smallest
    /// buffered seq is deliverable exactly when it is below the smallest
    /// outstanding seq.
    fn drain_in_order(&mut self) {
        while let Some(entry) = self.buffered.first_entry() {
            if self.outstanding.first().is_some_and(|&o| o < *entry.key()) {
                break;
            }
            let outcome = entry.remove();
            self.deliver(outcome);
        }
    }

    fn deliver(&mut self, outcome: RequestOutcome) {
        match outcome {
            RequestOutcome::Success(payload) => self.transcript.push_response(&payload),
            RequestOutcome::NetworkFailure(detail) => self.transcript.push_failure(&detail),
            RequestOutcome::TimedOut => self.transcript.push_timeout(),
        }
    }

    /// Unconditional transcript clear (the clear-console control).
    /// Idempotent; outstanding submissions are kept and their outcomes will
    /// still arrive.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Replace the status line. A named action's response lands here, never
    /// in the transcript.
    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Number of dispatched submissions still waiting for an outcome.
    pub fn pending(&self) -> usize {
        self.outstanding.len()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::LineKind;

    fn texts(console: &Console) -> Vec<&str> {
        console
            .transcript()
            .lines()
            .iter()
            .map(|l| l.text.as_str())
            .collect()
    }

    #[test]
    fn test_clc_clears_and_dispatches_nothing() {
        let mut console = Console::new(OrderingPolicy::Submission);
        console.submit("status");
        assert!(!console.transcript().is_empty());

        let action = console.submit("clc");
        assert_eq!(action, SubmitAction::ClearedLocal);
        assert!(console.transcript().is_empty());
        // The earlier submission is still outstanding; clc consumed no seq.
        assert_eq!(console.pending(), 1);
    }

    #[test]
    fn test_empty_submission_sends_single_space() {
        let mut console = Console::new(OrderingPolicy::Submission);
        let action = console.submit("");
        let SubmitAction::Dispatch(submission) = action else {
            panic!("expected dispatch");
        };
        assert_eq!(submission.command, " ");
        assert_eq!(texts(&console), vec!["cmd> "]);
    }

    #[test]
    fn test_submit_echoes_before_any_outcome() {
        let mut console = Console::new(OrderingPolicy::Submission);
        let action = console.submit("volt 3");
        let SubmitAction::Dispatch(submission) = action else {
            panic!("expected dispatch");
        };
        assert_eq!(submission.seq, 0);
        assert_eq!(submission.command, "volt 3");
        assert_eq!(texts(&console), vec!["cmd>volt 3"]);
        assert_eq!(console.pending(), 1);
    }

    #[test]
    fn test_outcome_lands_after_echo() {
        let mut console = Console::new(OrderingPolicy::Submission);
        console.submit("status");
        console.apply_outcome(0, RequestOutcome::Success("ok".to_string()));
        assert_eq!(texts(&console), vec!["cmd>status", "ok"]);
        assert_eq!(console.pending(), 0);
    }

    #[test]
    fn test_seq_numbers_are_monotonic() {
        let mut console = Console::new(OrderingPolicy::Arrival);
        for expected in 0..3 {
            let SubmitAction::Dispatch(submission) = console.submit("x") else {
                panic!("expected dispatch");
            };
            assert_eq!(submission.seq, expected);
        }
    }

    #[test]
    fn test_submission_ordering_buffers_early_arrivals() {
        let mut console = Console::new(OrderingPolicy::Submission);
        console.submit("first");
        console.submit("second");

        // Second answers before first; it must wait.
        console.apply_outcome(1, RequestOutcome::Success("two".to_string()));
        assert_eq!(texts(&console), vec!["cmd>first", "cmd>second"]);

        console.apply_outcome(0, RequestOutcome::Success("one".to_string()));
        assert_eq!(
            texts(&console),
            vec!["cmd>first", "cmd>second", "one", "two"]
        );
    }

    #[test]
    fn test_arrival_ordering_appends_as_responses_land() {
        let mut console = Console::new(OrderingPolicy::Arrival);
        console.submit("first");
        console.submit("second");

        console.apply_outcome(1, RequestOutcome::Success("two".to_string()));
        console.apply_outcome(0, RequestOutcome::Success("one".to_string()));
        assert_eq!(
            texts(&console),
            vec!["cmd>first", "cmd>second", "two", "one"]
        );
    }

    #[test]
    fn test_duplicate_and_unknown_outcomes_are_ignored() {
        let mut console = Console::new(OrderingPolicy::Submission);
        console.submit("status");
        console.apply_outcome(0, RequestOutcome::Success("ok".to_string()));
        console.apply_outcome(0, RequestOutcome::Success("again".to_string()));
        console.apply_outcome(99, RequestOutcome::Success("ghost".to_string()));
        assert_eq!(texts(&console), vec!["cmd>status", "ok"]);
    }

    #[test]
    fn test_clear_keeps_outstanding_submissions() {
        let mut console = Console::new(OrderingPolicy::Submission);
        console.submit("slow");
        console.clear();
        assert!(console.transcript().is_empty());
        assert_eq!(console.pending(), 1);

        // The late outcome still arrives into the now-empty transcript.
        console.apply_outcome(0, RequestOutcome::Success("late".to_string()));
        assert_eq!(texts(&console), vec!["late"]);
    }

    #[test]
    fn test_clear_is_idempotent_on_empty_transcript() {
        let mut console = Console::new(OrderingPolicy::Submission);
        console.clear();
        console.clear();
        assert!(console.transcript().is_empty());
    }

    #[test]
    fn test_failure_and_timeout_render_distinctly() {
        let mut console = Console::new(OrderingPolicy::Arrival);
        console.submit("a");
        console.submit("b");
        console.apply_outcome(0, RequestOutcome::NetworkFailure("connection refused".into()));
        console.apply_outcome(1, RequestOutcome::TimedOut);

        let kinds: Vec<LineKind> = console
            .transcript()
            .lines()
            .iter()
            .map(|l| l.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Command,
                LineKind::Command,
                LineKind::Failure,
                LineKind::Timeout
            ]
        );
    }

    #[test]
    fn test_status_line_is_replaced_not_appended() {
        let mut console = Console::new(OrderingPolicy::Submission);
        console.set_status("pong 1");
        console.set_status("pong 2");
        assert_eq!(console.status(), "pong 2");
        assert!(console.transcript().is_empty());
    }
}
