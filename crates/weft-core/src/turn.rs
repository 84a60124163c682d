//! The single in-flight turn and its phase machine.
//!
//! A [`TurnBuffer`] accumulates one assistant turn's reasoning trace and
//! answer text while events stream in. The buffer is exclusively owned by
//! the controller that created it; at most one buffer is live at a time.
//!
//! Phases move `Streaming -> Finalizing -> {Done, Stopped, Errored}`.
//! Terminal phases are sticky: once frozen, every mutation is rejected.

use chrono::{DateTime, Utc};

use crate::ids::TurnId;

/// Lifecycle phase of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    /// No turn is in flight.
    #[default]
    Idle,
    /// Content events are being applied.
    Streaming,
    /// A terminal event arrived; the final render is running.
    Finalizing,
    /// The turn completed normally.
    Done,
    /// The turn was stopped before completing.
    Stopped,
    /// Generation failed.
    Errored,
}

impl TurnPhase {
    /// Whether the phase is one of the three terminal outcomes.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Stopped | Self::Errored)
    }

    /// Whether a buffer in this phase still accepts content events.
    #[must_use]
    pub const fn accepts_content(self) -> bool {
        matches!(self, Self::Streaming)
    }
}

/// Mutable state of the one in-flight assistant turn.
#[derive(Debug, Clone)]
pub struct TurnBuffer {
    id: TurnId,
    reasoning_text: String,
    answer_text: String,
    phase: TurnPhase,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    duration_seconds: Option<f64>,
}

impl TurnBuffer {
    /// Allocate a fresh buffer for a turn that is starting now.
    #[must_use]
    pub fn start() -> Self {
        Self {
            id: TurnId::generate(),
            reasoning_text: String::new(),
            answer_text: String::new(),
            phase: TurnPhase::Streaming,
            started_at: Utc::now(),
            ended_at: None,
            duration_seconds: None,
        }
    }

    /// The turn's local identifier.
    #[must_use]
    pub const fn id(&self) -> TurnId {
        self.id
    }

    /// Accumulated reasoning trace.
    #[must_use]
    pub fn reasoning_text(&self) -> &str {
        &self.reasoning_text
    }

    /// Accumulated answer text.
    #[must_use]
    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// When the turn started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the turn reached a terminal phase, if it has.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Backend-reported generation duration, set by `stream_end`.
    #[must_use]
    pub const fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }

    /// Append an answer fragment.
    ///
    /// Returns `false` (ignoring the fragment) if the buffer no longer
    /// accepts content.
    pub fn append_answer(&mut self, content: &str) -> bool {
        if !self.phase.accepts_content() {
            return false;
        }
        self.answer_text.push_str(content);
        true
    }

    /// Apply a reasoning-trace event: append, or replace wholesale.
    ///
    /// Returns `false` (ignoring the event) if the buffer no longer accepts
    /// content.
    pub fn apply_thinking(&mut self, content: &str, append: bool) -> bool {
        if !self.phase.accepts_content() {
            return false;
        }
        if append {
            self.reasoning_text.push_str(content);
        } else {
            self.reasoning_text.clear();
            self.reasoning_text.push_str(content);
        }
        true
    }

    /// Enter the transient finalizing phase. No-op unless streaming.
    pub fn begin_finalizing(&mut self) {
        if self.phase == TurnPhase::Streaming {
            self.phase = TurnPhase::Finalizing;
        }
    }

    /// Freeze as completed with the backend-reported duration.
    ///
    /// Returns `false` if the buffer was already terminal.
    pub fn complete(&mut self, duration_seconds: f64) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.duration_seconds = Some(duration_seconds);
        self.seal(TurnPhase::Done)
    }

    /// Freeze as stopped.
    ///
    /// Returns `false` if the buffer was already terminal.
    pub fn stop(&mut self) -> bool {
        self.seal(TurnPhase::Stopped)
    }

    /// Freeze as failed.
    ///
    /// Returns `false` if the buffer was already terminal.
    pub fn fail(&mut self) -> bool {
        self.seal(TurnPhase::Errored)
    }

    fn seal(&mut self, terminal: TurnPhase) -> bool {
        debug_assert!(terminal.is_terminal());
        if self.phase.is_terminal() {
            return false;
        }
        self.phase = terminal;
        self.ended_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_buffer_is_streaming_and_empty() {
        let turn = TurnBuffer::start();
        assert_eq!(turn.phase(), TurnPhase::Streaming);
        assert!(turn.answer_text().is_empty());
        assert!(turn.reasoning_text().is_empty());
        assert!(turn.ended_at().is_none());
        assert!(turn.duration_seconds().is_none());
    }

    #[test]
    fn answer_grows_monotonically() {
        let mut turn = TurnBuffer::start();
        assert!(turn.append_answer("Hello"));
        assert!(turn.append_answer(" there"));
        assert_eq!(turn.answer_text(), "Hello there");
    }

    #[test]
    fn thinking_append_concatenates() {
        let mut turn = TurnBuffer::start();
        assert!(turn.apply_thinking("step 1", false));
        assert!(turn.apply_thinking(" step 2", true));
        assert_eq!(turn.reasoning_text(), "step 1 step 2");
    }

    #[test]
    fn thinking_replace_discards_prior_text() {
        let mut turn = TurnBuffer::start();
        turn.apply_thinking("a very long first draft", true);
        turn.apply_thinking("final", false);
        assert_eq!(turn.reasoning_text(), "final");
    }

    #[test]
    fn complete_records_duration_and_seals() {
        let mut turn = TurnBuffer::start();
        turn.append_answer("done");
        assert!(turn.complete(1.2));
        assert_eq!(turn.phase(), TurnPhase::Done);
        assert_eq!(turn.duration_seconds(), Some(1.2));
        assert!(turn.ended_at().is_some());
    }

    #[test]
    fn terminal_phases_are_sticky() {
        let mut turn = TurnBuffer::start();
        assert!(turn.stop());
        // Second terminal transition is rejected.
        assert!(!turn.complete(2.0));
        assert!(!turn.fail());
        assert_eq!(turn.phase(), TurnPhase::Stopped);
        assert!(turn.duration_seconds().is_none());
    }

    #[test]
    fn frozen_buffer_ignores_content() {
        let mut turn = TurnBuffer::start();
        turn.append_answer("partial");
        turn.fail();
        assert!(!turn.append_answer(" more"));
        assert!(!turn.apply_thinking("late", true));
        assert_eq!(turn.answer_text(), "partial");
    }

    #[test]
    fn finalizing_accepts_no_content_but_can_seal() {
        let mut turn = TurnBuffer::start();
        turn.begin_finalizing();
        assert_eq!(turn.phase(), TurnPhase::Finalizing);
        assert!(!turn.append_answer("late"));
        assert!(turn.complete(0.3));
        assert_eq!(turn.phase(), TurnPhase::Done);
    }
}
