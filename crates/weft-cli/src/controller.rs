//! The streaming-turn state machine.
//!
//! One controller drives the single in-flight turn: it guards command
//! submission against the current phase, applies incoming events to the
//! [`TurnBuffer`], and pushes renders into the [`ConversationView`].
//!
//! Controller methods are synchronous and run to completion on the event
//! loop, so the phase guard needs no locking. Methods that start or stop a
//! turn return the [`Command`] to dispatch; sending it is the caller's job.

use std::time::{Duration, Instant};

use weft_client::Role;
use weft_core::{embed_reasoning, Command, SessionId, TurnBuffer, TurnEvent};
use weft_render::{render_answer, render_reasoning};

use crate::view::{escape, ConversationView, RenderedTurn, TurnOutcome, STOPPED_PLACEHOLDER};

/// Drives the in-flight turn and the conversation view.
#[derive(Debug)]
pub struct TurnController {
    turn: Option<TurnBuffer>,
    stop_requested: bool,
    active_session: Option<SessionId>,
    view: ConversationView,
    stall_timeout: Option<Duration>,
    last_activity: Option<Instant>,
}

impl TurnController {
    /// New controller with no session and no turn in flight.
    ///
    /// `stall_timeout` enables the watchdog: when set, a streaming turn
    /// that sees no event for that long is failed locally.
    #[must_use]
    pub fn new(stall_timeout: Option<Duration>) -> Self {
        Self {
            turn: None,
            stop_requested: false,
            active_session: None,
            view: ConversationView::new(),
            stall_timeout,
            last_activity: None,
        }
    }

    /// The conversation view.
    #[must_use]
    pub const fn view(&self) -> &ConversationView {
        &self.view
    }

    /// The active session, if one is selected.
    #[must_use]
    pub const fn active_session(&self) -> Option<&SessionId> {
        self.active_session.as_ref()
    }

    /// Whether a turn is currently in flight.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        self.turn.is_some()
    }

    /// Switch to a session, replacing the view's history.
    ///
    /// Rejected while a turn is in flight.
    pub fn switch_session(
        &mut self,
        session_id: SessionId,
        messages: &[weft_client::StoredMessage],
    ) -> bool {
        if self.is_streaming() {
            return false;
        }
        self.view.hydrate(messages);
        self.active_session = Some(session_id);
        true
    }

    /// Forget the active session and clear the view.
    pub fn reset_session(&mut self) {
        if !self.is_streaming() {
            self.active_session = None;
            self.view = ConversationView::new();
        }
    }

    /// Submit a user turn.
    ///
    /// Returns the command to dispatch, or `None` (and no state change)
    /// while a turn is already in flight.
    pub fn send(&mut self, text: &str) -> Option<Command> {
        if self.is_streaming() {
            tracing::debug!("send rejected: turn in flight");
            return None;
        }
        self.view.push_user(text);
        self.begin_turn();
        Some(Command::SendTurn {
            text: text.to_string(),
            session_id: self.active_session.clone(),
        })
    }

    /// Regenerate the most recent assistant turn.
    ///
    /// Returns `None` while a turn is in flight, when no session is active,
    /// or when the history does not end with an assistant turn.
    pub fn regenerate(&mut self) -> Option<Command> {
        if self.is_streaming() {
            tracing::debug!("regenerate rejected: turn in flight");
            return None;
        }
        let session_id = self.active_session.clone()?;
        if !self.view.drop_last_assistant() {
            return None;
        }
        self.begin_turn();
        Some(Command::RegenerateTurn { session_id })
    }

    /// Request a stop of the in-flight turn.
    ///
    /// The turn stays live until the backend's terminal event arrives;
    /// repeated requests are not re-sent.
    pub fn cancel(&mut self) -> Option<Command> {
        if !self.is_streaming() || self.stop_requested {
            return None;
        }
        self.stop_requested = true;
        self.view.set_live_status("Stopping…");
        Some(Command::StopGeneration {})
    }

    /// Apply one incoming event.
    ///
    /// Returns whether the view changed. Content events arriving while no
    /// turn is in flight are dropped (stale-turn and post-cancel races).
    pub fn handle_event(&mut self, event: TurnEvent) -> bool {
        match event {
            TurnEvent::Thinking { content, append } => {
                let Some(turn) = &mut self.turn else {
                    return false;
                };
                if !turn.apply_thinking(&content, append) {
                    return false;
                }
                let rendered = render_reasoning(turn.reasoning_text());
                self.touch();
                self.view.update_live_reasoning(rendered);
                true
            }
            TurnEvent::Stream { content } => {
                let Some(turn) = &mut self.turn else {
                    return false;
                };
                if !turn.append_answer(&content) {
                    return false;
                }
                // Full re-render of the accumulated text on every fragment;
                // partial markdown self-corrects as more text arrives.
                let rendered = render_answer(turn.answer_text());
                self.touch();
                self.view.update_live_answer(rendered.html);
                true
            }
            TurnEvent::ToolCall { name, .. } => {
                if self.turn.is_none() {
                    return false;
                }
                self.touch();
                self.view.set_live_status(format!("Running tool: {name}"));
                true
            }
            TurnEvent::ToolResult { name, .. } => {
                if self.turn.is_none() {
                    return false;
                }
                self.touch();
                self.view.set_live_status(format!("Tool finished: {name}"));
                true
            }
            TurnEvent::StreamEnd { duration, thinking } => {
                let Some(mut turn) = self.turn.take() else {
                    return false;
                };
                turn.begin_finalizing();
                turn.complete(duration);
                self.finish_turn(&turn, thinking, TurnOutcome::Completed, None);
                true
            }
            TurnEvent::Stopped {} => {
                let Some(mut turn) = self.turn.take() else {
                    return false;
                };
                turn.stop();
                self.finish_turn(&turn, true, TurnOutcome::Stopped, None);
                true
            }
            TurnEvent::Error { message } => {
                let Some(mut turn) = self.turn.take() else {
                    return false;
                };
                turn.fail();
                self.finish_turn(&turn, true, TurnOutcome::Failed, Some(&message));
                true
            }
            TurnEvent::SessionCreated { session_id } => {
                tracing::debug!(session_id = %session_id, "session created");
                self.active_session = Some(session_id);
                false
            }
        }
    }

    /// Fail the in-flight turn locally if the stream has gone silent.
    ///
    /// Returns whether a synthetic terminal event was applied.
    pub fn poll_stall(&mut self) -> bool {
        let Some(timeout) = self.stall_timeout else {
            return false;
        };
        if self.turn.is_none() {
            return false;
        }
        let stalled = self
            .last_activity
            .is_some_and(|last| last.elapsed() >= timeout);
        if !stalled {
            return false;
        }
        tracing::warn!(timeout_secs = timeout.as_secs(), "stream stalled");
        self.handle_event(TurnEvent::Error {
            message: format!("No response from backend for {}s", timeout.as_secs()),
        })
    }

    fn begin_turn(&mut self) {
        self.turn = Some(TurnBuffer::start());
        self.stop_requested = false;
        self.last_activity = Some(Instant::now());
        self.view.begin_live();
    }

    fn touch(&mut self) {
        self.last_activity = Some(Instant::now());
    }

    /// Freeze a terminated turn into the view.
    fn finish_turn(
        &mut self,
        turn: &TurnBuffer,
        keep_reasoning: bool,
        outcome: TurnOutcome,
        error_message: Option<&str>,
    ) {
        // The persisted raw text and the rendered panel must agree: a trace
        // the backend disowned (stream_end with thinking: false) is neither
        // shown nor embedded.
        let reasoning_text = if keep_reasoning {
            turn.reasoning_text()
        } else {
            ""
        };
        let reasoning = if reasoning_text.is_empty() {
            None
        } else {
            Some(render_reasoning(reasoning_text))
        };

        let answer_text = turn.answer_text();
        let (answer_html, code_blocks) = match outcome {
            TurnOutcome::Completed => {
                let rendered = render_answer(answer_text);
                (rendered.html, rendered.code_blocks)
            }
            TurnOutcome::Stopped => {
                if answer_text.is_empty() {
                    (
                        format!("<p class=\"turn-stopped\">{STOPPED_PLACEHOLDER}</p>"),
                        Vec::new(),
                    )
                } else {
                    let rendered = render_answer(answer_text);
                    (rendered.html, rendered.code_blocks)
                }
            }
            TurnOutcome::Failed => {
                let message = error_message.unwrap_or("Generation failed");
                (
                    format!("<p class=\"turn-error\">{}</p>", escape(message)),
                    Vec::new(),
                )
            }
        };

        self.view.freeze(RenderedTurn {
            role: Role::Assistant,
            raw_text: embed_reasoning(reasoning_text, answer_text),
            answer_html,
            code_blocks,
            reasoning,
            duration: turn.duration_seconds(),
            outcome,
        });
        self.stop_requested = false;
        self.last_activity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming_controller() -> TurnController {
        let mut controller = TurnController::new(None);
        assert!(controller.send("hello").is_some());
        controller
    }

    #[test]
    fn send_while_streaming_is_rejected() {
        let mut controller = streaming_controller();
        assert!(controller.send("again").is_none());
        // The rejected send left no trace: still one user turn, one live cell.
        assert_eq!(controller.view().turns().len(), 1);
    }

    #[test]
    fn cancel_is_sent_once() {
        let mut controller = streaming_controller();
        assert!(matches!(
            controller.cancel(),
            Some(Command::StopGeneration {})
        ));
        assert!(controller.cancel().is_none());
        // Still streaming until the terminal event arrives.
        assert!(controller.is_streaming());
    }

    #[test]
    fn content_without_live_turn_is_dropped() {
        let mut controller = TurnController::new(None);
        assert!(!controller.handle_event(TurnEvent::Stream {
            content: "stale".to_string()
        }));
        assert!(controller.view().turns().is_empty());
    }

    #[test]
    fn second_terminal_event_is_a_no_op() {
        let mut controller = streaming_controller();
        assert!(controller.handle_event(TurnEvent::StreamEnd {
            duration: 1.0,
            thinking: false
        }));
        assert!(!controller.handle_event(TurnEvent::Stopped {}));
        assert_eq!(controller.view().turns().len(), 2);
        assert_eq!(controller.view().turns()[1].outcome, TurnOutcome::Completed);
    }

    #[test]
    fn disowned_trace_is_neither_shown_nor_persisted() {
        let mut controller = streaming_controller();
        controller.handle_event(TurnEvent::Thinking {
            content: "scratch work".to_string(),
            append: true,
        });
        controller.handle_event(TurnEvent::Stream {
            content: "answer".to_string(),
        });
        controller.handle_event(TurnEvent::StreamEnd {
            duration: 1.0,
            thinking: false,
        });

        let assistant = controller.view().turns().last().unwrap();
        assert!(assistant.reasoning.is_none());
        // The persisted form carries no sentinel pair, so hydration cannot
        // resurrect a trace the live view never showed.
        assert_eq!(assistant.raw_text, "answer");
    }

    #[test]
    fn session_created_adopts_the_id() {
        let mut controller = streaming_controller();
        controller.handle_event(TurnEvent::SessionCreated {
            session_id: SessionId::new("s-9").unwrap(),
        });
        assert_eq!(controller.active_session().unwrap().as_str(), "s-9");
    }

    #[test]
    fn regenerate_requires_trailing_assistant_turn() {
        let mut controller = TurnController::new(None);
        assert!(controller.switch_session(SessionId::new("s-1").unwrap(), &[]));
        // History is empty: nothing to regenerate.
        assert!(controller.regenerate().is_none());
    }
}
