//! Wire protocol for the backend event channel.
//!
//! The channel is bidirectional and ordered: the client sends [`Command`]
//! frames, the backend answers with [`TurnEvent`] frames. Both sides use
//! JSON text frames tagged by a `type` field.
//!
//! Per-turn contract: all `thinking`/`stream`/`tool_*` events are delivered
//! in the order the backend produced them, and exactly one terminal event
//! (`stream_end`, `stopped`, or `error`) is delivered last. A terminal event
//! with no preceding content events is legal (empty answer).

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Client -> backend commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Send a new user message, starting a turn.
    SendTurn {
        /// The user's message text.
        text: String,
        /// Session to append the turn to, if one is active.
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
    },
    /// Regenerate the most recent assistant turn without a new user message.
    RegenerateTurn {
        /// Session whose last assistant turn is redone.
        session_id: SessionId,
    },
    /// Ask the backend to stop the in-flight generation.
    ///
    /// This is a request: the turn stays live until a terminal event arrives.
    StopGeneration {},
    /// Switch the active generation model.
    SwitchModel {
        /// Identifier of the model to switch to.
        model_id: String,
    },
}

/// Backend -> client events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Reasoning-trace text.
    ///
    /// With `append: true` the content extends the accumulated trace; with
    /// `append: false` it replaces the trace wholesale.
    Thinking {
        /// Reasoning text fragment (or full content when replacing).
        content: String,
        /// Whether to append to or replace the accumulated trace.
        append: bool,
    },
    /// Answer text fragment to append.
    Stream {
        /// Text fragment.
        content: String,
    },
    /// The backend started executing a tool. Status only; never mutates
    /// turn text.
    ToolCall {
        /// Tool name.
        name: String,
        /// Tool arguments.
        #[serde(default)]
        args: serde_json::Value,
    },
    /// A tool finished executing. Status only.
    ToolResult {
        /// Tool name.
        name: String,
        /// Tool output.
        #[serde(default)]
        result: String,
    },
    /// The turn completed normally.
    StreamEnd {
        /// Generation duration in seconds (backend-authoritative).
        duration: f64,
        /// Whether the turn carried a reasoning trace.
        thinking: bool,
    },
    /// The turn was stopped before completing.
    Stopped {},
    /// Generation failed.
    Error {
        /// Human-readable failure message.
        message: String,
    },
    /// The backend created a session for the first message of a brand-new
    /// conversation. Must update the active session before further commands.
    SessionCreated {
        /// The new session's identifier.
        session_id: SessionId,
    },
}

impl TurnEvent {
    /// Whether this event ends a turn's streaming phase.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::StreamEnd { .. } | Self::Stopped {} | Self::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_turn_serializes_with_tag() {
        let cmd = Command::SendTurn {
            text: "Hello".to_string(),
            session_id: Some(SessionId::new("s-1").unwrap()),
        };

        let json = serde_json::to_string(&cmd).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["type"], "send_turn");
        assert_eq!(parsed["text"], "Hello");
        assert_eq!(parsed["session_id"], "s-1");
    }

    #[test]
    fn send_turn_omits_missing_session() {
        let cmd = Command::SendTurn {
            text: "Hi".to_string(),
            session_id: None,
        };

        let json = serde_json::to_string(&cmd).unwrap();
        assert!(!json.contains("session_id"));
    }

    #[test]
    fn stop_generation_serializes_with_tag() {
        let json = serde_json::to_string(&Command::StopGeneration {}).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "stop_generation");
    }

    #[test]
    fn thinking_event_deserializes() {
        let json = r#"{"type":"thinking","content":"step 1","append":false}"#;
        let event: TurnEvent = serde_json::from_str(json).unwrap();

        match event {
            TurnEvent::Thinking { content, append } => {
                assert_eq!(content, "step 1");
                assert!(!append);
            }
            _ => panic!("Expected Thinking"),
        }
    }

    #[test]
    fn stream_event_deserializes() {
        let json = r#"{"type":"stream","content":"Hello, "}"#;
        let event: TurnEvent = serde_json::from_str(json).unwrap();

        match event {
            TurnEvent::Stream { content } => assert_eq!(content, "Hello, "),
            _ => panic!("Expected Stream"),
        }
    }

    #[test]
    fn tool_call_defaults_args() {
        let json = r#"{"type":"tool_call","name":"save_memory"}"#;
        let event: TurnEvent = serde_json::from_str(json).unwrap();

        match event {
            TurnEvent::ToolCall { name, args } => {
                assert_eq!(name, "save_memory");
                assert!(args.is_null());
            }
            _ => panic!("Expected ToolCall"),
        }
    }

    #[test]
    fn stream_end_deserializes() {
        let json = r#"{"type":"stream_end","duration":1.2,"thinking":true}"#;
        let event: TurnEvent = serde_json::from_str(json).unwrap();

        match event {
            TurnEvent::StreamEnd { duration, thinking } => {
                assert!((duration - 1.2).abs() < f64::EPSILON);
                assert!(thinking);
            }
            _ => panic!("Expected StreamEnd"),
        }
    }

    #[test]
    fn session_created_deserializes() {
        let json = r#"{"type":"session_created","session_id":"20240101_120000"}"#;
        let event: TurnEvent = serde_json::from_str(json).unwrap();

        match event {
            TurnEvent::SessionCreated { session_id } => {
                assert_eq!(session_id.as_str(), "20240101_120000");
            }
            _ => panic!("Expected SessionCreated"),
        }
    }

    #[test]
    fn terminal_classification() {
        assert!(TurnEvent::StreamEnd {
            duration: 0.5,
            thinking: false
        }
        .is_terminal());
        assert!(TurnEvent::Stopped {}.is_terminal());
        assert!(TurnEvent::Error {
            message: "boom".to_string()
        }
        .is_terminal());

        assert!(!TurnEvent::Stream {
            content: "x".to_string()
        }
        .is_terminal());
        assert!(!TurnEvent::Thinking {
            content: "x".to_string(),
            append: true
        }
        .is_terminal());
    }
}
