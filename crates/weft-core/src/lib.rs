//! Core types for weft.
//!
//! This crate provides the foundational types shared by the weft client:
//!
//! - **Identifiers**: strongly-typed turn and session IDs
//! - **Protocol**: the tagged event/command types carried by the backend
//!   event channel
//! - **Turn state**: the single in-flight turn buffer and its phase machine
//! - **Transcript**: the sentinel convention for persisting a reasoning
//!   trace inside an assistant turn's raw text
//!
//! # Example
//!
//! ```
//! use weft_core::{TurnBuffer, TurnPhase};
//!
//! let mut turn = TurnBuffer::start();
//! turn.append_answer("Hello");
//! turn.append_answer(" there");
//! assert_eq!(turn.answer_text(), "Hello there");
//! assert_eq!(turn.phase(), TurnPhase::Streaming);
//! ```

pub mod ids;
pub mod protocol;
pub mod transcript;
pub mod turn;

pub use ids::{IdError, SessionId, TurnId};
pub use protocol::{Command, TurnEvent};
pub use transcript::{embed_reasoning, split_reasoning};
pub use turn::{TurnBuffer, TurnPhase};
