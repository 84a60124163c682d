//! Streaming chat front-end: turn state machine and conversation view.
//!
//! The binary in `main.rs` wires these to the backend clients; the library
//! split exists so the turn-flow scenarios can be driven from integration
//! tests.

pub mod controller;
pub mod view;

pub use controller::TurnController;
pub use view::{ConversationView, RenderedTurn, TurnOutcome};
