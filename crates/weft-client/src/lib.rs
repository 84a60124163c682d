//! Backend access for weft.
//!
//! Two surfaces:
//!
//! - [`rest`]: typed request/response client for the session, memory,
//!   model, config, and system-prompt endpoints. These collaborators are
//!   assumed reliable; no retry logic lives here.
//! - [`channel`]: the long-lived, ordered, bidirectional event channel that
//!   carries turn events in and commands out.

pub mod channel;
pub mod rest;
pub mod types;

pub use channel::{connect, ChannelError, ChannelEvent, CommandSender};
pub use rest::{BackendClient, ClientError};
pub use types::{
    BackendConfig, MemoryCategory, MemoryEntry, MemoryStats, ModelCapabilities, ModelInfo,
    PromptConfig, Role, SessionDetail, SessionSummary, StoredMessage,
};
