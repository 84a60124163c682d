//! API types for the backend REST surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weft_core::SessionId;

// =============================================================================
// Session Types
// =============================================================================

/// Message role in a stored conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A user message.
    User,
    /// An assistant message.
    Assistant,
}

/// One entry in the session list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID.
    pub id: SessionId,
    /// Display title (derived from the first user message by the backend).
    pub title: String,
}

/// One persisted message inside a session.
///
/// An assistant message's `content` may embed a reasoning trace using the
/// sentinel convention in `weft_core::transcript`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Message role.
    pub role: Role,
    /// Raw message text.
    pub content: String,
    /// When the message was stored.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Generation duration in seconds (assistant messages only).
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Full session content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    /// Display title.
    pub title: String,
    /// Messages in backend order.
    pub messages: Vec<StoredMessage>,
}

/// Response for creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// The new session's ID.
    pub session_id: SessionId,
}

// =============================================================================
// Memory Types
// =============================================================================

/// Memory tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    /// Durable facts, searched by similarity.
    Long,
    /// Key/value working set with priorities.
    Working,
    /// Recent conversation turns.
    Short,
}

impl MemoryCategory {
    /// Wire value used in query strings and request bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Working => "working",
            Self::Short => "short",
        }
    }
}

/// One stored memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Memory ID (opaque; tier-specific format).
    pub id: String,
    /// Memory content.
    pub content: String,
    /// When the memory was stored.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Relevance score (long-term memories only).
    #[serde(default)]
    pub score: Option<f64>,
}

/// Response wrapper for memory listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoriesResponse {
    /// Memories in the requested tier.
    pub memories: Vec<MemoryEntry>,
}

/// Aggregate memory counts per tier.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Long-term memory count.
    pub long_term: u64,
    /// Working memory count.
    pub working: u64,
    /// Short-term memory count.
    pub short_term: u64,
    /// Total across tiers.
    pub total: u64,
}

// =============================================================================
// Model Types
// =============================================================================

/// Capability flags for an available model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Accepts image input.
    #[serde(default)]
    pub vision: bool,
    /// Supports tool calling.
    #[serde(default)]
    pub tools: bool,
    /// Emits a reasoning trace.
    #[serde(default)]
    pub reasoning: bool,
    /// Optimized for latency.
    #[serde(default)]
    pub fast: bool,
}

/// One model in the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Capability flags.
    #[serde(default)]
    pub features: ModelCapabilities,
}

// =============================================================================
// Config & Prompt Types
// =============================================================================

/// API credentials and generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// API key for the upstream provider.
    pub api_key: String,
    /// Base URL for the upstream provider.
    pub base_url: String,
    /// Currently selected model.
    pub current_model: String,
    /// Whether the memory system is enabled.
    #[serde(default)]
    pub memory_enabled: bool,
    /// Model used for memory processing.
    #[serde(default)]
    pub memory_model: Option<String>,
    /// Working-memory capacity.
    #[serde(default)]
    pub working_memory_capacity: Option<u32>,
}

/// System prompt with the server-provided default for reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// The active system prompt.
    pub prompt: String,
    /// The server default, used when the user resets.
    pub default_prompt: String,
}

// =============================================================================
// Generic Responses
// =============================================================================

/// Success/failure acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure reason when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error message.
    pub error: String,
}
