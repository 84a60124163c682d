//! HTTP client for the backend REST API.
//!
//! This module provides a typed client for the session, memory, model,
//! config, and system-prompt endpoints.

use reqwest::Client;
use serde::Serialize;
use weft_core::SessionId;

use crate::types::{
    AckResponse, ApiErrorResponse, BackendConfig, CreateSessionResponse, MemoriesResponse,
    MemoryCategory, MemoryEntry, MemoryStats, ModelInfo, PromptConfig, SessionDetail,
    SessionSummary,
};

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct RenameRequest<'a> {
    title: &'a str,
}

#[derive(Debug, Serialize)]
struct SaveMemoryRequest<'a> {
    content: &'a str,
    #[serde(rename = "type")]
    category: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchDeleteRequest<'a> {
    ids: &'a [String],
    #[serde(rename = "type")]
    category: &'a str,
}

#[derive(Debug, Serialize)]
struct SavePromptRequest<'a> {
    prompt: &'a str,
}

/// Client for the backend REST API.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the backend (e.g., "http://localhost:5000")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Handle API error responses.
    async fn handle_error(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let message = match response.json::<ApiErrorResponse>().await {
            Ok(err) => err.error,
            Err(_) => "Unknown error".to_string(),
        };
        ClientError::Api { status, message }
    }

    /// Check an acknowledgment body, surfacing its failure reason.
    fn check_ack(ack: AckResponse) -> Result<(), ClientError> {
        if ack.success {
            Ok(())
        } else {
            Err(ClientError::Api {
                status: 200,
                message: ack.error.unwrap_or_else(|| "Unknown error".to_string()),
            })
        }
    }

    // =========================================================================
    // Session Operations
    // =========================================================================

    /// List all sessions, most recent first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ClientError> {
        let url = format!("{}/api/sessions", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Create a new empty session.
    pub async fn create_session(&self) -> Result<CreateSessionResponse, ClientError> {
        let url = format!("{}/api/sessions", self.base_url);

        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Fetch a session's full message history.
    pub async fn get_session(&self, session_id: &SessionId) -> Result<SessionDetail, ClientError> {
        let url = format!("{}/api/sessions/{}", self.base_url, session_id.as_str());

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Rename a session.
    pub async fn rename_session(
        &self,
        session_id: &SessionId,
        title: &str,
    ) -> Result<(), ClientError> {
        let url = format!(
            "{}/api/sessions/{}/rename",
            self.base_url,
            session_id.as_str()
        );

        let response = self
            .client
            .post(&url)
            .json(&RenameRequest { title })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let ack: AckResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Self::check_ack(ack)
    }

    /// Delete a session.
    pub async fn delete_session(&self, session_id: &SessionId) -> Result<(), ClientError> {
        let url = format!("{}/api/sessions/{}", self.base_url, session_id.as_str());

        let response = self.client.delete(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        Ok(())
    }

    /// Delete every session.
    pub async fn clear_sessions(&self) -> Result<(), ClientError> {
        let url = format!("{}/api/sessions/all", self.base_url);

        let response = self.client.delete(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        Ok(())
    }

    // =========================================================================
    // Memory Operations
    // =========================================================================

    /// List memories in one tier.
    pub async fn list_memories(
        &self,
        category: MemoryCategory,
    ) -> Result<Vec<MemoryEntry>, ClientError> {
        let url = format!(
            "{}/api/memory/all?type={}",
            self.base_url,
            category.as_str()
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let body: MemoriesResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        Ok(body.memories)
    }

    /// Fetch aggregate memory counts.
    pub async fn memory_stats(&self) -> Result<MemoryStats, ClientError> {
        let url = format!("{}/api/memory/stats", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Store a memory in one tier.
    pub async fn save_memory(
        &self,
        content: &str,
        category: MemoryCategory,
    ) -> Result<(), ClientError> {
        let url = format!("{}/api/memory/save", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&SaveMemoryRequest {
                content,
                category: category.as_str(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let ack: AckResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Self::check_ack(ack)
    }

    /// Delete a single memory.
    pub async fn delete_memory(
        &self,
        memory_id: &str,
        category: MemoryCategory,
    ) -> Result<(), ClientError> {
        let url = format!(
            "{}/api/memory/{}?type={}",
            self.base_url,
            memory_id,
            category.as_str()
        );

        let response = self.client.delete(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        Ok(())
    }

    /// Delete several memories in one tier.
    pub async fn batch_delete_memories(
        &self,
        ids: &[String],
        category: MemoryCategory,
    ) -> Result<(), ClientError> {
        let url = format!("{}/api/memory/batch-delete", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&BatchDeleteRequest {
                ids,
                category: category.as_str(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let ack: AckResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Self::check_ack(ack)
    }

    /// Clear every memory across all tiers.
    pub async fn clear_memories(&self) -> Result<(), ClientError> {
        let url = format!("{}/api/memory/clear", self.base_url);

        let response = self.client.post(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        Ok(())
    }

    // =========================================================================
    // Model, Config & Prompt Operations
    // =========================================================================

    /// List available models with their capability flags.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let url = format!("{}/api/models", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Fetch the backend configuration.
    pub async fn get_config(&self) -> Result<BackendConfig, ClientError> {
        let url = format!("{}/api/config", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Save the backend configuration.
    pub async fn save_config(&self, config: &BackendConfig) -> Result<(), ClientError> {
        let url = format!("{}/api/config", self.base_url);

        let response = self.client.post(&url).json(config).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let ack: AckResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Self::check_ack(ack)
    }

    /// Fetch the system prompt and its server default.
    pub async fn get_prompt(&self) -> Result<PromptConfig, ClientError> {
        let url = format!("{}/api/prompt", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// Save a new system prompt.
    pub async fn save_prompt(&self, prompt: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/prompt", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&SavePromptRequest { prompt })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let ack: AckResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        Self::check_ack(ack)
    }

    // =========================================================================
    // Utility
    // =========================================================================

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the event channel URL from the REST base URL.
    #[must_use]
    pub fn ws_url(&self) -> String {
        let ws_base = if self.base_url.starts_with("https://") {
            self.base_url.replace("https://", "wss://")
        } else {
            self.base_url.replace("http://", "ws://")
        };
        format!("{ws_base}/ws")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash() {
        let client = BackendClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn ws_url_swaps_scheme() {
        let client = BackendClient::new("http://localhost:5000");
        assert_eq!(client.ws_url(), "ws://localhost:5000/ws");

        let secure = BackendClient::new("https://chat.example.com");
        assert_eq!(secure.ws_url(), "wss://chat.example.com/ws");
    }

    #[test]
    fn check_ack_surfaces_failure_reason() {
        let err = BackendClient::check_ack(AckResponse {
            success: false,
            error: Some("title too long".to_string()),
        })
        .unwrap_err();
        match err {
            ClientError::Api { message, .. } => assert_eq!(message, "title too long"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn check_ack_accepts_success() {
        assert!(BackendClient::check_ack(AckResponse {
            success: true,
            error: None,
        })
        .is_ok());
    }
}
