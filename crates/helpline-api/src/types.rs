// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response shapes of the REST routes that only this client uses.
//!
//! Shapes shared with the conversation store live in `helpline_core::types`.

use serde::{Deserialize, Serialize};

/// Error body returned by the backend on non-success responses.
///
/// `detail` is usually a string but validation failures carry a list, so it
/// is kept as raw JSON and flattened by [`ErrorEnvelope::message`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ErrorEnvelope {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Generic `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    pub user: RegisteredUser,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ChangePasswordRequest<'a> {
    pub old_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Filters for `GET /knowledge/list`.
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub page: u32,
    pub page_size: u32,
    pub category: Option<String>,
    pub status: Option<String>,
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            category: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub chunk_count: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPage {
    pub items: Vec<DocumentSummary>,
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

/// A document to upload into the knowledge base.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub title: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadAccepted {
    #[serde(default)]
    pub message: String,
    pub doc_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub source: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    pub query: String,
    #[serde(default)]
    pub results: Vec<SearchHit>,
    #[serde(default)]
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminStats {
    pub users: u64,
    pub conversations: u64,
    pub messages: u64,
    pub knowledge_documents: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub session_id: String,
    pub status: String,
    pub intent: String,
    pub turn_count: u32,
    pub started_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
}

/// One page of an admin listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub llm_provider: Option<String>,
    #[serde(default)]
    pub redis: Option<String>,
}
