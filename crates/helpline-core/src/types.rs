// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the transport, the REST client, and the conversation store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// The backend sends `null` rather than omitting empty lists.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Opaque identifier of a conversation, either client-minted or server-confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Mints a fresh, process-unique session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Locally unique identifier of a message in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author of a message. Fixed at creation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the ordered conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    /// Grows under streaming for assistant placeholders, fixed afterwards.
    pub content: String,
    /// True from placeholder creation until a terminal event. Never true for user entries.
    pub streaming: bool,
    pub intent: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    pub latency_ms: Option<u64>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A completed user entry.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::User,
            content: content.into(),
            streaming: false,
            intent: None,
            sources: Vec::new(),
            latency_ms: None,
            created_at: Utc::now(),
        }
    }

    /// An empty assistant entry awaiting streamed tokens.
    pub fn placeholder() -> Self {
        Self {
            id: MessageId::generate(),
            role: Role::Assistant,
            content: String::new(),
            streaming: true,
            intent: None,
            sources: Vec::new(),
            latency_ms: None,
            created_at: Utc::now(),
        }
    }

    /// A completed assistant entry, as returned by a blocking call or history load.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            streaming: false,
            content: content.into(),
            ..Self::placeholder()
        }
    }
}

/// Completion metadata carried by a `done` frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnMetadata {
    /// Server-confirmed session id; may differ from the one used to connect.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub intent_confidence: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<String>,
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

/// Everything a transport needs to carry one turn.
#[derive(Clone, PartialEq)]
pub struct TurnRequest {
    pub session_id: SessionId,
    pub text: String,
    pub token: Option<String>,
}

impl fmt::Debug for TurnRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnRequest")
            .field("session_id", &self.session_id)
            .field("text", &self.text)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Event relayed by a transport for the turn it carries.
///
/// `Done` and `Error` are terminal: a transport yields at most one of them
/// and nothing after it.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Incremental text fragment, in arrival order.
    Token(String),
    /// Turn completed successfully.
    Done(TurnMetadata),
    /// Turn failed; carries a human-readable, non-empty diagnostic.
    Error(String),
}

impl TransportEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransportEvent::Token(_))
    }
}

// --- REST shapes ---

/// Token accounting attached to a blocking reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

/// Response of `POST /chat/message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub session_id: SessionId,
    pub reply: String,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub intent_confidence: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rag_sources: Vec<String>,
    #[serde(default)]
    pub tokens: TokenUsage,
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

/// Identity of the signed-in user, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of `POST /auth/login`.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: UserProfile,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

/// One entry of a server-side conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

/// Response of `GET /chat/history/{session_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub session_id: SessionId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<HistoryEntry>,
    #[serde(default)]
    pub count: usize,
}

/// Body of `POST /chat/feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub conversation_id: String,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_helpful: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Feedback {
    /// Thumbs up / thumbs down annotation without rating or comment.
    pub fn helpful(conversation_id: &str, message_id: &str, is_helpful: bool) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
            rating: None,
            is_helpful: Some(is_helpful),
            comment: None,
        }
    }
}
