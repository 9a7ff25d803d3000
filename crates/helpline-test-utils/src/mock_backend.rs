// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock REST backend for deterministic testing.
//!
//! Each method pops a queued result when one is available and otherwise
//! answers with a canned success. Every call is captured for assertions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use helpline_core::types::{
    ChatReply, ConversationHistory, Feedback, LoginResponse, SessionId, TokenUsage, UserProfile,
};
use helpline_core::{ChatBackend, HelplineError};

/// A call observed by [`MockBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Login {
        username: String,
    },
    Me {
        token: String,
    },
    SendMessage {
        token: Option<String>,
        text: String,
        session_id: Option<SessionId>,
    },
    EndSession {
        token: Option<String>,
        session_id: SessionId,
    },
    Feedback {
        token: Option<String>,
        feedback: Feedback,
    },
    History {
        token: Option<String>,
        session_id: SessionId,
    },
}

type Queue<T> = Mutex<VecDeque<Result<T, HelplineError>>>;

/// A mock backend for testing.
#[derive(Default)]
pub struct MockBackend {
    logins: Queue<LoginResponse>,
    profiles: Queue<UserProfile>,
    replies: Queue<ChatReply>,
    ends: Queue<()>,
    feedback: Queue<()>,
    histories: Queue<ConversationHistory>,
    reply_delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push_login(&self, result: Result<LoginResponse, HelplineError>) {
        self.logins.lock().await.push_back(result);
    }

    pub async fn push_me(&self, result: Result<UserProfile, HelplineError>) {
        self.profiles.lock().await.push_back(result);
    }

    pub async fn push_reply(&self, result: Result<ChatReply, HelplineError>) {
        self.replies.lock().await.push_back(result);
    }

    /// Holds every `send_message` for `delay` before answering.
    pub async fn set_reply_delay(&self, delay: Duration) {
        *self.reply_delay.lock().await = Some(delay);
    }

    pub async fn push_end_session(&self, result: Result<(), HelplineError>) {
        self.ends.lock().await.push_back(result);
    }

    pub async fn push_feedback(&self, result: Result<(), HelplineError>) {
        self.feedback.lock().await.push_back(result);
    }

    pub async fn push_history(&self, result: Result<ConversationHistory, HelplineError>) {
        self.histories.lock().await.push_back(result);
    }

    /// Get all calls made so far, in order.
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().await.clone()
    }

    /// Count calls matching `pred`.
    pub async fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.lock().await.iter().filter(|c| pred(c)).count()
    }

    async fn record(&self, call: BackendCall) {
        self.calls.lock().await.push(call);
    }
}

async fn next_or<T>(queue: &Queue<T>, fallback: impl FnOnce() -> T) -> Result<T, HelplineError> {
    queue.lock().await.pop_front().unwrap_or_else(|| Ok(fallback()))
}

/// Profile returned when no `me` result is queued.
pub fn profile(username: &str) -> UserProfile {
    UserProfile {
        id: format!("user-{username}"),
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        full_name: None,
        role: Some("customer".to_string()),
        created_at: None,
    }
}

/// Login response carrying `token` for `username`.
pub fn login_response(token: &str, username: &str) -> LoginResponse {
    LoginResponse {
        access_token: token.to_string(),
        refresh_token: None,
        token_type: Some("bearer".to_string()),
        expires_in: Some(3600),
        user: profile(username),
    }
}

/// Blocking reply echoing `text` back on `session_id`.
pub fn reply(session_id: &str, text: &str) -> ChatReply {
    ChatReply {
        session_id: SessionId::from(session_id),
        reply: text.to_string(),
        intent: None,
        intent_confidence: None,
        rag_sources: Vec::new(),
        tokens: TokenUsage::default(),
        latency_ms: None,
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn login(&self, username: &str, _password: &str) -> Result<LoginResponse, HelplineError> {
        self.record(BackendCall::Login {
            username: username.to_string(),
        })
        .await;
        next_or(&self.logins, || login_response("mock-token", username)).await
    }

    async fn me(&self, token: &str) -> Result<UserProfile, HelplineError> {
        self.record(BackendCall::Me {
            token: token.to_string(),
        })
        .await;
        next_or(&self.profiles, || profile("mock-user")).await
    }

    async fn send_message(
        &self,
        token: Option<&str>,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, HelplineError> {
        self.record(BackendCall::SendMessage {
            token: token.map(str::to_string),
            text: text.to_string(),
            session_id: session_id.cloned(),
        })
        .await;
        let delay = *self.reply_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let sid = session_id.map_or("mock-session", SessionId::as_str).to_string();
        next_or(&self.replies, || reply(&sid, &format!("echo: {text}"))).await
    }

    async fn end_session(
        &self,
        token: Option<&str>,
        session_id: &SessionId,
    ) -> Result<(), HelplineError> {
        self.record(BackendCall::EndSession {
            token: token.map(str::to_string),
            session_id: session_id.clone(),
        })
        .await;
        next_or(&self.ends, || ()).await
    }

    async fn submit_feedback(
        &self,
        token: Option<&str>,
        feedback: &Feedback,
    ) -> Result<(), HelplineError> {
        self.record(BackendCall::Feedback {
            token: token.map(str::to_string),
            feedback: feedback.clone(),
        })
        .await;
        next_or(&self.feedback, || ()).await
    }

    async fn history(
        &self,
        token: Option<&str>,
        session_id: &SessionId,
    ) -> Result<ConversationHistory, HelplineError> {
        self.record(BackendCall::History {
            token: token.map(str::to_string),
            session_id: session_id.clone(),
        })
        .await;
        next_or(&self.histories, || ConversationHistory {
            session_id: session_id.clone(),
            messages: Vec::new(),
            count: 0,
        })
        .await
    }
}
