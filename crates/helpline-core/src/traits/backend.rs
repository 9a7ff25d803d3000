// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response backend trait used by the conversation store.

use async_trait::async_trait;

use crate::error::HelplineError;
use crate::types::{ChatReply, ConversationHistory, Feedback, LoginResponse, SessionId, UserProfile};

/// The subset of the backend REST API the conversation store depends on.
///
/// Every authenticated call takes the bearer token explicitly; the store
/// owns the credential and decides when to replay it.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Exchanges credentials for an access token and profile.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, HelplineError>;

    /// Fetches the profile bound to `token`.
    async fn me(&self, token: &str) -> Result<UserProfile, HelplineError>;

    /// Sends one message and waits for the complete reply.
    async fn send_message(
        &self,
        token: Option<&str>,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, HelplineError>;

    /// Tells the backend the session is over.
    async fn end_session(&self, token: Option<&str>, session_id: &SessionId)
    -> Result<(), HelplineError>;

    /// Records a helpfulness annotation on a message.
    async fn submit_feedback(
        &self,
        token: Option<&str>,
        feedback: &Feedback,
    ) -> Result<(), HelplineError>;

    /// Fetches the server-side history of a session.
    async fn history(
        &self,
        token: Option<&str>,
        session_id: &SessionId,
    ) -> Result<ConversationHistory, HelplineError>;
}
