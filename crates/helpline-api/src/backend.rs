// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ChatBackend`] implementation backed by the REST client.

use async_trait::async_trait;
use helpline_core::types::{
    ChatReply, ConversationHistory, Feedback, LoginResponse, SessionId, UserProfile,
};
use helpline_core::{ChatBackend, HelplineError};

use crate::client::ApiClient;

#[async_trait]
impl ChatBackend for ApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, HelplineError> {
        ApiClient::login(self, username, password).await
    }

    async fn me(&self, token: &str) -> Result<UserProfile, HelplineError> {
        ApiClient::me(self, token).await
    }

    async fn send_message(
        &self,
        token: Option<&str>,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, HelplineError> {
        ApiClient::send_message(self, token, text, session_id).await
    }

    async fn end_session(
        &self,
        token: Option<&str>,
        session_id: &SessionId,
    ) -> Result<(), HelplineError> {
        ApiClient::end_session(self, token, session_id).await
    }

    async fn submit_feedback(
        &self,
        token: Option<&str>,
        feedback: &Feedback,
    ) -> Result<(), HelplineError> {
        ApiClient::submit_feedback(self, token, feedback).await
    }

    async fn history(
        &self,
        token: Option<&str>,
        session_id: &SessionId,
    ) -> Result<ConversationHistory, HelplineError> {
        ApiClient::history(self, token, session_id).await
    }
}
