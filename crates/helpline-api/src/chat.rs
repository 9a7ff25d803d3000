// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/chat/*` routes.

use helpline_core::types::{ChatReply, ConversationHistory, Feedback, SessionId};
use helpline_core::HelplineError;
use tracing::debug;

use crate::client::ApiClient;
use crate::types::ChatRequest;

impl ApiClient {
    /// `POST /chat/message`: sends one message and waits for the full reply.
    ///
    /// Without a session id the backend creates one and returns it.
    pub async fn send_message(
        &self,
        token: Option<&str>,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, HelplineError> {
        let request = self
            .post(self.route(&["chat", "message"]), token)
            .json(&ChatRequest {
                message: text,
                session_id: session_id.map(SessionId::as_str),
            });
        let reply: ChatReply = self.call(request).await?;
        debug!(
            session_id = reply.session_id.as_str(),
            intent = reply.intent.as_deref().unwrap_or("unknown"),
            latency_ms = reply.latency_ms,
            "blocking reply received"
        );
        Ok(reply)
    }

    /// `GET /chat/history/{session_id}`.
    pub async fn history(
        &self,
        token: Option<&str>,
        session_id: &SessionId,
    ) -> Result<ConversationHistory, HelplineError> {
        let url = self.route(&["chat", "history", session_id.as_str()]);
        self.call(self.get(url, token)).await
    }

    /// `POST /chat/end/{session_id}`: closes the session on the backend.
    pub async fn end_session(
        &self,
        token: Option<&str>,
        session_id: &SessionId,
    ) -> Result<(), HelplineError> {
        let url = self.route(&["chat", "end", session_id.as_str()]);
        self.call_unit(self.post(url, token)).await
    }

    /// `POST /chat/feedback`.
    pub async fn submit_feedback(
        &self,
        token: Option<&str>,
        feedback: &Feedback,
    ) -> Result<(), HelplineError> {
        let request = self
            .post(self.route(&["chat", "feedback"]), token)
            .json(feedback);
        self.call_unit(request).await
    }
}
