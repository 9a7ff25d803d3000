// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation log, active session id, and progress flags.

use std::str::FromStr;

use helpline_core::types::{ChatReply, HistoryEntry, Message, MessageId, Role, SessionId, TurnMetadata};

/// Conversation data owned by the store. Views only read it.
///
/// At most one message has `streaming = true`, and only while
/// `is_streaming` is set.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<Message>,
    session_id: Option<SessionId>,
    is_loading: bool,
    is_streaming: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// A blocking request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// A streamed turn is in flight.
    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().rev().find(|m| &m.id == id)
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    pub(crate) fn push_user(&mut self, text: &str) -> MessageId {
        let message = Message::user(text);
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Appends an empty streaming assistant entry and marks the turn in flight.
    pub(crate) fn push_placeholder(&mut self) -> MessageId {
        let message = Message::placeholder();
        let id = message.id.clone();
        self.messages.push(message);
        self.is_streaming = true;
        id
    }

    /// Appends a completed assistant entry from a blocking reply.
    pub(crate) fn push_reply(&mut self, reply: &ChatReply) -> MessageId {
        let mut message = Message::assistant(reply.reply.clone());
        message.intent = reply.intent.clone();
        message.sources = reply.rag_sources.clone();
        message.latency_ms = reply.latency_ms;
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Returns the active session id, minting and adopting one if absent.
    pub(crate) fn ensure_session(&mut self) -> SessionId {
        self.session_id.get_or_insert_with(SessionId::generate).clone()
    }

    pub(crate) fn adopt_session(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    /// Appends a fragment to a message that is still streaming.
    ///
    /// Returns false, leaving the log untouched, when the message is unknown
    /// or already finalized.
    pub(crate) fn append_token(&mut self, id: &MessageId, fragment: &str) -> bool {
        match self.streaming_mut(id) {
            Some(message) => {
                message.content.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Completes a streamed turn with its server metadata.
    pub(crate) fn finish(&mut self, id: &MessageId, meta: &TurnMetadata) {
        if let Some(session_id) = &meta.session_id {
            self.session_id = Some(session_id.clone());
        }
        if let Some(message) = self.streaming_mut(id) {
            message.streaming = false;
            message.intent = meta.intent.clone();
            message.sources = meta.sources.clone();
            message.latency_ms = meta.latency_ms;
        }
        self.is_streaming = false;
    }

    /// Ends a streamed turn without a reply. Content received so far is kept.
    pub(crate) fn fail(&mut self, id: &MessageId) {
        if let Some(message) = self.streaming_mut(id) {
            message.streaming = false;
        }
        self.is_streaming = false;
    }

    /// Replaces the log with a server-side history of `session_id`.
    ///
    /// Entries with roles other than user and assistant are dropped.
    pub(crate) fn load_history(&mut self, session_id: SessionId, entries: &[HistoryEntry]) {
        self.messages = entries
            .iter()
            .filter_map(|entry| match Role::from_str(&entry.role) {
                Ok(Role::User) => Some(Message::user(entry.content.clone())),
                Ok(Role::Assistant) => Some(Message::assistant(entry.content.clone())),
                Err(_) => None,
            })
            .collect();
        self.session_id = Some(session_id);
        self.is_streaming = false;
        self.is_loading = false;
    }

    /// Empties the log and forgets the session. Returns the session that was active.
    pub(crate) fn reset(&mut self) -> Option<SessionId> {
        let previous = self.session_id.take();
        self.messages.clear();
        self.is_loading = false;
        self.is_streaming = false;
        previous
    }

    fn streaming_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .rev()
            .find(|m| &m.id == id)
            .filter(|m| m.streaming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming_count(state: &ConversationState) -> usize {
        state.messages().iter().filter(|m| m.streaming).count()
    }

    #[test]
    fn placeholder_marks_turn_in_flight() {
        let mut state = ConversationState::new();
        state.push_user("hi");
        let id = state.push_placeholder();

        assert!(state.is_streaming());
        assert_eq!(state.messages().len(), 2);
        assert!(state.message(&id).unwrap().streaming);
        assert!(!state.messages()[0].streaming);
    }

    #[test]
    fn ensure_session_mints_once() {
        let mut state = ConversationState::new();
        let first = state.ensure_session();
        assert_eq!(state.ensure_session(), first);
        assert_eq!(state.session_id(), Some(&first));
    }

    #[test]
    fn tokens_are_not_applied_after_finish() {
        let mut state = ConversationState::new();
        let id = state.push_placeholder();
        assert!(state.append_token(&id, "您"));
        state.finish(&id, &TurnMetadata::default());

        assert!(!state.append_token(&id, "late"));
        assert_eq!(state.message(&id).unwrap().content, "您");
        assert_eq!(streaming_count(&state), 0);
    }

    #[test]
    fn finish_adopts_server_session_and_metadata() {
        let mut state = ConversationState::new();
        state.ensure_session();
        let id = state.push_placeholder();
        state.finish(
            &id,
            &TurnMetadata {
                session_id: Some(SessionId::from("srv-1")),
                intent: Some("after_sales".into()),
                sources: vec!["refund.md".into()],
                latency_ms: Some(42),
                ..TurnMetadata::default()
            },
        );

        let message = state.message(&id).unwrap();
        assert_eq!(message.intent.as_deref(), Some("after_sales"));
        assert_eq!(message.sources, vec!["refund.md"]);
        assert_eq!(message.latency_ms, Some(42));
        assert_eq!(state.session_id().unwrap().as_str(), "srv-1");
        assert!(!state.is_streaming());
    }

    #[test]
    fn finish_without_server_session_keeps_local_one() {
        let mut state = ConversationState::new();
        let local = state.ensure_session();
        let id = state.push_placeholder();
        state.finish(&id, &TurnMetadata::default());
        assert_eq!(state.session_id(), Some(&local));
    }

    #[test]
    fn fail_clears_both_flags_and_keeps_partial_content() {
        let mut state = ConversationState::new();
        let id = state.push_placeholder();
        state.append_token(&id, "部分");
        state.fail(&id);

        assert!(!state.is_streaming());
        assert_eq!(streaming_count(&state), 0);
        assert_eq!(state.message(&id).unwrap().content, "部分");
    }

    #[test]
    fn reply_becomes_complete_assistant_message() {
        let mut state = ConversationState::new();
        let reply = ChatReply {
            session_id: SessionId::from("s"),
            reply: "ok".into(),
            intent: Some("faq".into()),
            intent_confidence: None,
            rag_sources: vec!["a.md".into()],
            tokens: Default::default(),
            latency_ms: Some(7),
        };
        let id = state.push_reply(&reply);
        let message = state.message(&id).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert!(!message.streaming);
        assert_eq!(message.intent.as_deref(), Some("faq"));
        assert_eq!(message.latency_ms, Some(7));
    }

    #[test]
    fn history_skips_unknown_roles() {
        let mut state = ConversationState::new();
        state.push_user("old");
        state.load_history(
            SessionId::from("s-9"),
            &[
                HistoryEntry { role: "system".into(), content: "prompt".into() },
                HistoryEntry { role: "user".into(), content: "在吗".into() },
                HistoryEntry { role: "assistant".into(), content: "在的".into() },
            ],
        );

        let roles: Vec<Role> = state.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(state.session_id().unwrap().as_str(), "s-9");
    }

    #[test]
    fn reset_returns_previous_session() {
        let mut state = ConversationState::new();
        let sid = state.ensure_session();
        state.push_user("x");
        state.set_loading(true);

        assert_eq!(state.reset(), Some(sid));
        assert!(state.messages().is_empty());
        assert!(state.session_id().is_none());
        assert!(!state.is_loading());
        assert_eq!(state.reset(), None);
    }
}
