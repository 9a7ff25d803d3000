// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation session store.
//!
//! A streamed turn is started with [`ConversationStore::send_streaming`] and
//! driven by repeated calls to [`ConversationStore::next_event`], each of
//! which applies one transport event to the log and reports it. At most one
//! turn is in flight; a second `send_streaming` is rejected until the first
//! reaches a terminal event.

use std::sync::Arc;
use std::time::Duration;

use helpline_core::types::{
    ChatReply, Feedback, MessageId, SessionId, TransportEvent, TurnMetadata, TurnRequest,
    UserProfile,
};
use helpline_core::{ChatBackend, ChatTransport, HelplineError, Message, TurnStream};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::AuthContext;
use crate::state::ConversationState;

/// Default bound on silence between two events of a streamed turn.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(120);

/// An event of a streamed turn, after it has been applied to the log.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// A fragment was appended to the placeholder.
    Token(String),
    /// The reply is complete.
    Done(TurnMetadata),
    /// The turn ended without a reply. The detail is never empty.
    Failed(String),
    /// The caller cancelled the turn.
    Cancelled,
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnEvent::Token(_))
    }
}

/// Busy flags of the store, published to [`ConversationStore::watch_activity`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Activity {
    pub is_loading: bool,
    pub is_streaming: bool,
}

impl Activity {
    fn of(state: &ConversationState) -> Self {
        Self {
            is_loading: state.is_loading(),
            is_streaming: state.is_streaming(),
        }
    }
}

fn publish(tx: &watch::Sender<Activity>, state: &ConversationState) {
    let now = Activity::of(state);
    tx.send_if_modified(|current| {
        let changed = *current != now;
        *current = now;
        changed
    });
}

/// Caller-side handle to a streamed turn.
#[derive(Debug, Clone)]
pub struct TurnHandle {
    placeholder: MessageId,
    session_id: SessionId,
    cancel: CancellationToken,
}

impl TurnHandle {
    /// Id of the assistant message the turn streams into.
    pub fn placeholder_id(&self) -> &MessageId {
        &self.placeholder
    }

    /// Session id the turn was opened with.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Requests cancellation. The next `next_event` reports [`TurnEvent::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct ActiveTurn {
    placeholder: MessageId,
    stream: TurnStream,
}

/// Sets `is_loading` for the lifetime of the guard.
struct LoadingGuard<'a> {
    state: &'a mut ConversationState,
    activity: &'a watch::Sender<Activity>,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a mut ConversationState, activity: &'a watch::Sender<Activity>) -> Self {
        state.set_loading(true);
        publish(activity, state);
        Self { state, activity }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.set_loading(false);
        publish(self.activity, self.state);
    }
}

/// Sole owner and mutator of the conversation state and credentials.
pub struct ConversationStore {
    state: ConversationState,
    auth: AuthContext,
    transport: Arc<dyn ChatTransport>,
    backend: Arc<dyn ChatBackend>,
    inactivity_timeout: Duration,
    active: Option<ActiveTurn>,
    activity: watch::Sender<Activity>,
}

impl ConversationStore {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        backend: Arc<dyn ChatBackend>,
        auth: AuthContext,
    ) -> Self {
        Self {
            state: ConversationState::new(),
            auth,
            transport,
            backend,
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            active: None,
            activity: watch::Sender::new(Activity::default()),
        }
    }

    /// Fails a streamed turn that stays silent for `timeout`.
    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        self.state.messages()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.state.session_id()
    }

    pub fn is_streaming(&self) -> bool {
        self.state.is_streaming()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Follows `is_loading` and `is_streaming` while a request is awaited.
    ///
    /// The accessors borrow the store, which an in-flight `send_blocking`
    /// holds mutably; a receiver can be read from another task meanwhile.
    pub fn watch_activity(&self) -> watch::Receiver<Activity> {
        self.activity.subscribe()
    }

    fn publish(&self) {
        publish(&self.activity, &self.state);
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.auth.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Starts a streamed turn.
    ///
    /// Blank text, or a turn already in flight, is rejected: nothing is
    /// appended, no connection is opened, and `None` is returned. Otherwise
    /// the user message and an empty streaming placeholder are appended, the
    /// session id is minted if absent, and the transport is opened.
    pub fn send_streaming(&mut self, text: &str) -> Option<TurnHandle> {
        if text.trim().is_empty() {
            debug!("ignoring blank message");
            return None;
        }
        if self.active.is_some() || self.state.is_streaming() {
            debug!("turn already in flight, rejecting message");
            return None;
        }

        self.state.push_user(text);
        let placeholder = self.state.push_placeholder();
        let session_id = self.state.ensure_session();

        let stream = self.transport.open(TurnRequest {
            session_id: session_id.clone(),
            text: text.to_string(),
            token: self.auth.token().map(str::to_string),
        });
        info!(session_id = %session_id, placeholder = %placeholder, "streaming turn started");

        let handle = TurnHandle {
            placeholder: placeholder.clone(),
            session_id,
            cancel: stream.cancel_token(),
        };
        self.active = Some(ActiveTurn {
            placeholder,
            stream,
        });
        self.publish();
        Some(handle)
    }

    /// Waits for the next event of the active turn and applies it.
    ///
    /// Returns `None` when no turn is active. After a terminal event the turn
    /// is released, so nothing it still sends can reach the log.
    pub async fn next_event(&mut self) -> Option<TurnEvent> {
        let timeout = self.inactivity_timeout;
        let turn = self.active.as_mut()?;
        let placeholder = turn.placeholder.clone();
        let cancel = turn.stream.cancel_token();

        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => TurnEvent::Cancelled,
            received = tokio::time::timeout(timeout, turn.stream.recv()) => match received {
                Ok(Some(TransportEvent::Token(fragment))) => TurnEvent::Token(fragment),
                Ok(Some(TransportEvent::Done(meta))) => TurnEvent::Done(meta),
                Ok(Some(TransportEvent::Error(detail))) => TurnEvent::Failed(non_empty(detail)),
                Ok(None) => TurnEvent::Failed("connection ended before the reply completed".to_string()),
                Err(_) => TurnEvent::Failed(format!("no reply received within {timeout:?}")),
            },
        };

        self.apply(&placeholder, &event);
        Some(event)
    }

    fn apply(&mut self, placeholder: &MessageId, event: &TurnEvent) {
        match event {
            TurnEvent::Token(fragment) => {
                if self.state.append_token(placeholder, fragment) {
                    debug!(len = fragment.len(), "token applied");
                }
            }
            TurnEvent::Done(meta) => {
                self.state.finish(placeholder, meta);
                info!(
                    session_id = self.state.session_id().map(SessionId::as_str),
                    intent = meta.intent.as_deref(),
                    latency_ms = meta.latency_ms,
                    "streaming turn completed"
                );
            }
            TurnEvent::Failed(detail) => {
                self.state.fail(placeholder);
                warn!(detail = detail.as_str(), "streaming turn failed");
            }
            TurnEvent::Cancelled => {
                self.state.fail(placeholder);
                info!("streaming turn cancelled");
            }
        }

        if event.is_terminal() {
            if let Some(turn) = self.active.take() {
                turn.stream.cancel();
            }
            self.publish();
        }
    }

    /// Runs a whole streamed turn, reporting each applied event to `on_event`.
    ///
    /// `on_event` sees every token in order and then exactly one terminal
    /// event, which is also returned. Returns `None` if the message was
    /// rejected.
    pub async fn stream_turn<F>(&mut self, text: &str, mut on_event: F) -> Option<TurnEvent>
    where
        F: FnMut(&TurnEvent),
    {
        self.send_streaming(text)?;
        while let Some(event) = self.next_event().await {
            on_event(&event);
            if event.is_terminal() {
                return Some(event);
            }
        }
        None
    }

    /// Cancels the active turn, if any, and applies the cancellation to the log.
    pub fn cancel_turn(&mut self) {
        if let Some(turn) = self.active.as_ref() {
            let placeholder = turn.placeholder.clone();
            self.apply(&placeholder, &TurnEvent::Cancelled);
        }
    }

    /// Sends one message and waits for the complete reply.
    ///
    /// `is_loading` is set for the duration of the call and cleared however
    /// it ends. A 401 signs the user out before the error is returned.
    pub async fn send_blocking(&mut self, text: &str) -> Result<ChatReply, HelplineError> {
        if text.trim().is_empty() {
            return Err(HelplineError::Validation("message is empty".to_string()));
        }
        if self.active.is_some() {
            return Err(HelplineError::Validation(
                "a streamed reply is still in progress".to_string(),
            ));
        }

        self.state.push_user(text);
        let session_id = self.state.session_id().cloned();
        let result = {
            let _loading = LoadingGuard::new(&mut self.state, &self.activity);
            self.backend
                .send_message(self.auth.token(), text, session_id.as_ref())
                .await
        };

        match result {
            Ok(reply) => {
                self.state.adopt_session(reply.session_id.clone());
                self.state.push_reply(&reply);
                info!(
                    session_id = reply.session_id.as_str(),
                    intent = reply.intent.as_deref(),
                    "blocking reply received"
                );
                Ok(reply)
            }
            Err(e) => {
                warn!(error = %e, "blocking send failed");
                if e.is_unauthorized() {
                    self.logout();
                }
                Err(e)
            }
        }
    }

    /// Resets the conversation, telling the backend the session ended.
    ///
    /// The local reset always happens; a failed end-of-session call is only logged.
    pub async fn clear_conversation(&mut self) {
        self.cancel_turn();
        let Some(session_id) = self.state.reset() else {
            return;
        };
        info!(session_id = %session_id, "conversation cleared");

        if let Err(e) = self
            .backend
            .end_session(self.auth.token(), &session_id)
            .await
        {
            warn!(session_id = %session_id, error = %e, "failed to end session");
        }
    }

    /// Signs in and persists the token.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<UserProfile, HelplineError> {
        let response = self.backend.login(username, password).await?;
        let user = response.user.clone();
        self.auth.sign_in(response.access_token, response.user)?;
        info!(username = user.username.as_str(), "signed in");
        Ok(user)
    }

    /// Forgets the identity and the whole conversation.
    pub fn logout(&mut self) {
        self.cancel_turn();
        self.auth.sign_out();
        self.state.reset();
        self.publish();
        info!("signed out");
    }

    /// Re-fetches the profile for the held token.
    ///
    /// Any failure is taken to mean the credential is unusable: the store
    /// signs out and returns the error.
    pub async fn fetch_identity(&mut self) -> Result<UserProfile, HelplineError> {
        let Some(token) = self.auth.token().map(str::to_string) else {
            return Err(HelplineError::Unauthorized {
                detail: "not signed in".to_string(),
            });
        };

        match self.backend.me(&token).await {
            Ok(user) => {
                self.auth.set_user(user.clone());
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "identity check failed, signing out");
                self.logout();
                Err(e)
            }
        }
    }

    /// Marks a message helpful or not. Failures are logged and dropped.
    pub async fn submit_feedback(&self, conversation_id: &str, message_id: &str, is_helpful: bool) {
        let feedback = Feedback::helpful(conversation_id, message_id, is_helpful);
        match self.backend.submit_feedback(self.auth.token(), &feedback).await {
            Ok(()) => debug!(message_id, is_helpful, "feedback submitted"),
            Err(e) => warn!(message_id, error = %e, "failed to submit feedback"),
        }
    }

    /// Replaces the local log with the server-side history of `session_id`.
    pub async fn load_history(&mut self, session_id: &SessionId) -> Result<usize, HelplineError> {
        if self.active.is_some() {
            return Err(HelplineError::Validation(
                "a streamed reply is still in progress".to_string(),
            ));
        }

        match self.backend.history(self.auth.token(), session_id).await {
            Ok(history) => {
                self.state
                    .load_history(history.session_id, &history.messages);
                Ok(self.state.messages().len())
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.logout();
                }
                Err(e)
            }
        }
    }
}

fn non_empty(detail: String) -> String {
    if detail.trim().is_empty() {
        "the server reported an error".to_string()
    } else {
        detail
    }
}
