// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavioural tests of the conversation store against mock adapters.

use std::sync::Arc;
use std::time::Duration;

use helpline_core::types::{
    ConversationHistory, HistoryEntry, Role, SessionId, TransportEvent, TurnMetadata,
};
use helpline_core::{HelplineError, TokenStore};
use helpline_store::{AuthContext, ConversationStore, MemoryTokenStore, TurnEvent};
use helpline_test_utils::mock_backend::{login_response, reply};
use helpline_test_utils::{BackendCall, MockBackend, MockTransport};
use proptest::prelude::*;

struct Fixture {
    store: ConversationStore,
    transport: MockTransport,
    backend: Arc<MockBackend>,
    tokens: Arc<MemoryTokenStore>,
}

fn build(tokens: MemoryTokenStore, inactivity_timeout: Duration) -> Fixture {
    let transport = MockTransport::new();
    let backend = MockBackend::new();
    let tokens = Arc::new(tokens);
    let store = ConversationStore::new(
        Arc::new(transport.clone()),
        backend.clone(),
        AuthContext::restore(tokens.clone()),
    )
    .with_inactivity_timeout(inactivity_timeout);
    Fixture {
        store,
        transport,
        backend,
        tokens,
    }
}

fn fixture_with(tokens: MemoryTokenStore) -> Fixture {
    build(tokens, Duration::from_secs(120))
}

fn fixture() -> Fixture {
    fixture_with(MemoryTokenStore::new())
}

fn streaming_count(store: &ConversationStore) -> usize {
    store.messages().iter().filter(|m| m.streaming).count()
}

fn token(s: &str) -> TransportEvent {
    TransportEvent::Token(s.to_string())
}

fn done_with_session(sid: &str, intent: &str) -> TransportEvent {
    TransportEvent::Done(TurnMetadata {
        session_id: Some(SessionId::from(sid)),
        intent: Some(intent.to_string()),
        ..TurnMetadata::default()
    })
}

/// Drives the active turn to its terminal event, checking the single-streaming invariant.
async fn drain(store: &mut ConversationStore) -> Vec<TurnEvent> {
    let mut events = Vec::new();
    while let Some(event) = store.next_event().await {
        assert!(streaming_count(store) <= 1);
        events.push(event);
    }
    events
}

#[tokio::test]
async fn refund_scenario() {
    let mut f = fixture();
    f.transport.script(vec![
        token("您"),
        token("好"),
        done_with_session("srv-1", "after_sales"),
    ]);

    let handle = f.store.send_streaming("如何申请退款？").unwrap();
    let events = drain(&mut f.store).await;

    assert_eq!(events.len(), 3);
    let messages = f.store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "如何申请退款？");

    let reply = &messages[1];
    assert_eq!(&reply.id, handle.placeholder_id());
    assert_eq!(reply.content, "您好");
    assert_eq!(reply.intent.as_deref(), Some("after_sales"));
    assert!(!reply.streaming);
    assert_eq!(f.store.session_id().unwrap().as_str(), "srv-1");
    assert!(!f.store.is_streaming());
}

#[tokio::test]
async fn send_streaming_appends_two_messages_before_any_event() {
    let mut f = fixture();
    let _sender = f.transport.script_manual();

    let handle = f.store.send_streaming("hello").unwrap();

    let messages = f.store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert!(!messages[0].streaming);
    assert_eq!(messages[1].role, Role::Assistant);
    assert!(messages[1].content.is_empty());
    assert!(messages[1].streaming);
    assert!(f.store.is_streaming());

    let requests = f.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].text, "hello");
    assert_eq!(&requests[0].session_id, handle.session_id());
    assert_eq!(f.store.session_id(), Some(handle.session_id()));
}

#[tokio::test]
async fn blank_input_is_ignored() {
    let mut f = fixture();
    assert!(f.store.send_streaming("").is_none());
    assert!(f.store.send_streaming("   \n\t").is_none());

    assert!(f.store.messages().is_empty());
    assert_eq!(f.transport.open_count(), 0);
    assert!(f.store.session_id().is_none());
    assert!(f.store.next_event().await.is_none());
}

#[tokio::test]
async fn second_turn_is_rejected_while_first_is_in_flight() {
    let mut f = fixture();
    let handoff = f.transport.script_manual();
    f.store.send_streaming("first").unwrap();

    assert!(f.store.send_streaming("second").is_none());
    assert_eq!(f.store.messages().len(), 2);
    assert_eq!(f.transport.open_count(), 1);
    assert_eq!(streaming_count(&f.store), 1);

    let sender = handoff.await.unwrap();
    sender.send(TransportEvent::Done(TurnMetadata::default())).await;
    drain(&mut f.store).await;

    // Once finished, the next turn reuses the session.
    let first_session = f.store.session_id().cloned().unwrap();
    f.transport.script(vec![TransportEvent::Done(TurnMetadata::default())]);
    f.store.send_streaming("second").unwrap();
    assert_eq!(f.transport.requests()[1].session_id, first_session);
    drain(&mut f.store).await;
    assert_eq!(f.store.messages().len(), 4);
}

#[tokio::test]
async fn server_session_replaces_minted_one() {
    let mut f = fixture();
    f.transport.script(vec![done_with_session("srv-9", "faq")]);

    let handle = f.store.send_streaming("q").unwrap();
    let minted = handle.session_id().clone();
    drain(&mut f.store).await;

    assert_ne!(minted.as_str(), "srv-9");
    assert_eq!(f.store.session_id().unwrap().as_str(), "srv-9");
}

#[tokio::test]
async fn error_frame_fails_turn_once_and_keeps_log() {
    let mut f = fixture();
    f.transport.script(vec![
        token("部分"),
        TransportEvent::Error("LLM unavailable".into()),
    ]);

    let mut failures = Vec::new();
    let mut tokens = String::new();
    let last = f
        .store
        .stream_turn("q", |event| match event {
            TurnEvent::Token(t) => tokens.push_str(t),
            TurnEvent::Failed(detail) => failures.push(detail.clone()),
            other => panic!("unexpected {other:?}"),
        })
        .await;

    assert_eq!(last, Some(TurnEvent::Failed("LLM unavailable".into())));
    assert_eq!(failures, vec!["LLM unavailable".to_string()]);
    assert_eq!(tokens, "部分");
    assert!(!f.store.is_streaming());
    assert_eq!(streaming_count(&f.store), 0);
    assert_eq!(f.store.messages().len(), 2);
    assert_eq!(f.store.messages()[1].content, "部分");
}

#[tokio::test]
async fn stream_ending_without_terminal_event_is_a_failure() {
    let mut f = fixture();
    f.transport.script(vec![token("a")]);

    f.store.send_streaming("q").unwrap();
    let events = drain(&mut f.store).await;

    assert_eq!(events[0], TurnEvent::Token("a".into()));
    match &events[1] {
        TurnEvent::Failed(detail) => assert!(!detail.is_empty()),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(events.len(), 2);
    assert!(!f.store.is_streaming());
}

#[tokio::test]
async fn empty_error_detail_still_yields_diagnostic() {
    let mut f = fixture();
    f.transport.script(vec![TransportEvent::Error(String::new())]);

    let last = f.store.stream_turn("q", |_| {}).await;
    match last {
        Some(TurnEvent::Failed(detail)) => assert!(!detail.trim().is_empty()),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn silent_backend_hits_inactivity_timeout() {
    let mut f = build(MemoryTokenStore::new(), Duration::from_secs(30));
    f.transport.script_stall(vec![token("半")]);

    f.store.send_streaming("q").unwrap();
    assert_eq!(f.store.next_event().await, Some(TurnEvent::Token("半".into())));

    let started = tokio::time::Instant::now();
    match f.store.next_event().await {
        Some(TurnEvent::Failed(detail)) => assert!(detail.contains("no reply")),
        other => panic!("expected timeout failure, got {other:?}"),
    }
    assert!(started.elapsed() >= Duration::from_secs(30));
    assert!(!f.store.is_streaming());
    assert_eq!(streaming_count(&f.store), 0);
    assert!(f.transport.was_cancelled(0));
    assert!(f.store.next_event().await.is_none());
}

#[tokio::test]
async fn cancelling_via_handle_ends_turn() {
    let mut f = fixture();
    f.transport.script_stall(vec![token("一")]);

    let handle = f.store.send_streaming("q").unwrap();
    assert_eq!(f.store.next_event().await, Some(TurnEvent::Token("一".into())));

    handle.cancel();
    assert_eq!(f.store.next_event().await, Some(TurnEvent::Cancelled));
    assert!(f.store.next_event().await.is_none());
    assert!(!f.store.is_streaming());
    assert_eq!(streaming_count(&f.store), 0);
    assert_eq!(f.store.messages()[1].content, "一");
    assert!(f.transport.was_cancelled(0));

    // A new turn may start straight away.
    f.transport.script(vec![TransportEvent::Done(TurnMetadata::default())]);
    assert!(f.store.send_streaming("again").is_some());
}

#[tokio::test]
async fn late_frames_never_reach_finalized_message() {
    let mut f = fixture();
    let handoff = f.transport.script_manual();
    f.store.send_streaming("q").unwrap();
    let sender = handoff.await.unwrap();

    sender.send(token("ok")).await;
    sender.send(TransportEvent::Done(TurnMetadata::default())).await;
    let events = drain(&mut f.store).await;
    assert_eq!(events.len(), 2);

    // The turn was released after `done`, so the channel is closed.
    assert!(!sender.send(token("late")).await);
    assert!(f.store.next_event().await.is_none());
    assert_eq!(f.store.messages()[1].content, "ok");
}

#[tokio::test]
async fn clear_conversation_resets_even_if_end_session_fails() {
    let mut f = fixture();
    f.transport.script(vec![done_with_session("srv-1", "faq")]);
    f.store.stream_turn("q", |_| {}).await;

    f.backend
        .push_end_session(Err(HelplineError::Http {
            message: "connection refused".into(),
            source: None,
        }))
        .await;
    f.store.clear_conversation().await;

    assert!(f.store.messages().is_empty());
    assert!(f.store.session_id().is_none());
    assert_eq!(
        f.backend.calls().await,
        vec![BackendCall::EndSession {
            token: None,
            session_id: SessionId::from("srv-1"),
        }]
    );
}

#[tokio::test]
async fn clear_without_session_skips_backend() {
    let mut f = fixture();
    f.store.clear_conversation().await;
    assert!(f.backend.calls().await.is_empty());
}

#[tokio::test]
async fn clear_cancels_in_flight_turn() {
    let mut f = fixture();
    f.transport.script_stall(vec![]);
    f.store.send_streaming("q").unwrap();

    f.store.clear_conversation().await;

    assert!(f.store.messages().is_empty());
    assert!(!f.store.is_streaming());
    assert!(f.transport.was_cancelled(0));
    assert!(f.store.next_event().await.is_none());
}

#[tokio::test]
async fn logout_clears_everything_and_next_turn_gets_fresh_session() {
    let mut f = fixture();
    f.store.login("alice", "pw").await.unwrap();
    f.transport.script(vec![TransportEvent::Done(TurnMetadata::default())]);
    f.store.stream_turn("q", |_| {}).await;
    let old_session = f.store.session_id().cloned().unwrap();

    f.store.logout();

    assert!(f.store.messages().is_empty());
    assert!(f.store.session_id().is_none());
    assert!(f.store.user().is_none());
    assert!(!f.store.is_authenticated());
    assert_eq!(f.tokens.load().unwrap(), None);

    f.transport.script(vec![TransportEvent::Done(TurnMetadata::default())]);
    let handle = f.store.send_streaming("again").unwrap();
    assert_ne!(handle.session_id(), &old_session);
    assert_eq!(f.transport.requests()[1].token, None);
}

#[tokio::test]
async fn login_persists_token_and_turns_carry_it() {
    let mut f = fixture();
    f.backend
        .push_login(Ok(login_response("jwt-alice", "alice")))
        .await;

    let user = f.store.login("alice", "pw").await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(f.tokens.load().unwrap().as_deref(), Some("jwt-alice"));

    f.transport.script(vec![TransportEvent::Done(TurnMetadata::default())]);
    f.store.send_streaming("q").unwrap();
    assert_eq!(f.transport.requests()[0].token.as_deref(), Some("jwt-alice"));
}

#[tokio::test]
async fn failed_login_leaves_state_untouched() {
    let mut f = fixture();
    f.backend
        .push_login(Err(HelplineError::Unauthorized {
            detail: "用户名或密码错误".into(),
        }))
        .await;

    assert!(f.store.login("alice", "bad").await.is_err());
    assert!(!f.store.is_authenticated());
    assert_eq!(f.tokens.load().unwrap(), None);
}

#[tokio::test]
async fn blocking_send_appends_complete_reply() {
    let mut f = fixture();
    let mut canned = reply("srv-2", "请在订单页申请退款");
    canned.intent = Some("after_sales".into());
    canned.rag_sources = vec!["refund.md".into()];
    f.backend.push_reply(Ok(canned)).await;

    let got = f.store.send_blocking("如何申请退款？").await.unwrap();
    assert_eq!(got.reply, "请在订单页申请退款");

    let messages = f.store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert!(!messages[1].streaming);
    assert_eq!(messages[1].sources, vec!["refund.md"]);
    assert_eq!(f.store.session_id().unwrap().as_str(), "srv-2");
    assert!(!f.store.is_loading());
    assert_eq!(f.transport.open_count(), 0);

    // The adopted session rides along on the next call.
    f.store.send_blocking("谢谢").await.unwrap();
    let calls = f.backend.calls().await;
    assert!(matches!(
        &calls[1],
        BackendCall::SendMessage { session_id: Some(sid), .. } if sid.as_str() == "srv-2"
    ));
}

#[tokio::test]
async fn blocking_failure_propagates_and_clears_loading() {
    let mut f = fixture();
    f.backend
        .push_reply(Err(HelplineError::Api {
            status: 500,
            detail: "对话处理失败".into(),
            code: None,
            request_id: None,
        }))
        .await;

    let err = f.store.send_blocking("q").await.unwrap_err();
    assert!(matches!(err, HelplineError::Api { status: 500, .. }));
    assert!(!f.store.is_loading());
    assert_eq!(f.store.messages().len(), 1);
}

#[tokio::test]
async fn blocking_unauthorized_signs_out() {
    let mut f = fixture_with(MemoryTokenStore::with_token("stale"));
    f.backend
        .push_reply(Err(HelplineError::Unauthorized {
            detail: "expired".into(),
        }))
        .await;

    let err = f.store.send_blocking("q").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!f.store.is_authenticated());
    assert!(f.store.messages().is_empty());
    assert_eq!(f.tokens.load().unwrap(), None);
}

#[tokio::test]
async fn blocking_rejects_blank_input() {
    let mut f = fixture();
    let err = f.store.send_blocking("  ").await.unwrap_err();
    assert!(matches!(err, HelplineError::Validation(_)));
    assert!(f.store.messages().is_empty());
    assert!(f.backend.calls().await.is_empty());
}

#[tokio::test]
async fn fetch_identity_sets_user_from_restored_token() {
    let mut f = fixture_with(MemoryTokenStore::with_token("jwt"));
    assert!(f.store.user().is_none());

    let user = f.store.fetch_identity().await.unwrap();
    assert_eq!(f.store.user(), Some(&user));
    assert_eq!(
        f.backend.calls().await,
        vec![BackendCall::Me { token: "jwt".into() }]
    );
}

#[tokio::test]
async fn fetch_identity_failure_signs_out() {
    let mut f = fixture_with(MemoryTokenStore::with_token("jwt"));
    f.transport.script(vec![TransportEvent::Done(TurnMetadata::default())]);
    f.store.stream_turn("q", |_| {}).await;
    f.backend
        .push_me(Err(HelplineError::Http {
            message: "timeout".into(),
            source: None,
        }))
        .await;

    assert!(f.store.fetch_identity().await.is_err());
    assert!(!f.store.is_authenticated());
    assert!(f.store.messages().is_empty());
    assert!(f.store.session_id().is_none());
}

#[tokio::test]
async fn fetch_identity_without_token_is_unauthorized() {
    let mut f = fixture();
    let err = f.store.fetch_identity().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(f.backend.calls().await.is_empty());
}

#[tokio::test]
async fn feedback_failure_is_swallowed() {
    let mut f = fixture();
    f.transport.script(vec![TransportEvent::Done(TurnMetadata::default())]);
    f.store.stream_turn("q", |_| {}).await;
    let before = f.store.messages().to_vec();

    f.backend
        .push_feedback(Err(HelplineError::Http {
            message: "down".into(),
            source: None,
        }))
        .await;
    f.store.submit_feedback("c-1", "m-1", false).await;

    assert_eq!(f.store.messages(), before.as_slice());
    assert_eq!(
        f.backend
            .count(|c| matches!(c, BackendCall::Feedback { .. }))
            .await,
        1
    );
}

#[tokio::test]
async fn load_history_replaces_log() {
    let mut f = fixture();
    f.backend
        .push_history(Ok(ConversationHistory {
            session_id: SessionId::from("s-7"),
            messages: vec![
                HistoryEntry {
                    role: "user".into(),
                    content: "在吗".into(),
                },
                HistoryEntry {
                    role: "assistant".into(),
                    content: "在的".into(),
                },
            ],
            count: 2,
        }))
        .await;

    let loaded = f.store.load_history(&SessionId::from("s-7")).await.unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(f.store.session_id().unwrap().as_str(), "s-7");
    assert_eq!(f.store.messages()[1].content, "在的");
    assert_eq!(streaming_count(&f.store), 0);
}

proptest! {
    #[test]
    fn content_is_concatenation_of_fragments(fragments in prop::collection::vec(".{0,8}", 0..24)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let content = runtime.block_on(async {
            let mut f = fixture();
            let mut script: Vec<TransportEvent> = fragments.iter().map(|s| token(s)).collect();
            script.push(TransportEvent::Done(TurnMetadata::default()));
            f.transport.script(script);

            f.store.send_streaming("q").unwrap();
            drain(&mut f.store).await;
            assert!(!f.store.is_streaming());
            f.store.messages()[1].content.clone()
        });

        prop_assert_eq!(content, fragments.concat());
    }
}
