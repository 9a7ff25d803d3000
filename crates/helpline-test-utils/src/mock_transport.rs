// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock streaming transport for deterministic testing.
//!
//! `MockTransport` implements `ChatTransport` by playing one queued
//! [`TurnScript`] per `open()` call and recording every request it was given.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use helpline_core::traits::transport::TurnSender;
use helpline_core::types::{TransportEvent, TurnRequest};
use helpline_core::{ChatTransport, TurnStream};

/// What the mock does for one opened turn.
#[derive(Debug)]
pub enum TurnScript {
    /// Emit the events in order, then end the stream.
    Events(Vec<TransportEvent>),
    /// Emit the events in order, then stay silent until cancelled.
    Stall(Vec<TransportEvent>),
    /// Hand the producer half to the test, which drives the turn itself.
    Manual(oneshot::Sender<TurnSender>),
}

#[derive(Default)]
struct Inner {
    scripts: VecDeque<TurnScript>,
    requests: Vec<TurnRequest>,
    cancel_tokens: Vec<CancellationToken>,
}

/// A scripted streaming transport for testing.
///
/// Opening a turn with no script queued yields a single terminal error.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a turn that emits `events` and then ends.
    pub fn script(&self, events: Vec<TransportEvent>) {
        self.push(TurnScript::Events(events));
    }

    /// Queue a turn that emits `events` and then never finishes.
    pub fn script_stall(&self, events: Vec<TransportEvent>) {
        self.push(TurnScript::Stall(events));
    }

    /// Queue a turn driven by the test. The receiver resolves once the turn is opened.
    pub fn script_manual(&self) -> oneshot::Receiver<TurnSender> {
        let (tx, rx) = oneshot::channel();
        self.push(TurnScript::Manual(tx));
        rx
    }

    pub fn push(&self, script: TurnScript) {
        self.lock().scripts.push_back(script);
    }

    /// Every request passed to `open()`, in call order.
    pub fn requests(&self) -> Vec<TurnRequest> {
        self.lock().requests.clone()
    }

    pub fn open_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Whether the `index`-th opened turn has been cancelled (or its stream dropped).
    pub fn was_cancelled(&self, index: usize) -> bool {
        self.lock()
            .cancel_tokens
            .get(index)
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ChatTransport for MockTransport {
    fn open(&self, request: TurnRequest) -> TurnStream {
        let (sender, stream) = TurnStream::channel();
        let script = {
            let mut inner = self.lock();
            inner.requests.push(request);
            inner.cancel_tokens.push(stream.cancel_token());
            inner.scripts.pop_front()
        };

        match script {
            Some(TurnScript::Manual(handoff)) => {
                let _ = handoff.send(sender);
            }
            Some(TurnScript::Events(events)) => {
                tokio::spawn(async move {
                    play(&sender, events).await;
                });
            }
            Some(TurnScript::Stall(events)) => {
                tokio::spawn(async move {
                    if play(&sender, events).await {
                        sender.cancelled().await;
                    }
                });
            }
            None => {
                tokio::spawn(async move {
                    sender
                        .send(TransportEvent::Error("no scripted turn".to_string()))
                        .await;
                });
            }
        }

        stream
    }
}

/// Sends events until cancelled. Returns false if the consumer went away.
async fn play(sender: &TurnSender, events: Vec<TransportEvent>) -> bool {
    for event in events {
        if sender.is_cancelled() || !sender.send(event).await {
            return false;
        }
    }
    true
}
