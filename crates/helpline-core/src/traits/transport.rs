// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming transport trait and the per-turn event stream it returns.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::types::{TransportEvent, TurnRequest};

/// Capacity of the per-turn event channel.
pub const TURN_CHANNEL_CAPACITY: usize = 64;

/// Carries exactly one request/response-stream exchange per call to [`open`](ChatTransport::open).
pub trait ChatTransport: Send + Sync {
    /// Starts a turn and returns its event stream without waiting for the connection.
    ///
    /// Must be called from within a Tokio runtime. Connection failures are
    /// never returned here; they arrive as a terminal [`TransportEvent::Error`].
    fn open(&self, request: TurnRequest) -> TurnStream;
}

/// Ordered events of one turn plus the token that cancels it.
///
/// Dropping the stream cancels the turn, which closes the underlying
/// connection.
#[derive(Debug)]
pub struct TurnStream {
    events: mpsc::Receiver<TransportEvent>,
    cancel: CancellationToken,
}

impl TurnStream {
    pub fn new(events: mpsc::Receiver<TransportEvent>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// Creates a connected sender / stream pair for transport implementations.
    pub fn channel() -> (TurnSender, TurnStream) {
        let (tx, rx) = mpsc::channel(TURN_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        (
            TurnSender {
                tx,
                cancel: cancel.clone(),
            },
            TurnStream::new(rx, cancel),
        )
    }

    /// Receives the next event, or `None` once the transport has finished.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    /// A handle that cancels this turn when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for TurnStream {
    type Item = TransportEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for TurnStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Producer half held by a transport task.
#[derive(Debug, Clone)]
pub struct TurnSender {
    tx: mpsc::Sender<TransportEvent>,
    cancel: CancellationToken,
}

impl TurnSender {
    /// Forwards an event. Returns false once the consumer is gone.
    pub async fn send(&self, event: TransportEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    /// Resolves when the consumer cancels the turn or drops the stream.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
