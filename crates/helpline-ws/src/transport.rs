// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`ChatTransport`] implementation over tokio-tungstenite.
//!
//! `open` spawns one task per turn. The task connects, sends the message
//! frame, then forwards decoded frames to the turn's channel until a terminal
//! frame arrives, the connection fails, or the turn is cancelled.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use helpline_config::HelplineConfig;
use helpline_core::traits::transport::TurnSender;
use helpline_core::types::{SessionId, TransportEvent, TurnRequest};
use helpline_core::{ChatTransport, HelplineError, TurnStream};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn, Instrument};
use url::Url;

use crate::frame::{InboundFrame, OutboundFrame};

/// Endpoint and timing settings for [`WsTransport`].
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// HTTP(S) origin of the backend; mapped to `ws`/`wss` per turn.
    pub base_url: Url,
    /// Bound on TCP connect plus WebSocket handshake.
    pub connect_timeout: Duration,
}

impl TransportConfig {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, HelplineError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| HelplineError::Config(format!("invalid base URL `{base_url}`: {e}")))?;
        match base_url.scheme() {
            "http" | "https" | "ws" | "wss" => {}
            other => {
                return Err(HelplineError::Config(format!(
                    "unsupported scheme `{other}` for streaming endpoint"
                )));
            }
        }
        Ok(Self {
            base_url,
            connect_timeout,
        })
    }

    pub fn from_config(config: &HelplineConfig) -> Result<Self, HelplineError> {
        Self::new(&config.server.base_url, config.stream.connect_timeout())
    }
}

/// Streams chat turns over one WebSocket connection per turn.
#[derive(Debug, Clone)]
pub struct WsTransport {
    config: TransportConfig,
}

impl WsTransport {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Builds `<ws|wss>://host/ws/chat/{session_id}[?token=...]`.
    pub fn endpoint(&self, session_id: &SessionId, token: Option<&str>) -> Url {
        let mut url = self.config.base_url.clone();
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        // http/https/ws/wss are all special schemes, so switching between them succeeds.
        let _ = url.set_scheme(scheme);
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(["ws", "chat", session_id.as_str()]);
        }
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token);
        }
        url
    }
}

impl ChatTransport for WsTransport {
    fn open(&self, request: TurnRequest) -> TurnStream {
        let (sender, stream) = TurnStream::channel();
        let url = self.endpoint(&request.session_id, request.token.as_deref());
        let span = tracing::debug_span!("ws_turn", session_id = %request.session_id);
        let connect_timeout = self.config.connect_timeout;

        tokio::spawn(
            async move {
                if let Err(e) = run_turn(url, &request, connect_timeout, &sender).await {
                    warn!(error = %e, "streaming turn failed");
                    sender.send(TransportEvent::Error(e.to_string())).await;
                }
            }
            .instrument(span),
        );

        stream
    }
}

/// Drives one turn to completion. `Ok` means a terminal frame was relayed or
/// the turn was cancelled; `Err` is a connection-level failure still to be
/// reported.
async fn run_turn(
    url: Url,
    request: &TurnRequest,
    connect_timeout: Duration,
    sender: &TurnSender,
) -> Result<(), HelplineError> {
    let connect = tokio::time::timeout(connect_timeout, connect_async(url.as_str()));
    let (mut socket, _response) = tokio::select! {
        _ = sender.cancelled() => {
            debug!("cancelled before connect");
            return Ok(());
        }
        connected = connect => connected
            .map_err(|_| HelplineError::Transport {
                message: format!("connection not established within {connect_timeout:?}"),
                source: None,
            })?
            .map_err(|e| HelplineError::Transport {
                message: format!("failed to connect: {e}"),
                source: Some(Box::new(e)),
            })?,
    };
    debug!("connected");

    let payload = serde_json::to_string(&OutboundFrame {
        message: &request.text,
        token: request.token.as_deref(),
    })
    .map_err(|e| HelplineError::Internal(format!("failed to encode message frame: {e}")))?;

    socket
        .send(Message::Text(payload.into()))
        .await
        .map_err(|e| HelplineError::Transport {
            message: format!("failed to send message: {e}"),
            source: Some(Box::new(e)),
        })?;

    loop {
        let incoming = tokio::select! {
            _ = sender.cancelled() => {
                debug!("cancelled, closing socket");
                let _ = socket.close(None).await;
                return Ok(());
            }
            incoming = socket.next() => incoming,
        };

        match incoming {
            Some(Ok(Message::Text(text))) => {
                let event = match InboundFrame::decode(text.as_str()) {
                    Ok(frame) => TransportEvent::from(frame),
                    Err(e) => {
                        warn!(error = %e, "skipping undecodable frame");
                        continue;
                    }
                };
                let terminal = event.is_terminal();
                if !sender.send(event).await {
                    debug!("consumer gone, closing socket");
                    let _ = socket.close(None).await;
                    return Ok(());
                }
                if terminal {
                    let _ = socket.close(None).await;
                    return Ok(());
                }
            }
            Some(Ok(Message::Close(frame))) => {
                let reason = frame
                    .map(|f| format!(" ({} {})", u16::from(f.code), f.reason.as_str()))
                    .unwrap_or_default();
                return Err(HelplineError::Transport {
                    message: format!("connection closed before the reply completed{reason}"),
                    source: None,
                });
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(HelplineError::Transport {
                    message: format!("connection error: {e}"),
                    source: Some(Box::new(e)),
                });
            }
            None => {
                return Err(HelplineError::Transport {
                    message: "connection closed before the reply completed".to_string(),
                    source: None,
                });
            }
        }
    }
}
