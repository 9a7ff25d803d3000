// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frames exchanged on the chat socket.
//!
//! Client -> Server:
//! ```json
//! {"message": "如何申请退款？", "token": "optional-access-token"}
//! ```
//!
//! Server -> Client:
//! ```json
//! {"type": "token", "content": "partial..."}
//! {"type": "done", "session_id": "...", "intent": "after_sales", "sources": ["..."]}
//! {"type": "error", "detail": "..."}
//! ```

use helpline_core::types::{TransportEvent, TurnMetadata};
use serde::{Deserialize, Serialize};

/// Diagnostic used when the server sends an `error` frame with an empty detail.
const UNSPECIFIED_SERVER_ERROR: &str = "server reported an unspecified error";

/// The single frame sent after the handshake.
#[derive(Debug, Serialize)]
pub struct OutboundFrame<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
}

/// A frame received from the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    Token { content: String },
    Done(TurnMetadata),
    Error { detail: String },
}

impl InboundFrame {
    /// Decodes a text frame. Unknown frame types and malformed JSON are errors.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl From<InboundFrame> for TransportEvent {
    fn from(frame: InboundFrame) -> Self {
        match frame {
            InboundFrame::Token { content } => TransportEvent::Token(content),
            InboundFrame::Done(meta) => TransportEvent::Done(meta),
            InboundFrame::Error { detail } if detail.trim().is_empty() => {
                TransportEvent::Error(UNSPECIFIED_SERVER_ERROR.to_string())
            }
            InboundFrame::Error { detail } => TransportEvent::Error(detail),
        }
    }
}
