// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket transport for streamed chat turns.
//!
//! Each turn opens its own connection to `/ws/chat/{session_id}`, sends a
//! single message frame and relays the backend's `token` / `done` / `error`
//! frames as [`TransportEvent`](helpline_core::types::TransportEvent)s.

pub mod frame;
pub mod transport;

pub use frame::{InboundFrame, OutboundFrame};
pub use transport::{TransportConfig, WsTransport};
