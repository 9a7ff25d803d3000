// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Helpline chat client.
//!
//! This crate provides the error type, the conversation domain types, and the
//! adapter traits that the transport, REST client, and conversation store are
//! written against.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::HelplineError;
pub use types::{Message, MessageId, Role, SessionId, TransportEvent, TurnMetadata, TurnRequest};

pub use traits::{ChatBackend, ChatTransport, TokenStore, TurnStream};
