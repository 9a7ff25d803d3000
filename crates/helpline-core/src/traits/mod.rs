// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions at the seams of the chat client.
//!
//! The conversation store talks to the outside world only through these
//! traits, so the WebSocket transport, the REST client, and token
//! persistence can each be swapped for an in-memory double in tests.

pub mod backend;
pub mod token_store;
pub mod transport;

pub use backend::ChatBackend;
pub use token_store::TokenStore;
pub use transport::{ChatTransport, TurnStream};
