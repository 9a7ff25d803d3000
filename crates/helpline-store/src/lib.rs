// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation session store for the Helpline chat client.
//!
//! [`ConversationStore`] is the only mutator of the conversation log and the
//! only caller of the streaming transport. It is constructed explicitly with
//! its transport, REST backend and [`AuthContext`], and owned by whoever
//! drives the UI.

pub mod auth;
pub mod state;
pub mod store;
pub mod token_store;

pub use auth::AuthContext;
pub use state::ConversationState;
pub use store::{Activity, ConversationStore, TurnEvent, TurnHandle};
pub use token_store::{FileTokenStore, MemoryTokenStore};
