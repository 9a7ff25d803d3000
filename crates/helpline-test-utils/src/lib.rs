// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Helpline integration tests.
//!
//! Provides mock adapters for fast, deterministic tests without a backend.
//!
//! # Components
//!
//! - [`MockTransport`] - Streaming transport that plays scripted turns
//! - [`MockBackend`] - REST backend with queued responses and call capture

pub mod mock_backend;
pub mod mock_transport;

pub use mock_backend::{BackendCall, MockBackend};
pub use mock_transport::{MockTransport, TurnScript};
