// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST client for the Helpline customer-service backend.
//!
//! Thin pass-through over the backend routes: authentication, blocking chat,
//! session history and feedback, knowledge-base management, and admin
//! listings. Authenticated calls carry `Authorization: Bearer <token>`.

mod admin;
mod auth;
mod backend;
mod chat;
pub mod client;
mod knowledge;
pub mod types;

pub use client::ApiClient;
pub use types::{DocumentQuery, DocumentUpload, ErrorEnvelope, RegisterRequest};
