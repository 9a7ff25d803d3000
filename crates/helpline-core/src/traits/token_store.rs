// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable storage for the bearer token.

use crate::error::HelplineError;

/// Persists the bearer token across process restarts under a fixed key.
pub trait TokenStore: Send + Sync {
    /// Returns the stored token, if any.
    fn load(&self) -> Result<Option<String>, HelplineError>;

    /// Replaces the stored token.
    fn save(&self, token: &str) -> Result<(), HelplineError>;

    /// Removes the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), HelplineError>;
}
