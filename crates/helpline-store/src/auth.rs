// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed-in identity and bearer token.

use std::fmt;
use std::sync::Arc;

use helpline_core::types::UserProfile;
use helpline_core::{HelplineError, TokenStore};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

/// Current user and bearer token.
///
/// The token survives restarts through a [`TokenStore`]; the profile does
/// not and is re-fetched after start-up.
pub struct AuthContext {
    user: Option<UserProfile>,
    token: Option<SecretString>,
    tokens: Arc<dyn TokenStore>,
}

impl AuthContext {
    /// Creates a context, restoring any token left by a previous run.
    ///
    /// An unreadable store is logged and treated as signed out.
    pub fn restore(tokens: Arc<dyn TokenStore>) -> Self {
        let token = match tokens.load() {
            Ok(token) => token.map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "could not restore saved token");
                None
            }
        };
        Self {
            user: None,
            token,
            tokens,
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret())
    }

    /// Holds a token. The profile may still be unknown.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Persists `token` and adopts the identity. Nothing changes if persisting fails.
    pub(crate) fn sign_in(&mut self, token: String, user: UserProfile) -> Result<(), HelplineError> {
        self.tokens.save(&token)?;
        self.token = Some(SecretString::from(token));
        self.user = Some(user);
        Ok(())
    }

    pub(crate) fn set_user(&mut self, user: UserProfile) {
        self.user = Some(user);
    }

    /// Forgets the identity in memory and in durable storage.
    pub(crate) fn sign_out(&mut self) {
        self.user = None;
        self.token = None;
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "could not remove saved token");
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
