// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `helpline login`, `logout` and `whoami`.

use colored::Colorize;
use helpline_core::types::UserProfile;
use helpline_core::HelplineError;
use helpline_store::ConversationStore;
use secrecy::{ExposeSecret, SecretString};

/// Prompts for the password without echo and signs in.
pub async fn login(store: &mut ConversationStore, username: &str) -> Result<(), HelplineError> {
    let password = rpassword::prompt_password(format!("password for {username}: "))
        .map(SecretString::from)
        .map_err(|e| HelplineError::Internal(format!("failed to read password: {e}")))?;

    let user = store.login(username, password.expose_secret()).await?;
    println!("{} {}", "signed in as".green(), describe(&user).bold());
    Ok(())
}

pub fn logout(store: &mut ConversationStore) {
    let was_signed_in = store.is_authenticated();
    store.logout();
    if was_signed_in {
        println!("{}", "signed out".green());
    } else {
        println!("{}", "not signed in".dimmed());
    }
}

/// Verifies the saved token with the backend. An invalid token is discarded.
pub async fn whoami(store: &mut ConversationStore) -> Result<(), HelplineError> {
    if !store.is_authenticated() {
        println!("{}", "not signed in".dimmed());
        return Ok(());
    }

    let user = store.fetch_identity().await?;
    println!("{}", describe(&user).bold());
    if let Some(email) = &user.email {
        println!("  email: {email}");
    }
    if let Some(role) = &user.role {
        println!("  role:  {role}");
    }
    Ok(())
}

/// `username (Full Name)` or just `username`.
pub fn describe(user: &UserProfile) -> String {
    match user.full_name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => format!("{} ({name})", user.username),
        None => user.username.clone(),
    }
}
