// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/auth/*` routes.

use helpline_core::types::{LoginResponse, UserProfile};
use helpline_core::HelplineError;
use tracing::info;

use crate::client::ApiClient;
use crate::types::{Ack, ChangePasswordRequest, LoginRequest, RegisterRequest, RegisterResponse};

impl ApiClient {
    /// `POST /auth/login`: exchanges credentials for an access token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, HelplineError> {
        let request = self
            .post(self.route(&["auth", "login"]), None)
            .json(&LoginRequest { username, password });
        let response: LoginResponse = self.call(request).await?;
        info!(username = response.user.username.as_str(), "logged in");
        Ok(response)
    }

    /// `POST /auth/register`.
    pub async fn register(&self, body: &RegisterRequest) -> Result<RegisterResponse, HelplineError> {
        let request = self.post(self.route(&["auth", "register"]), None).json(body);
        self.call(request).await
    }

    /// `GET /auth/me`: the profile bound to `token`.
    pub async fn me(&self, token: &str) -> Result<UserProfile, HelplineError> {
        self.call(self.get(self.route(&["auth", "me"]), Some(token)))
            .await
    }

    /// `POST /auth/change-password`.
    pub async fn change_password(
        &self,
        token: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<Ack, HelplineError> {
        let request = self
            .post(self.route(&["auth", "change-password"]), Some(token))
            .json(&ChangePasswordRequest {
                old_password,
                new_password,
            });
        self.call(request).await
    }
}
