// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/admin/*` routes (admin role required by the backend).

use helpline_core::HelplineError;

use crate::client::ApiClient;
use crate::types::{AdminStats, ConversationSummary, Page, UserSummary};

impl ApiClient {
    /// `GET /admin/stats`.
    pub async fn admin_stats(&self, token: &str) -> Result<AdminStats, HelplineError> {
        self.call(self.get(self.route(&["admin", "stats"]), Some(token)))
            .await
    }

    /// `GET /admin/conversations`.
    pub async fn admin_conversations(
        &self,
        token: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<ConversationSummary>, HelplineError> {
        let url = self.paged(&["admin", "conversations"], page, page_size);
        self.call(self.get(url, Some(token))).await
    }

    /// `GET /admin/users`.
    pub async fn admin_users(
        &self,
        token: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<UserSummary>, HelplineError> {
        let url = self.paged(&["admin", "users"], page, page_size);
        self.call(self.get(url, Some(token))).await
    }

    fn paged(&self, segments: &[&str], page: u32, page_size: u32) -> url::Url {
        let mut url = self.route(segments);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &page_size.to_string());
        url
    }
}
