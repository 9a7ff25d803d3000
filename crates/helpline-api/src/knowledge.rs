// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `/knowledge/*` routes for document management.

use helpline_core::HelplineError;
use reqwest::multipart::{Form, Part};

use crate::client::ApiClient;
use crate::types::{Ack, DocumentPage, DocumentQuery, DocumentUpload, SearchResults, UploadAccepted};

impl ApiClient {
    /// `GET /knowledge/list`.
    pub async fn list_documents(
        &self,
        token: &str,
        query: &DocumentQuery,
    ) -> Result<DocumentPage, HelplineError> {
        let mut url = self.route(&["knowledge", "list"]);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &query.page.to_string());
            pairs.append_pair("page_size", &query.page_size.to_string());
            if let Some(category) = &query.category {
                pairs.append_pair("category", category);
            }
            if let Some(status) = &query.status {
                pairs.append_pair("status", status);
            }
        }
        self.call(self.get(url, Some(token))).await
    }

    /// `DELETE /knowledge/{doc_id}`.
    pub async fn delete_document(&self, token: &str, doc_id: &str) -> Result<Ack, HelplineError> {
        let url = self.route(&["knowledge", doc_id]);
        self.call(self.delete(url, Some(token))).await
    }

    /// `POST /knowledge/search`: semantic search over the knowledge base.
    pub async fn search_knowledge(
        &self,
        token: &str,
        query: &str,
        top_k: u32,
    ) -> Result<SearchResults, HelplineError> {
        let mut url = self.route(&["knowledge", "search"]);
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("top_k", &top_k.to_string());
        self.call(self.post(url, Some(token))).await
    }

    /// `POST /knowledge/upload`: multipart upload, processed asynchronously by the backend.
    pub async fn upload_document(
        &self,
        token: &str,
        upload: DocumentUpload,
    ) -> Result<UploadAccepted, HelplineError> {
        let tags = serde_json::to_string(&upload.tags).map_err(|e| HelplineError::Internal(
            format!("failed to encode tags: {e}"),
        ))?;
        let mut form = Form::new()
            .part("file", Part::bytes(upload.bytes).file_name(upload.file_name))
            .text("title", upload.title)
            .text("tags", tags);
        if let Some(category) = upload.category {
            form = form.text("category", category);
        }

        let request = self
            .post(self.route(&["knowledge", "upload"]), Some(token))
            .multipart(form);
        self.call(request).await
    }
}
