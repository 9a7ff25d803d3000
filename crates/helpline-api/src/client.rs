// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Helpline backend REST API.
//!
//! Provides [`ApiClient`], which owns the connection pool, builds route URLs
//! under the configured prefix, attaches bearer tokens, and maps error
//! envelopes onto [`HelplineError`]. Calls are never retried.

use std::time::Duration;

use helpline_config::HelplineConfig;
use helpline_core::HelplineError;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::types::{ErrorEnvelope, HealthReport};

/// REST client for the customer-service backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    api_prefix: Vec<String>,
    timeout: Duration,
}

impl ApiClient {
    /// Creates a client for `base_url` with routes under `api_prefix`.
    pub fn new(base_url: &str, api_prefix: &str, timeout: Duration) -> Result<Self, HelplineError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| HelplineError::Config(format!("invalid base URL `{base_url}`: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(HelplineError::Config(format!(
                "base URL `{base_url}` cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HelplineError::Http {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url,
            api_prefix: split_path(api_prefix),
            timeout,
        })
    }

    /// Creates a client from the `[server]` section of the configuration.
    pub fn from_config(config: &HelplineConfig) -> Result<Self, HelplineError> {
        Self::new(
            &config.server.base_url,
            &config.server.api_prefix,
            config.server.request_timeout(),
        )
    }

    /// The backend origin this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `<base>/<api_prefix>/<segments...>`, percent-encoding each segment.
    pub(crate) fn route(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(self.api_prefix.iter().map(String::as_str));
            path.extend(segments);
        }
        url
    }

    pub(crate) fn get(&self, url: Url, token: Option<&str>) -> RequestBuilder {
        authed(self.client.get(url), token)
    }

    pub(crate) fn post(&self, url: Url, token: Option<&str>) -> RequestBuilder {
        authed(self.client.post(url), token)
    }

    pub(crate) fn delete(&self, url: Url, token: Option<&str>) -> RequestBuilder {
        authed(self.client.delete(url), token)
    }

    /// Sends a request and decodes a JSON success body into `T`.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, HelplineError> {
        let response = self.send(request).await?;
        let body = response.text().await.map_err(|e| HelplineError::Http {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&body).map_err(|e| HelplineError::Decode {
            message: format!("failed to parse response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Sends a request whose success body is irrelevant.
    pub(crate) async fn call_unit(&self, request: RequestBuilder) -> Result<(), HelplineError> {
        self.send(request).await.map(|_| ())
    }

    /// Sends a request and turns non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response, HelplineError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HelplineError::Timeout {
                    duration: self.timeout,
                }
            } else {
                HelplineError::Http {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                }
            }
        })?;

        let status = response.status();
        debug!(status = %status, url = %response.url(), "response received");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }

    /// `GET /health` at the backend origin (outside the API prefix).
    pub async fn health(&self) -> Result<HealthReport, HelplineError> {
        let mut url = self.base_url.clone();
        url.set_path("/health");
        self.call(self.get(url, None)).await
    }
}

fn authed(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

fn split_path(prefix: &str) -> Vec<String> {
    prefix
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Maps a non-success response onto the error taxonomy.
///
/// 401 always becomes [`HelplineError::Unauthorized`] so callers can force a
/// logout; everything else keeps the envelope fields for presentation.
pub(crate) fn error_from_body(status: StatusCode, body: &str) -> HelplineError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).unwrap_or_default();
    let detail = envelope.message().unwrap_or_else(|| {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED {
        return HelplineError::Unauthorized { detail };
    }

    HelplineError::Api {
        status: status.as_u16(),
        detail,
        code: envelope.code,
        request_id: envelope.request_id,
    }
}
