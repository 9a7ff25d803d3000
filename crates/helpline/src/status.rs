// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `helpline status` command implementation.
//!
//! Queries the backend health endpoint. If `--json` is passed, outputs
//! structured JSON for scripting.

use std::io::IsTerminal;

use colored::Colorize;
use helpline_api::ApiClient;
use helpline_config::HelplineConfig;
use helpline_core::HelplineError;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub reachable: bool,
    pub backend: String,
    pub status: Option<String>,
    pub app: Option<String>,
    pub llm_provider: Option<String>,
    pub redis: Option<String>,
    pub error: Option<String>,
}

/// Run the `helpline status` command. An unreachable backend is reported, not returned as an error.
pub async fn run_status(config: &HelplineConfig, json: bool) -> Result<(), HelplineError> {
    let client = ApiClient::from_config(config)?;

    let response = match client.health().await {
        Ok(report) => StatusResponse {
            reachable: true,
            backend: config.server.base_url.clone(),
            status: Some(report.status),
            app: report.app,
            llm_provider: report.llm_provider,
            redis: report.redis,
            error: None,
        },
        Err(e) => StatusResponse {
            reachable: false,
            backend: config.server.base_url.clone(),
            status: None,
            app: None,
            llm_provider: None,
            redis: None,
            error: Some(e.to_string()),
        },
    };

    if json {
        let rendered = serde_json::to_string_pretty(&response)
            .map_err(|e| HelplineError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }
    print_human(&response);
    Ok(())
}

fn print_human(response: &StatusResponse) {
    if response.reachable {
        println!(
            "{} {}",
            "backend:".bold(),
            response.status.as_deref().unwrap_or("unknown").green()
        );
    } else {
        println!("{} {}", "backend:".bold(), "unreachable".red());
    }
    println!("  url:   {}", response.backend);
    if let Some(app) = &response.app {
        println!("  app:   {app}");
    }
    if let Some(provider) = &response.llm_provider {
        println!("  llm:   {provider}");
    }
    if let Some(redis) = &response.redis {
        println!("  redis: {redis}");
    }
    if let Some(error) = &response.error {
        println!("  {}", error.dimmed());
    }
}
