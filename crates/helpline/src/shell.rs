// SPDX-FileCopyrightText: 2026 Helpline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `helpline chat` command implementation.
//!
//! Launches an interactive REPL with colored prompt, token-by-token reply
//! output, and readline history. Ctrl+C while a reply streams cancels that
//! turn; Ctrl+C at the prompt exits.

use std::io::Write;

use colored::Colorize;
use helpline_core::types::{Role, TurnMetadata};
use helpline_core::HelplineError;
use helpline_store::{ConversationStore, TurnEvent};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use crate::account::describe;

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Help,
    Clear,
    History,
    Blocking(&'a str),
    Feedback(bool),
    Message(&'a str),
    Unknown(&'a str),
    Empty,
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Message(trimmed);
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(n, r)| (n, r.trim()))
        .unwrap_or((command, ""));

    match name {
        "quit" | "exit" => Input::Quit,
        "help" => Input::Help,
        "clear" => Input::Clear,
        "history" => Input::History,
        "blocking" => Input::Blocking(rest),
        "feedback" => match rest {
            "y" | "yes" | "+" => Input::Feedback(true),
            "n" | "no" | "-" => Input::Feedback(false),
            _ => Input::Unknown(trimmed),
        },
        _ => Input::Unknown(trimmed),
    }
}

/// Runs the `helpline chat` interactive REPL.
pub async fn run_chat(mut store: ConversationStore, blocking: bool) -> Result<(), HelplineError> {
    if store.is_authenticated() {
        match store.fetch_identity().await {
            Ok(user) => println!("{} {}", "signed in as".dimmed(), describe(&user).bold()),
            Err(e) => {
                warn!(error = %e, "saved token rejected");
                println!("{}", "saved login expired, continuing as guest".yellow());
            }
        }
    }

    let mut rl = DefaultEditor::new()
        .map_err(|e| HelplineError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "helpline chat".bold().green());
    println!("Type {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    let prompt = format!("{}> ", "you".green());
    loop {
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        };

        let input = parse_input(&line);
        if !matches!(input, Input::Empty) {
            let _ = rl.add_history_entry(line.as_str());
        }

        match input {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Clear => {
                store.clear_conversation().await;
                println!("{}", "conversation cleared".dimmed());
            }
            Input::History => show_history(&mut store).await,
            Input::Feedback(helpful) => send_feedback(&store, helpful).await,
            Input::Blocking(text) => ask_blocking(&mut store, text).await,
            Input::Message(text) if blocking => ask_blocking(&mut store, text).await,
            Input::Message(text) => stream_reply(&mut store, text).await,
            Input::Unknown(command) => {
                println!("{} {command} (try /help)", "unknown command:".yellow());
            }
        }
    }

    println!("{}", "goodbye".dimmed());
    Ok(())
}

const COMMANDS: &[(&str, &str)] = &[
    ("/clear", "clear the conversation and start over"),
    ("/history", "reload this conversation from the server"),
    ("/blocking <text>", "ask without streaming"),
    (
        "/feedback <y|n>",
        "rate the last reply (best effort: the server only accepts ids it issued, \
         and it does not send message ids yet, so ratings may be dropped)",
    ),
    ("/help", "show this list"),
    ("/quit", "exit"),
];

fn print_help() {
    for (command, summary) in COMMANDS {
        println!("  {:<18} {summary}", command.yellow());
    }
}

/// Streams one reply to stdout. Ctrl+C cancels the turn.
async fn stream_reply(store: &mut ConversationStore, text: &str) {
    let Some(handle) = store.send_streaming(text) else {
        debug!("message rejected by store");
        return;
    };

    print!("{}: ", "assistant".cyan());
    let _ = std::io::stdout().flush();

    let mut interrupt = std::pin::pin!(tokio::signal::ctrl_c());
    loop {
        let event = tokio::select! {
            event = store.next_event() => event,
            _ = &mut interrupt, if !handle.is_cancelled() => {
                handle.cancel();
                continue;
            }
        };

        match event {
            Some(TurnEvent::Token(fragment)) => {
                print!("{fragment}");
                let _ = std::io::stdout().flush();
            }
            Some(TurnEvent::Done(meta)) => {
                println!();
                print_metadata(&meta);
                break;
            }
            Some(TurnEvent::Failed(detail)) => {
                println!();
                eprintln!("{}: {detail}", "error".red());
                break;
            }
            Some(TurnEvent::Cancelled) => {
                println!(" {}", "(cancelled)".yellow());
                break;
            }
            None => break,
        }
    }
}

async fn ask_blocking(store: &mut ConversationStore, text: &str) {
    if text.trim().is_empty() {
        println!("{}", "nothing to send".dimmed());
        return;
    }
    match store.send_blocking(text).await {
        Ok(reply) => {
            println!("{}: {}", "assistant".cyan(), reply.reply);
            print_metadata(&TurnMetadata {
                session_id: Some(reply.session_id),
                intent: reply.intent,
                intent_confidence: reply.intent_confidence,
                sources: reply.rag_sources,
                latency_ms: reply.latency_ms,
            });
        }
        Err(e) if e.is_unauthorized() => {
            eprintln!("{}: {e}", "error".red());
            println!("{}", "signed out, run `helpline login` to sign in again".yellow());
        }
        Err(e) => eprintln!("{}: {e}", "error".red()),
    }
}

async fn show_history(store: &mut ConversationStore) {
    let Some(session_id) = store.session_id().cloned() else {
        println!("{}", "no conversation yet".dimmed());
        return;
    };

    if let Err(e) = store.load_history(&session_id).await {
        eprintln!("{}: {e}", "error".red());
        return;
    }
    for message in store.messages() {
        let who = match message.role {
            Role::User => "you".green(),
            Role::Assistant => "assistant".cyan(),
        };
        println!("{who}: {}", message.content);
    }
}

async fn send_feedback(store: &ConversationStore, helpful: bool) {
    let (Some(session_id), Some(reply)) = (store.session_id(), store.state().last_assistant()) else {
        println!("{}", "no reply to rate yet".dimmed());
        return;
    };
    store
        .submit_feedback(session_id.as_str(), reply.id.as_str(), helpful)
        .await;
    println!("{}", "feedback sent (best effort, see /help)".dimmed());
}

fn print_metadata(meta: &TurnMetadata) {
    let mut parts = Vec::new();
    if let Some(intent) = &meta.intent {
        parts.push(format!("intent: {intent}"));
    }
    if !meta.sources.is_empty() {
        parts.push(format!("sources: {}", meta.sources.join(", ")));
    }
    if let Some(latency) = meta.latency_ms {
        parts.push(format!("{latency} ms"));
    }
    if !parts.is_empty() {
        println!("{}", format!("[{}]", parts.join(" | ")).dimmed());
    }
}
