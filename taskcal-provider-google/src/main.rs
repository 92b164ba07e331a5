//! taskcal-provider-google - Google Calendar provider for taskcal
//!
//! Implements the taskcal provider protocol: JSON requests on stdin, one
//! JSON response per request on stdout. Anything meant for a human goes to
//! stderr.
//!
//! The provider manages its own credentials and tokens:
//!   ~/.config/taskcal/providers/google/app_config.toml
//!   ~/.config/taskcal/providers/google/session.toml

mod app_config;
mod commands;
mod oauth;
mod session;

use std::io::{self, BufRead, Write};

use serde::Serialize;
use taskcal_core::protocol::{Command, CreateEvent, Request, Response};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        if let Err(e) = writeln!(stdout, "{}", response).and_then(|_| stdout.flush()) {
            eprintln!("Failed to write response: {}", e);
            break;
        }
    }
}

async fn handle_request(request: Request) -> String {
    tracing::debug!(command = ?request.command, "Handling request");

    match request.command {
        Command::EnsureAuthenticated => respond(commands::ensure_authenticated::handle().await),
        Command::CreateEvent => match serde_json::from_value::<CreateEvent>(request.params) {
            Ok(cmd) => respond(commands::create_event::handle(cmd).await),
            Err(e) => Response::error(&format!("Invalid params: {}", e)),
        },
    }
}

fn respond<T: Serialize>(result: anyhow::Result<T>) -> String {
    match result {
        Ok(data) => Response::success(data),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}
