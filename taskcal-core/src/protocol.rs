//! Provider protocol types.
//!
//! Defines the JSON protocol used between the taskcal CLI and calendar
//! provider binaries over stdin/stdout: one request line in, one response
//! line out.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::schedule::ScheduledEvent;

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    EnsureAuthenticated,
    CreateEvent,
}

/// Request sent from CLI to provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from provider to CLI.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data })
            .unwrap_or_else(|e| Response::<()>::error(&format!("Failed to serialize response: {}", e)))
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::json!({ "status": "error", "error": msg }).to_string()
    }
}

/// Start (or end) of an event as sent to the calendar API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDateTime {
    /// RFC 3339 timestamp including the zone's UTC offset
    pub date_time: String,
    /// IANA zone name, e.g. "Asia/Kolkata"
    pub time_zone: String,
}

/// Body of a create-event call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRequest {
    pub summary: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
}

impl From<&ScheduledEvent> for EventRequest {
    fn from(event: &ScheduledEvent) -> Self {
        let time_zone = event.timezone.name().to_string();

        EventRequest {
            summary: event.task.to_string(),
            start: EventDateTime {
                date_time: event.start.to_rfc3339(),
                time_zone: time_zone.clone(),
            },
            end: EventDateTime {
                date_time: event.end.to_rfc3339(),
                time_zone,
            },
        }
    }
}

/// Confirmation returned by the provider for a created event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    pub summary: String,
    pub start: EventDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

/// Make sure the provider holds a usable credential, running the interactive
/// bootstrap or a token refresh if needed.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EnsureAuthenticated {}

impl ProviderCommand for EnsureAuthenticated {
    type Response = String; // Account identifier (e.g., email)
    fn command() -> Command {
        Command::EnsureAuthenticated
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    pub calendar_id: String,
    pub event: EventRequest,
}

impl ProviderCommand for CreateEvent {
    type Response = CreatedEvent;
    fn command() -> Command {
        Command::CreateEvent
    }
}
