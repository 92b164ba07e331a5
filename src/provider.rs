//! Calendar provider subprocess client.
//!
//! Providers are separate executables named `taskcal-provider-{name}` that
//! speak the JSON protocol from `taskcal_core::protocol` over stdin/stdout.
//! Each call spawns the provider, writes one request line and reads one
//! response. Providers own their credentials.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use taskcal_core::protocol::{
    Command, CreateEvent, CreatedEvent, EnsureAuthenticated, EventRequest, ProviderCommand,
    Request, Response,
};
use taskcal_core::{TaskCalError, TaskCalResult};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);
/// Auth may open a browser and wait for the user.
const AUTH_TIMEOUT: Duration = Duration::from_secs(300);

/// Where scheduled events are written.
#[async_trait]
pub trait CalendarSink: Send + Sync {
    /// Make sure a usable credential exists. Returns the account identifier.
    async fn ensure_authenticated(&self) -> TaskCalResult<String>;

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &EventRequest,
    ) -> TaskCalResult<CreatedEvent>;
}

#[derive(Clone, Debug)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    fn binary_name(&self) -> String {
        format!("taskcal-provider-{}", self.0)
    }

    fn binary_path(&self) -> TaskCalResult<PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| {
            TaskCalError::ProviderNotInstalled(format!(
                "Provider '{}' not found. Install it with:\n  cargo install {}",
                self.0, binary_name
            ))
        })
    }

    /// Call a typed provider command with the standard timeout.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> TaskCalResult<C::Response> {
        self.call_with_timeout(cmd, PROVIDER_TIMEOUT).await
    }

    async fn call_with_timeout<C: ProviderCommand>(
        &self,
        cmd: C,
        limit: Duration,
    ) -> TaskCalResult<C::Response> {
        timeout(limit, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| TaskCalError::ProviderTimeout(limit.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> TaskCalResult<R> {
        let params =
            serde_json::to_value(params).map_err(|e| TaskCalError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json =
            serde_json::to_string(&request).map_err(|e| TaskCalError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        tracing::debug!(provider = %self.0, ?command, "Calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TaskCalError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TaskCalError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(TaskCalError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Decode a provider's stdout into the command's response type.
fn parse_response<R: DeserializeOwned>(stdout: &str) -> TaskCalResult<R> {
    let line = stdout.trim();
    if line.is_empty() {
        return Err(TaskCalError::Provider("Provider returned no response".into()));
    }

    let response: Response<R> = serde_json::from_str(line)
        .map_err(|e| TaskCalError::Provider(format!("Failed to parse response: {}", e)))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(TaskCalError::Provider(error)),
    }
}

#[async_trait]
impl CalendarSink for Provider {
    async fn ensure_authenticated(&self) -> TaskCalResult<String> {
        self.call_with_timeout(EnsureAuthenticated {}, AUTH_TIMEOUT)
            .await
            .map_err(|e| TaskCalError::CalendarAuth(e.to_string()))
    }

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &EventRequest,
    ) -> TaskCalResult<CreatedEvent> {
        self.call(CreateEvent {
            calendar_id: calendar_id.to_string(),
            event: event.clone(),
        })
        .await
        .map_err(|e| TaskCalError::EventSubmission {
            task: event.summary.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_name_is_prefixed() {
        assert_eq!(
            Provider::from_name("google").binary_name(),
            "taskcal-provider-google"
        );
    }

    #[test]
    fn parses_success_response() {
        let account: String =
            parse_response("{\"status\":\"success\",\"data\":\"me@example.com\"}\n").unwrap();
        assert_eq!(account, "me@example.com");
    }

    #[test]
    fn error_response_becomes_provider_error() {
        let err = parse_response::<String>(r#"{"status":"error","error":"token revoked"}"#)
            .unwrap_err();
        assert!(matches!(err, TaskCalError::Provider(ref m) if m == "token revoked"));
    }

    #[test]
    fn empty_output_is_an_error() {
        assert!(parse_response::<String>("  \n").is_err());
    }

    #[tokio::test]
    async fn missing_binary_fails_auth_as_calendar_auth_error() {
        let provider = Provider::from_name("definitely-not-installed-xyz");
        let err = provider.ensure_authenticated().await.unwrap_err();

        assert!(matches!(err, TaskCalError::CalendarAuth(ref m) if m.contains("cargo install")));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn missing_binary_fails_submission_as_non_fatal() {
        let provider = Provider::from_name("definitely-not-installed-xyz");
        let event = EventRequest {
            summary: "Email client".into(),
            start: taskcal_core::protocol::EventDateTime {
                date_time: "2024-01-01T10:00:00+05:30".into(),
                time_zone: "Asia/Kolkata".into(),
            },
            end: taskcal_core::protocol::EventDateTime {
                date_time: "2024-01-01T11:00:00+05:30".into(),
                time_zone: "Asia/Kolkata".into(),
            },
        };

        let err = provider.create_event("primary", &event).await.unwrap_err();
        assert!(matches!(err, TaskCalError::EventSubmission { ref task, .. } if task == "Email client"));
        assert!(!err.is_fatal());
    }
}
