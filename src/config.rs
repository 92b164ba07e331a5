//! Application configuration.
//!
//! Built once at startup from, in increasing precedence:
//!   built-in defaults
//!   ~/.config/taskcal/config.toml (optional)
//!   a `.env` file in the working directory (optional, loaded in `main`)
//!   the process environment
//!
//! Keys are the environment variable names; the config file uses the same
//! names in lowercase (`gemini_model`, `taskcal_timezone`, ...).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use taskcal_core::schedule::{DEFAULT_START_HOUR, SchedulePolicy};
use taskcal_core::{TaskCalError, TaskCalResult};

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_PROVIDER: &str = "google";
/// Google's alias for the user's main calendar
const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_TASKS_FILE: &str = "task.txt";

/// Settings exactly as read from the sources, before validation.
#[derive(Debug, Deserialize)]
struct RawSettings {
    gemini_api_key: Option<String>,
    gemini_model: String,
    gemini_base_url: String,

    email_address: Option<String>,
    email_password: Option<String>,
    email_recipient: Option<String>,
    smtp_host: String,

    taskcal_provider: String,
    taskcal_calendar_id: String,
    taskcal_timezone: Option<String>,
    taskcal_start_hour: u32,
    taskcal_tasks_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

/// Sender credentials for the confirmation email.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub address: String,
    pub password: String,
    pub recipient: String,
    pub smtp_host: String,
}

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub provider: String,
    pub calendar_id: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    /// None when sender credentials are missing; the email is then skipped
    pub email: Option<EmailConfig>,
    pub calendar: CalendarConfig,
    pub schedule: SchedulePolicy,
    pub tasks_file: PathBuf,
}

impl AppConfig {
    pub fn config_path() -> TaskCalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TaskCalError::Config("Could not determine config directory".into()))?
            .join("taskcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the user config file and the process environment.
    pub fn load() -> TaskCalResult<Self> {
        let path = Self::config_path()?;
        Self::from_sources(Some(&path), None)
    }

    /// Load from an optional config file and an environment map.
    ///
    /// `env: None` reads the process environment.
    pub fn from_sources(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> TaskCalResult<Self> {
        let mut builder = Config::builder()
            .set_default("gemini_model", DEFAULT_GEMINI_MODEL)
            .and_then(|b| b.set_default("gemini_base_url", DEFAULT_GEMINI_BASE_URL))
            .and_then(|b| b.set_default("smtp_host", DEFAULT_SMTP_HOST))
            .and_then(|b| b.set_default("taskcal_provider", DEFAULT_PROVIDER))
            .and_then(|b| b.set_default("taskcal_calendar_id", DEFAULT_CALENDAR_ID))
            .and_then(|b| b.set_default("taskcal_start_hour", i64::from(DEFAULT_START_HOUR)))
            .and_then(|b| b.set_default("taskcal_tasks_file", DEFAULT_TASKS_FILE))
            .map_err(|e| TaskCalError::Config(e.to_string()))?;

        if let Some(path) = file {
            builder = builder.add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let raw: RawSettings = builder
            .add_source(Environment::default().source(env))
            .build()
            .map_err(|e| TaskCalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| TaskCalError::Config(e.to_string()))?;

        Self::validate(raw)
    }

    fn validate(raw: RawSettings) -> TaskCalResult<Self> {
        let mut schedule = SchedulePolicy::default().with_start_hour(raw.taskcal_start_hour)?;

        if let Some(name) = non_empty(raw.taskcal_timezone) {
            let timezone: Tz = name
                .parse()
                .map_err(|_| TaskCalError::Config(format!("Unknown timezone '{}'", name)))?;
            schedule = schedule.with_timezone(timezone);
        }

        let email = match (non_empty(raw.email_address), non_empty(raw.email_password)) {
            (Some(address), Some(password)) => Some(EmailConfig {
                recipient: non_empty(raw.email_recipient).unwrap_or_else(|| address.clone()),
                address,
                password,
                smtp_host: raw.smtp_host,
            }),
            _ => None,
        };

        Ok(AppConfig {
            gemini: GeminiConfig {
                api_key: non_empty(raw.gemini_api_key),
                model: raw.gemini_model,
                base_url: raw.gemini_base_url,
            },
            email,
            calendar: CalendarConfig {
                provider: raw.taskcal_provider,
                calendar_id: raw.taskcal_calendar_id,
            },
            schedule,
            tasks_file: raw.taskcal_tasks_file,
        })
    }

    /// The classifier key, required for any command that calls the model.
    pub fn gemini_api_key(&self) -> TaskCalResult<&str> {
        self.gemini.api_key.as_deref().ok_or_else(|| {
            TaskCalError::Config(
                "GEMINI_API_KEY is not set.\n\
                Add it to your environment or a .env file:\n\n  \
                GEMINI_API_KEY=your-api-key"
                    .into(),
            )
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
