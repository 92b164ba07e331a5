//! Error types for taskcal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in taskcal operations.
///
/// `SourceRead`, `Config`, `Classification` and `CalendarAuth` abort a run.
/// `EventSubmission` and `Notification` are reported and the run carries on.
#[derive(Error, Debug)]
pub enum TaskCalError {
    #[error("Failed to read tasks from {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Calendar authentication failed: {0}")]
    CalendarAuth(String),

    #[error("Failed to schedule '{task}': {message}")]
    EventSubmission { task: String, message: String },

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("{0}")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskCalError {
    /// Whether this error should stop the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            TaskCalError::EventSubmission { .. } | TaskCalError::Notification(_)
        )
    }
}

/// Result type alias for taskcal operations.
pub type TaskCalResult<T> = Result<T, TaskCalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_and_notification_errors_are_recoverable() {
        let submission = TaskCalError::EventSubmission {
            task: "Clean inbox".into(),
            message: "quota".into(),
        };
        assert!(!submission.is_fatal());
        assert!(!TaskCalError::Notification("smtp down".into()).is_fatal());
    }

    #[test]
    fn source_and_auth_errors_are_fatal() {
        let source = TaskCalError::SourceRead {
            path: PathBuf::from("task.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(source.is_fatal());
        assert!(TaskCalError::CalendarAuth("denied".into()).is_fatal());
        assert!(TaskCalError::Classification("quota".into()).is_fatal());
    }

    #[test]
    fn source_read_message_names_the_path() {
        let err = TaskCalError::SourceRead {
            path: PathBuf::from("missing.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("missing.txt"));
    }
}
