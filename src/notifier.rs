//! Confirmation email after a run.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use taskcal_core::{TaskCalError, TaskCalResult};

use crate::config::EmailConfig;

pub const CONFIRMATION_SUBJECT: &str = "Task Scheduling Complete";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> TaskCalResult<()>;
}

/// Body of the confirmation email, quoting the classifier reply.
pub fn confirmation_body(reply: &str) -> String {
    format!(
        "Hello,\n\n\
        Your tasks have been successfully scheduled on your Google Calendar.\n\n\
        Here is the prioritized list:\n\n\
        {}\n\n\
        Best regards,\n\
        Task Scheduler",
        reply
    )
}

/// Body sent when the reply yielded no tasks; the reply is still quoted.
pub fn nothing_scheduled_body(reply: &str) -> String {
    format!(
        "Hello,\n\n\
        No tasks could be scheduled from the model's reply, so your calendar was not changed.\n\n\
        Here is the reply:\n\n\
        {}\n\n\
        Best regards,\n\
        Task Scheduler",
        reply
    )
}

/// Sends mail through an SMTP relay over implicit TLS.
pub struct SmtpNotifier {
    sender: String,
    password: String,
    host: String,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            sender: config.address.clone(),
            password: config.password.clone(),
            host: config.smtp_host.clone(),
        }
    }

    fn build_message(&self, recipient: &str, subject: &str, body: &str) -> TaskCalResult<Message> {
        let from: Mailbox = self
            .sender
            .parse()
            .map_err(|e| TaskCalError::Notification(format!("Invalid sender address: {}", e)))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| TaskCalError::Notification(format!("Invalid recipient address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| TaskCalError::Notification(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> TaskCalResult<()> {
        let message = self.build_message(recipient, subject, body)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(|e| TaskCalError::Notification(e.to_string()))?
            .credentials(Credentials::new(self.sender.clone(), self.password.clone()))
            .build();

        tracing::debug!(host = %self.host, %recipient, "Sending confirmation email");

        mailer
            .send(message)
            .await
            .map_err(|e| TaskCalError::Notification(e.to_string()))?;

        Ok(())
    }
}
