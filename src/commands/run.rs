use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use taskcal_core::prompt::build_prompt;
use taskcal_core::protocol::{CreatedEvent, EventRequest};
use taskcal_core::{ClassifiedTaskSet, SchedulePolicy, TaskCalError, TaskCalResult, parse_reply};

use crate::classifier::{Classifier, GeminiClassifier};
use crate::config::AppConfig;
use crate::notifier::{
    CONFIRMATION_SUBJECT, Notifier, SmtpNotifier, confirmation_body, nothing_scheduled_body,
};
use crate::provider::{CalendarSink, Provider};
use crate::render::{self, pluralize};
use crate::source;

/// What to do with the confirmation email at the end of a run.
pub enum Notify<'a> {
    Send {
        notifier: &'a dyn Notifier,
        recipient: &'a str,
    },
    Skip(&'static str),
}

/// One end-to-end run against a set of collaborators.
pub struct Pipeline<'a> {
    pub classifier: &'a dyn Classifier,
    pub sink: &'a dyn CalendarSink,
    pub notify: Notify<'a>,
    pub policy: &'a SchedulePolicy,
    pub calendar_id: &'a str,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub created: Vec<CreatedEvent>,
    pub failures: Vec<TaskCalError>,
    pub notified: bool,
}

/// Run the prompt through the classifier with a spinner on screen.
pub(crate) async fn classify(classifier: &dyn Classifier, raw_tasks: &str) -> TaskCalResult<String> {
    let spinner = render::create_spinner(format!("Classifying tasks with {}", classifier.name()));
    let result = classifier.classify(&build_prompt(raw_tasks)).await;
    spinner.finish_and_clear();
    result
}

impl Pipeline<'_> {
    /// Classify, authenticate, schedule, submit and notify.
    ///
    /// Errors returned here are fatal. Failed submissions and a failed
    /// email are recorded in the report instead. The reply is emailed even
    /// when it yields no tasks.
    pub async fn execute(&self, raw_tasks: &str, now: DateTime<Utc>) -> TaskCalResult<RunReport> {
        let reply = classify(self.classifier, raw_tasks).await?;

        println!("{}\n", "Categorized tasks:".bold());
        println!("{}\n", reply.trim_end());

        let tasks = parse_reply(&reply);
        let mut report = RunReport::default();

        let body = if tasks.is_empty() {
            println!("No tasks to schedule.");
            nothing_scheduled_body(&reply)
        } else {
            self.submit(&tasks, now, &mut report).await?;
            confirmation_body(&reply)
        };

        self.send_confirmation(&body, &mut report).await;

        Ok(report)
    }

    async fn submit(
        &self,
        tasks: &ClassifiedTaskSet,
        now: DateTime<Utc>,
        report: &mut RunReport,
    ) -> TaskCalResult<()> {
        let account = self.sink.ensure_authenticated().await?;
        println!("Authenticated as: {}\n", account);

        // Every date is fixed before the first submission
        let events = self.policy.schedule(tasks, now);

        println!(
            "Scheduling {} {}...",
            events.len(),
            pluralize("task", events.len())
        );

        for event in &events {
            let request = EventRequest::from(event);

            match self.sink.create_event(self.calendar_id, &request).await {
                Ok(created) => {
                    println!(
                        "   {} {} {}",
                        "+".green(),
                        created.summary,
                        created.start.date_time.dimmed()
                    );
                    report.created.push(created);
                }
                Err(e) => {
                    tracing::warn!(task = %event.task, error = %e, "Event submission failed");
                    println!("   {} {}", "!".red(), e.to_string().red());
                    report.failures.push(e);
                }
            }
        }

        println!(
            "\nScheduled: {} created, {} failed",
            report.created.len(),
            report.failures.len()
        );

        Ok(())
    }

    async fn send_confirmation(&self, body: &str, report: &mut RunReport) {
        match &self.notify {
            Notify::Send {
                notifier,
                recipient,
            } => match notifier.send(recipient, CONFIRMATION_SUBJECT, body).await {
                Ok(()) => {
                    println!("Confirmation email sent to {}", recipient);
                    report.notified = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Confirmation email failed");
                    println!("{}", e.to_string().red());
                }
            },
            Notify::Skip(reason) => println!("{}", format!("{}. Skipping email.", reason).dimmed()),
        }
    }
}

pub async fn run(config: &AppConfig, tasks: Option<PathBuf>, no_email: bool) -> Result<()> {
    let path = tasks.unwrap_or_else(|| config.tasks_file.clone());
    let raw_tasks = source::read_tasks(&path)?;

    let classifier = GeminiClassifier::new(&config.gemini, config.gemini_api_key()?);
    let provider = Provider::from_name(&config.calendar.provider);
    let smtp = config.email.as_ref().map(SmtpNotifier::new);

    let notify = match (&smtp, &config.email) {
        _ if no_email => Notify::Skip("Email disabled with --no-email"),
        (Some(notifier), Some(email)) => Notify::Send {
            notifier,
            recipient: &email.recipient,
        },
        _ => Notify::Skip("Email credentials not configured"),
    };

    let pipeline = Pipeline {
        classifier: &classifier,
        sink: &provider,
        notify,
        policy: &config.schedule,
        calendar_id: &config.calendar.calendar_id,
    };

    let report = pipeline.execute(&raw_tasks, Utc::now()).await?;

    tracing::debug!(
        created = report.created.len(),
        failed = report.failures.len(),
        notified = report.notified,
        "Run complete"
    );

    Ok(())
}
