use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use taskcal_core::{ClassifiedTaskSet, SchedulePolicy, ScheduledEvent, TaskCalResult, parse_reply};

use crate::classifier::{Classifier, GeminiClassifier};
use crate::commands::run::classify;
use crate::config::AppConfig;
use crate::render::{render_schedule, render_task_set};
use crate::source;

/// Classify and schedule without touching the calendar.
pub async fn build_plan(
    classifier: &dyn Classifier,
    policy: &SchedulePolicy,
    raw_tasks: &str,
    now: DateTime<Utc>,
) -> TaskCalResult<(ClassifiedTaskSet, Vec<ScheduledEvent>)> {
    let reply = classify(classifier, raw_tasks).await?;
    let tasks = parse_reply(&reply);
    let events = policy.schedule(&tasks, now);
    Ok((tasks, events))
}

pub async fn run(config: &AppConfig, tasks: Option<PathBuf>) -> Result<()> {
    let path = tasks.unwrap_or_else(|| config.tasks_file.clone());
    let raw_tasks = source::read_tasks(&path)?;
    let classifier = GeminiClassifier::new(&config.gemini, config.gemini_api_key()?);

    let (tasks, events) = build_plan(&classifier, &config.schedule, &raw_tasks, Utc::now()).await?;

    if events.is_empty() {
        println!("No tasks to schedule.");
        return Ok(());
    }

    println!("{}\n", render_task_set(&tasks));
    println!("{} ({})", "Planned events".bold(), config.schedule.timezone());
    println!("{}", render_schedule(&events));
    println!("\nRun `taskcal run` to add them to your calendar.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fakes::FakeClassifier;
    use chrono::TimeZone;
    use taskcal_core::PriorityTier;

    #[tokio::test]
    async fn plan_schedules_without_a_sink() {
        let classifier =
            FakeClassifier::replying("High Priority:\n- Ship release\nLow Priority:\n- Tidy desk");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let (tasks, events) = build_plan(&classifier, &SchedulePolicy::default(), "x", now)
            .await
            .unwrap();

        assert_eq!(tasks.tasks(PriorityTier::High).len(), 1);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].day_offset, 3);
    }

    #[tokio::test]
    async fn plan_propagates_classifier_failure() {
        let classifier = FakeClassifier::failing();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(
            build_plan(&classifier, &SchedulePolicy::default(), "x", now)
                .await
                .is_err()
        );
    }
}
