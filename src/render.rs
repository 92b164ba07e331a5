//! Terminal rendering for schedules and run results.

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use taskcal_core::{ClassifiedTaskSet, PriorityTier, ScheduledEvent};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for PriorityTier {
    fn render(&self) -> String {
        let label = self.to_string();
        match self {
            PriorityTier::High => label.red().bold().to_string(),
            PriorityTier::Medium => label.yellow().bold().to_string(),
            PriorityTier::Low => label.green().bold().to_string(),
        }
    }
}

impl Render for ScheduledEvent {
    fn render(&self) -> String {
        let when = self.start.format("%a %b %-d, %H:%M").to_string();
        format!("{} {}", self.task, format!("({})", when).dimmed())
    }
}

/// The classified set grouped by tier, skipping empty tiers.
pub fn render_task_set(set: &ClassifiedTaskSet) -> String {
    let mut lines = Vec::new();

    for (tier, tasks) in set.iter() {
        if tasks.is_empty() {
            continue;
        }
        lines.push(tier.render());
        lines.extend(tasks.iter().map(|task| format!("   {}", task)));
    }

    lines.join("\n")
}

pub fn render_schedule(events: &[ScheduledEvent]) -> String {
    events
        .iter()
        .map(|event| format!("   {} {}", "+".green(), event.render()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/", ""])
        .template("{msg} {spinner}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use taskcal_core::{SchedulePolicy, parse_reply};

    #[test]
    fn task_set_skips_empty_tiers() {
        let set = parse_reply("High Priority:\n- Ship release\nLow Priority:\n- Tidy desk");
        let out = render_task_set(&set);

        assert!(out.contains("Ship release"));
        assert!(out.contains("Tidy desk"));
        assert!(!out.contains("Medium"));
    }

    #[test]
    fn schedule_lists_events_in_order_with_local_time() {
        let set = parse_reply("High Priority:\n- A\n- B");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let events = SchedulePolicy::default().schedule(&set, now);

        let out = render_schedule(&events);
        let a = out.find("A").unwrap();
        let b = out.find("B").unwrap();

        assert!(a < b);
        assert!(out.contains("Mon Jan 1, 10:00"));
        assert!(out.contains("Tue Jan 2, 10:00"));
    }

    #[test]
    fn pluralizes_counts() {
        assert_eq!(pluralize("event", 1), "event");
        assert_eq!(pluralize("event", 0), "events");
        assert_eq!(pluralize("event", 3), "events");
    }
}
