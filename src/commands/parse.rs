use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use taskcal_core::parse_reply;

use crate::config::AppConfig;
use crate::render::{render_schedule, render_task_set};

/// Read a saved classifier reply from a file, or stdin when no file is given.
fn read_reply(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reply from {}", path.display())),
        None => {
            let mut reply = String::new();
            std::io::stdin()
                .read_to_string(&mut reply)
                .context("Failed to read reply from stdin")?;
            Ok(reply)
        }
    }
}

pub fn run(config: &AppConfig, file: Option<&Path>) -> Result<()> {
    let reply = read_reply(file)?;
    let tasks = parse_reply(&reply);

    if tasks.is_empty() {
        println!("No tasks to schedule.");
        return Ok(());
    }

    let events = config.schedule.schedule(&tasks, Utc::now());

    println!("{}\n", render_task_set(&tasks));
    println!("{} ({})", "Schedule".bold(), config.schedule.timezone());
    println!("{}", render_schedule(&events));

    Ok(())
}
