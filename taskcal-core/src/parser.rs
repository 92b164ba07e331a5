//! Parsing of the classifier's free-text reply.
//!
//! The model is asked for a fixed layout:
//!
//! ```text
//! High Priority:
//! - task 1
//!
//! Medium Priority:
//! - task 2
//! ```
//!
//! but nothing guarantees it complies. Parsing is lenient: commentary, blank
//! lines and tiers in any order are tolerated, and a reply with no usable
//! structure simply produces empty tiers.

use crate::task::{ClassifiedTaskSet, PriorityTier, Task};

const LIST_MARKER: &str = "- ";

/// Parse a classifier reply into tasks grouped by tier. Never fails.
pub fn parse_reply(reply: &str) -> ClassifiedTaskSet {
    let mut set = ClassifiedTaskSet::new();
    let mut current: Option<PriorityTier> = None;

    for line in reply.lines() {
        let line = line.trim();

        if let Some(tier) = header_tier(line) {
            current = Some(tier);
            continue;
        }

        let Some(rest) = line.strip_prefix(LIST_MARKER) else {
            continue;
        };

        // Marker lines before any header have nowhere to go
        let Some(tier) = current else {
            continue;
        };

        let description = rest.trim();
        if !description.is_empty() {
            set.push(tier, Task::new(description));
        }
    }

    tracing::debug!(
        high = set.tasks(PriorityTier::High).len(),
        medium = set.tasks(PriorityTier::Medium).len(),
        low = set.tasks(PriorityTier::Low).len(),
        "Parsed classifier reply"
    );

    set
}

/// Tier named by a section header line, if the (trimmed) line is one.
fn header_tier(line: &str) -> Option<PriorityTier> {
    let lower = line.to_lowercase();
    PriorityTier::ALL
        .into_iter()
        .find(|tier| lower.starts_with(tier.header_prefix()))
}
