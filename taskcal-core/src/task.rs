//! Tasks and their priority tiers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A short task description. Two tasks with the same text are still two tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task(String);

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        Task(description.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Task {
    fn from(s: &str) -> Self {
        Task::new(s)
    }
}

/// Priority bucket assigned by the classifier.
///
/// Ordering is significant: `High < Medium < Low`, so iterating a
/// `BTreeMap<PriorityTier, _>` visits the most urgent tier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 3] = [PriorityTier::High, PriorityTier::Medium, PriorityTier::Low];

    /// Section header prefix as it appears (lowercased) in a classifier reply.
    pub fn header_prefix(self) -> &'static str {
        match self {
            PriorityTier::High => "high priority",
            PriorityTier::Medium => "medium priority",
            PriorityTier::Low => "low priority",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriorityTier::High => "High",
            PriorityTier::Medium => "Medium",
            PriorityTier::Low => "Low",
        };
        f.write_str(name)
    }
}

/// Tasks grouped by tier, in the order the classifier emitted them.
///
/// Every tier key is always present, possibly with an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedTaskSet {
    tiers: BTreeMap<PriorityTier, Vec<Task>>,
}

impl Default for ClassifiedTaskSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifiedTaskSet {
    pub fn new() -> Self {
        let tiers = PriorityTier::ALL
            .iter()
            .map(|tier| (*tier, Vec::new()))
            .collect();
        ClassifiedTaskSet { tiers }
    }

    /// Only the reply parser builds task sets; they are read-only afterwards.
    pub(crate) fn push(&mut self, tier: PriorityTier, task: Task) {
        self.tiers.entry(tier).or_default().push(task);
    }

    pub fn tasks(&self, tier: PriorityTier) -> &[Task] {
        self.tiers.get(&tier).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tiers in High -> Medium -> Low order with their tasks.
    pub fn iter(&self) -> impl Iterator<Item = (PriorityTier, &[Task])> {
        self.tiers.iter().map(|(tier, tasks)| (*tier, tasks.as_slice()))
    }

    /// Total number of tasks across all tiers.
    pub fn len(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
