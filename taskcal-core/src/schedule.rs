//! Priority-aware scheduling policy.
//!
//! Each tier has a lead time in days. The task at zero-based index `i` in a
//! tier lands on `today + lead + i`, so urgent work comes first and tasks of
//! the same tier never share a day.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{TaskCalError, TaskCalResult};
use crate::task::{ClassifiedTaskSet, PriorityTier, Task};

/// Lead time for a tier that has no entry in the policy table.
pub const DEFAULT_LEAD_DAYS: u32 = 5;

pub const DEFAULT_START_HOUR: u32 = 10;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Kolkata;

/// Latest start hour that still lets a one-hour event end on the same day.
pub const MAX_START_HOUR: u32 = 22;

/// A task pinned to a concrete calendar slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub task: Task,
    pub tier: PriorityTier,
    /// Days after the reference date (lead time plus index within the tier)
    pub day_offset: u32,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub timezone: Tz,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulePolicy {
    lead_days: BTreeMap<PriorityTier, u32>,
    start_hour: u32,
    duration: Duration,
    timezone: Tz,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        let lead_days = BTreeMap::from([
            (PriorityTier::High, 0),
            (PriorityTier::Medium, 1),
            (PriorityTier::Low, 3),
        ]);

        SchedulePolicy {
            lead_days,
            start_hour: DEFAULT_START_HOUR,
            duration: Duration::hours(1),
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl SchedulePolicy {
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_start_hour(mut self, hour: u32) -> TaskCalResult<Self> {
        if hour > MAX_START_HOUR {
            return Err(TaskCalError::Config(format!(
                "start hour must be between 0 and {}, got {}",
                MAX_START_HOUR, hour
            )));
        }
        self.start_hour = hour;
        Ok(self)
    }

    /// Drop a tier from the lead-time table so it falls back to
    /// [`DEFAULT_LEAD_DAYS`].
    pub fn without_lead(mut self, tier: PriorityTier) -> Self {
        self.lead_days.remove(&tier);
        self
    }

    pub fn lead_days(&self, tier: PriorityTier) -> u32 {
        self.lead_days
            .get(&tier)
            .copied()
            .unwrap_or(DEFAULT_LEAD_DAYS)
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    /// Compute one event per task, grouped High -> Medium -> Low and then by
    /// the order the classifier listed them in.
    ///
    /// Pure: the caller decides what to do with the events. All dates are
    /// fixed here, before anything is submitted.
    pub fn schedule(&self, tasks: &ClassifiedTaskSet, now: DateTime<Utc>) -> Vec<ScheduledEvent> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let mut events = Vec::with_capacity(tasks.len());

        for (tier, tier_tasks) in tasks.iter() {
            let lead = self.lead_days(tier);

            for (index, task) in tier_tasks.iter().enumerate() {
                let day_offset = lead + index as u32;
                let day = today + Duration::days(i64::from(day_offset));
                let start = self.start_on(day);

                events.push(ScheduledEvent {
                    task: task.clone(),
                    tier,
                    day_offset,
                    start,
                    end: start + self.duration,
                    timezone: self.timezone,
                });
            }
        }

        events
    }

    /// Wall-clock start hour on `day` in the policy timezone.
    fn start_on(&self, day: NaiveDate) -> DateTime<Tz> {
        let time = NaiveTime::from_hms_opt(self.start_hour, 0, 0).unwrap_or_default();
        let local = day.and_time(time);

        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            // Skipped by a DST jump: use the first valid time after the gap
            LocalResult::None => self
                .timezone
                .from_local_datetime(&(local + Duration::hours(1)))
                .earliest()
                .unwrap_or_else(|| self.timezone.from_utc_datetime(&local)),
        }
    }
}
