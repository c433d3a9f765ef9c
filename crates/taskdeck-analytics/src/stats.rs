//! Aggregate counts, progress and distributions

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskdeck_model::{DashboardStats, Priority, Task, TaskStatus};

/// Counts over a task set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateCounts {
    /// All tasks, unknown statuses included
    pub total: usize,
    /// Completed
    pub completed: usize,
    /// In progress
    pub in_progress: usize,
    /// Todo
    pub todo: usize,
    /// High priority
    pub high_priority: usize,
    /// Past due and not completed
    pub overdue: usize,
}

impl AggregateCounts {
    /// Completion percentage of this set
    #[inline]
    #[must_use]
    pub fn progress(&self) -> u8 {
        progress_of(self.completed, self.total)
    }

    /// Tasks not yet completed
    #[inline]
    #[must_use]
    pub fn tasks_left(&self) -> usize {
        tasks_left(self.completed, self.total)
    }
}

/// Count tasks by status, priority and overdue state as of `now`
#[must_use]
pub fn aggregate(tasks: &[Task], now: DateTime<Utc>) -> AggregateCounts {
    tasks.iter().fold(
        AggregateCounts {
            total: tasks.len(),
            ..AggregateCounts::default()
        },
        |mut counts, task| {
            match task.status {
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Todo => counts.todo += 1,
                TaskStatus::Unknown => {}
            }
            if task.priority == Priority::High {
                counts.high_priority += 1;
            }
            if task.is_overdue(now) {
                counts.overdue += 1;
            }
            counts
        },
    )
}

/// `round(100 * completed / total)`, 0 for an empty set
#[must_use]
pub fn progress_of(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total) as u128;
    let total = total as u128;
    // Integer round-half-up
    let percent = (200 * completed + total) / (2 * total);
    u8::try_from(percent).unwrap_or(100)
}

/// Completion percentage of `tasks`
#[must_use]
pub fn progress_percentage(tasks: &[Task]) -> u8 {
    let completed = tasks.iter().filter(|task| task.is_completed()).count();
    progress_of(completed, tasks.len())
}

/// `max(0, total - completed)`
#[inline]
#[must_use]
pub fn tasks_left(completed: usize, total: usize) -> usize {
    total.saturating_sub(completed)
}

/// Counts per known priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityDistribution {
    /// High
    pub high: usize,
    /// Medium
    pub medium: usize,
    /// Low
    pub low: usize,
}

impl PriorityDistribution {
    /// Sum of all buckets
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Bucket tasks by priority; unknown priorities land in no bucket
#[must_use]
pub fn priority_distribution(tasks: &[Task]) -> PriorityDistribution {
    let mut distribution = PriorityDistribution::default();
    for task in tasks {
        match task.priority {
            Priority::High => distribution.high += 1,
            Priority::Medium => distribution.medium += 1,
            Priority::Low => distribution.low += 1,
            Priority::Unknown => {}
        }
    }
    distribution
}

/// One status row of the breakdown chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusShare {
    /// Status
    pub status: TaskStatus,
    /// Tasks with this status
    pub count: usize,
    /// Share of the total, 0.0 when the total is 0
    pub percent: f64,
}

/// Share of each known status, in board order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBreakdown {
    /// Denominator used for the percentages
    pub total: usize,
    /// Todo, in progress, completed
    pub shares: Vec<StatusShare>,
}

impl StatusBreakdown {
    /// Breakdown from known counts over `total` tasks
    #[must_use]
    pub fn from_counts(todo: usize, in_progress: usize, completed: usize, total: usize) -> Self {
        let share = |status, count: usize| StatusShare {
            status,
            count,
            percent: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
        };
        Self {
            total,
            shares: vec![
                share(TaskStatus::Todo, todo),
                share(TaskStatus::InProgress, in_progress),
                share(TaskStatus::Completed, completed),
            ],
        }
    }

    /// Breakdown of the server-side dashboard counts
    #[must_use]
    pub fn from_stats(stats: &DashboardStats) -> Self {
        let count = |value: u64| usize::try_from(value).unwrap_or(usize::MAX);
        Self::from_counts(
            count(stats.todo),
            count(stats.in_progress),
            count(stats.completed),
            count(stats.total),
        )
    }

    /// Share of one status
    #[must_use]
    pub fn percent(&self, status: TaskStatus) -> f64 {
        self.shares
            .iter()
            .find(|share| share.status == status)
            .map_or(0.0, |share| share.percent)
    }
}

/// Status breakdown of `tasks`; unknown statuses count toward the total only
#[must_use]
pub fn status_breakdown(tasks: &[Task]) -> StatusBreakdown {
    let count = |status: TaskStatus| tasks.iter().filter(|task| task.status == status).count();
    StatusBreakdown::from_counts(
        count(TaskStatus::Todo),
        count(TaskStatus::InProgress),
        count(TaskStatus::Completed),
        tasks.len(),
    )
}
