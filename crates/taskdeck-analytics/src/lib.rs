//! TaskDeck Derived Analytics
//!
//! Pure functions over project and task snapshots. Nothing here performs
//! I/O or reads the clock; callers pass "now" explicitly.
//!
//! # Overview
//!
//! - [`stats`]: aggregate counts, progress, priority and status distributions
//! - [`calendar`]: weekly series, upcoming window, month grid, day buckets
//! - [`projects`]: health badges, summaries, members, search, drilldown
//!
//! # Example
//!
//! ```rust,ignore
//! use chrono::Local;
//! use taskdeck_analytics::{aggregate, weekly_series};
//!
//! let counts = aggregate(&tasks, chrono::Utc::now());
//! let series = weekly_series(&tasks, &Local::now());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod calendar;
pub mod projects;
pub mod stats;

pub use calendar::{
    local_midnight, tasks_by_day, upcoming, upcoming_window, weekly_series, weekly_window,
    MonthGrid, Window, UPCOMING_DAYS, WEEK_DAYS,
};
pub use projects::{
    drilldown, project_members, recent_projects, search_projects,
    search_term, summarize, Drilldown, ProjectHealth, ProjectSummary, MAX_MEMBERS,
    MIN_SEARCH_CHARS, RECENT_PROJECTS, SEARCH_RESULTS,
};
pub use stats::{
    aggregate, priority_distribution, progress_of, progress_percentage, status_breakdown,
    tasks_left, AggregateCounts, PriorityDistribution, StatusBreakdown, StatusShare,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
