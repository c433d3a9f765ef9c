//! List filters for `GET /tasks`
//!
//! All filters are optional and combine with logical AND on the server.

use crate::types::{Priority, ProjectId, TaskStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Task list filter set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Restrict to one project
    pub project: Option<ProjectId>,
    /// Restrict to one status
    pub status: Option<TaskStatus>,
    /// Restrict to one priority
    pub priority: Option<Priority>,
    /// Server-side text search
    pub search: Option<String>,
    /// Due strictly before this instant
    pub due_before: Option<DateTime<Utc>>,
    /// Due at or after this instant
    pub due_after: Option<DateTime<Utc>>,
}

impl TaskQuery {
    /// Unfiltered query
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a project
    #[inline]
    #[must_use]
    pub fn for_project(mut self, project: impl Into<ProjectId>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Restrict to a status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a priority
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Search text; blank text clears the filter
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search)
        };
        self
    }

    /// Due before instant
    #[inline]
    #[must_use]
    pub fn due_before(mut self, instant: DateTime<Utc>) -> Self {
        self.due_before = Some(instant);
        self
    }

    /// Due after instant
    #[inline]
    #[must_use]
    pub fn due_after(mut self, instant: DateTime<Utc>) -> Self {
        self.due_after = Some(instant);
        self
    }

    /// Whether no filter is set
    #[inline]
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }

    /// Query-string pairs using the server's parameter names, sorted by name
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(before) = &self.due_before {
            params.push(("dueBefore", iso_instant(before)));
        }
        if let Some(after) = &self.due_after {
            params.push(("dueAfter", iso_instant(after)));
        }
        if let Some(priority) = &self.priority {
            params.push(("priority", priority.as_str().to_string()));
        }
        if let Some(project) = &self.project {
            params.push(("project", project.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(status) = &self.status {
            params.push(("status", status.as_str().to_string()));
        }
        params
    }
}

/// ISO-8601 instant with millisecond precision and a `Z` suffix
#[inline]
#[must_use]
pub fn iso_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}
