//! Cache keys for TaskDeck resources
//!
//! Every view that reads tasks uses the [`TASKS`] resource with its list
//! filters as parameters, so one `tasks` invalidation reaches all of them.

use crate::key::QueryKey;
use taskdeck_model::{ProjectId, TaskId, TaskQuery};

/// Current session user
pub const ME: &str = "me";
/// Project list
pub const PROJECTS: &str = "projects";
/// Single project
pub const PROJECT: &str = "project";
/// Task lists, parameterised by filters
pub const TASKS: &str = "tasks";
/// Single task
pub const TASK: &str = "task";
/// Server-side dashboard counts
pub const DASHBOARD_STATS: &str = "dashboard-stats";

/// `me`
#[must_use]
pub fn me() -> QueryKey {
    QueryKey::new(ME)
}

/// `projects`
#[must_use]
pub fn projects() -> QueryKey {
    QueryKey::new(PROJECTS)
}

/// `project{id}`
#[must_use]
pub fn project(id: &ProjectId) -> QueryKey {
    QueryKey::new(PROJECT).with("id", id.as_str())
}

/// `tasks{...filters}`
#[must_use]
pub fn tasks(query: &TaskQuery) -> QueryKey {
    QueryKey::new(TASKS).with_all(query.to_params())
}

/// `task{id}`
#[must_use]
pub fn task(id: &TaskId) -> QueryKey {
    QueryKey::new(TASK).with("id", id.as_str())
}

/// `dashboard-stats`
#[must_use]
pub fn dashboard_stats() -> QueryKey {
    QueryKey::new(DASHBOARD_STATS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_model::TaskStatus;

    #[test]
    fn task_keys_carry_filters() {
        let key = tasks(&TaskQuery::new().for_project("p1").with_status(TaskStatus::Todo));
        assert_eq!(key.to_string(), "tasks{project:p1,status:todo}");
        assert_eq!(tasks(&TaskQuery::new()).to_string(), "tasks");
    }
}
