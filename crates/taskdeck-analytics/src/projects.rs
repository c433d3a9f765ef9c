//! Per-project derivations: health, summaries, members, search, drilldown

use crate::calendar::local_midnight;
use crate::stats::{progress_of, tasks_left};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use taskdeck_model::{Project, ProjectId, Task, TaskStatus, UserRef};

/// Rows shown in the recent-projects table
pub const RECENT_PROJECTS: usize = 5;

/// Members shown on a project card
pub const MAX_MEMBERS: usize = 5;

/// Results per search section
pub const SEARCH_RESULTS: usize = 5;

/// Shortest query that triggers a search
pub const MIN_SEARCH_CHARS: usize = 2;

/// Health badge derived from progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectHealth {
    /// At least 80% done
    OnTrack,
    /// At least 40% done
    InProgress,
    /// Below 40%
    Planning,
}

impl ProjectHealth {
    /// Classify a progress percentage
    #[must_use]
    pub fn from_progress(progress: u8) -> Self {
        match progress {
            80.. => Self::OnTrack,
            40..=79 => Self::InProgress,
            _ => Self::Planning,
        }
    }

    /// Badge text
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::OnTrack => "On Track",
            Self::InProgress => "In Progress",
            Self::Planning => "Planning",
        }
    }
}

/// One project row with its task-derived figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    /// Project identifier
    pub id: ProjectId,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Completed tasks
    pub completed: usize,
    /// All tasks
    pub total: usize,
    /// Tasks not yet completed
    pub tasks_left: usize,
    /// Completion percentage
    pub progress: u8,
    /// Badge
    pub health: ProjectHealth,
    /// Distinct assignees, at most [`MAX_MEMBERS`]
    pub members: Vec<UserRef>,
    /// Update time, falling back to creation time
    pub updated: DateTime<Utc>,
}

/// Summarise `project` from its task list
#[must_use]
pub fn summarize(project: &Project, tasks: &[Task]) -> ProjectSummary {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.is_completed()).count();
    let progress = progress_of(completed, total);
    ProjectSummary {
        id: project.id.clone(),
        title: project.title.clone(),
        description: project.description.clone(),
        completed,
        total,
        tasks_left: tasks_left(completed, total),
        progress,
        health: ProjectHealth::from_progress(progress),
        members: project_members(tasks),
        updated: project.last_touched(),
    }
}

/// Distinct assignees in first-seen order, at most [`MAX_MEMBERS`].
///
/// Users are identified by id, then email, then name; a later sighting of
/// the same identity replaces the earlier details in place.
#[must_use]
pub fn project_members(tasks: &[Task]) -> Vec<UserRef> {
    let mut members: Vec<UserRef> = Vec::new();
    for user in tasks.iter().filter_map(|task| task.assignee.as_ref()) {
        let Some(identity) = user.identity() else {
            continue;
        };
        match members.iter_mut().find(|m| m.identity() == Some(identity)) {
            Some(existing) => *existing = user.clone(),
            None => members.push(user.clone()),
        }
    }
    members.truncate(MAX_MEMBERS);
    members
}

/// The first [`RECENT_PROJECTS`] projects, in server order
#[must_use]
pub fn recent_projects(projects: &[Project]) -> &[Project] {
    &projects[..projects.len().min(RECENT_PROJECTS)]
}

/// Normalised search term, or `None` when too short to search
#[must_use]
pub fn search_term(query: &str) -> Option<String> {
    let term = query.trim();
    (term.chars().count() >= MIN_SEARCH_CHARS).then(|| term.to_lowercase())
}

/// Projects whose title or description contains `query`, case-insensitively
#[must_use]
pub fn search_projects<'a>(projects: &'a [Project], query: &str) -> Vec<&'a Project> {
    let Some(term) = search_term(query) else {
        return Vec::new();
    };
    projects
        .iter()
        .filter(|project| {
            let haystack = [project.title.as_str(), project.description.as_str()]
                .iter()
                .filter(|part| !part.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            haystack.contains(&term)
        })
        .take(SEARCH_RESULTS)
        .collect()
}

/// Task subsets behind the dashboard cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Drilldown {
    /// Every task
    All,
    /// Completed tasks
    Completed,
    /// Open tasks due before today
    Overdue,
}

impl Drilldown {
    /// Table heading
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Completed => "Completed Tasks",
            Self::Overdue => "Overdue Tasks",
        }
    }
}

/// Rows for a drilldown table.
///
/// The overdue view compares against the start of today in the viewer's
/// zone, so tasks due earlier today are not listed yet.
#[must_use]
pub fn drilldown<'a, Tz: TimeZone>(tasks: &'a [Task], selection: Drilldown, now: &DateTime<Tz>) -> Vec<&'a Task> {
    match selection {
        Drilldown::All => tasks.iter().collect(),
        Drilldown::Completed => tasks.iter().filter(|task| task.is_completed()).collect(),
        Drilldown::Overdue => {
            let today = local_midnight(&now.timezone(), now.date_naive()).with_timezone(&Utc);
            tasks
                .iter()
                .filter(|task| task.status != TaskStatus::Completed && task.due_date < today)
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskdeck_test_utils::{assigned, at, project, project_described, task_due, task_in};

    #[test]
    fn health_thresholds() {
        assert_eq!(ProjectHealth::from_progress(100), ProjectHealth::OnTrack);
        assert_eq!(ProjectHealth::from_progress(80), ProjectHealth::OnTrack);
        assert_eq!(ProjectHealth::from_progress(79), ProjectHealth::InProgress);
        assert_eq!(ProjectHealth::from_progress(40), ProjectHealth::InProgress);
        assert_eq!(ProjectHealth::from_progress(39), ProjectHealth::Planning);
        assert_eq!(ProjectHealth::from_progress(0).label(), "Planning");
    }

    #[test]
    fn summary_counts_tasks() {
        let tasks = vec![
            task_in("a", "p1", TaskStatus::Completed),
            task_in("b", "p1", TaskStatus::Completed),
            task_in("c", "p1", TaskStatus::Todo),
        ];

        let summary = summarize(&project("p1", "Apollo"), &tasks);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.tasks_left, 1);
        assert_eq!(summary.progress, 67);
        assert_eq!(summary.health, ProjectHealth::InProgress);
    }

    #[test]
    fn empty_project_is_planning() {
        let summary = summarize(&project("p1", "Apollo"), &[]);
        assert_eq!(summary.progress, 0);
        assert_eq!(summary.health, ProjectHealth::Planning);
        assert!(summary.members.is_empty());
    }

    #[test]
    fn members_are_unique_and_capped() {
        let mut tasks = Vec::new();
        for i in 0..8 {
            let base = task_in(&format!("t{i}"), "p1", TaskStatus::Todo);
            tasks.push(assigned(base, Some(&format!("u{}", i % 7)), "Name", "x@example.com"));
        }
        // Same user twice, identified by email only
        tasks.push(assigned(task_in("e1", "p1", TaskStatus::Todo), None, "Ann", "ann@example.com"));

        let members = project_members(&tasks);
        assert_eq!(members.len(), MAX_MEMBERS);
        assert_eq!(members[0].identity(), Some("u0"));
    }

    #[test]
    fn members_fall_back_to_email() {
        let tasks = vec![
            assigned(task_in("a", "p1", TaskStatus::Todo), None, "Ann", "ann@example.com"),
            assigned(task_in("b", "p1", TaskStatus::Todo), None, "Ann B.", "ann@example.com"),
        ];

        let members = project_members(&tasks);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name.as_deref(), Some("Ann B."));
    }

    #[test]
    fn recent_projects_takes_first_five() {
        let projects: Vec<Project> = (0..7).map(|i| project(&format!("p{i}"), "P")).collect();
        assert_eq!(recent_projects(&projects).len(), 5);
        assert_eq!(recent_projects(&projects[..2]).len(), 2);
    }

    #[test]
    fn search_matches_title_and_description() {
        let projects = vec![
            project_described("p1", "Website Redesign", "Marketing refresh"),
            project_described("p2", "Mobile App", "New onboarding flow"),
            project_described("p3", "Infra", ""),
        ];

        let ids = |query: &str| -> Vec<String> {
            search_projects(&projects, query)
                .iter()
                .map(|p| p.id.to_string())
                .collect()
        };

        assert_eq!(ids("website"), vec!["p1"]);
        assert_eq!(ids("  ONBOARD "), vec!["p2"]);
        assert_eq!(ids("redesign marketing"), vec!["p1"]);
        assert!(ids("w").is_empty());
        assert!(ids("zzz").is_empty());
    }

    #[test]
    fn drilldown_selections() {
        let now = at(2026, 3, 11, 15, 0);
        let tasks = vec![
            task_due("done", TaskStatus::Completed, at(2026, 3, 1, 9, 0)),
            task_due("late", TaskStatus::Todo, at(2026, 3, 10, 9, 0)),
            task_due("today", TaskStatus::InProgress, at(2026, 3, 11, 9, 0)),
        ];

        assert_eq!(drilldown(&tasks, Drilldown::All, &now).len(), 3);
        assert_eq!(drilldown(&tasks, Drilldown::Completed, &now)[0].id.as_str(), "done");
        let overdue = drilldown(&tasks, Drilldown::Overdue, &now);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id.as_str(), "late");
    }
}
