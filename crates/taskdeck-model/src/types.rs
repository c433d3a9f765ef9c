//! Core payload types
//!
//! Field names follow the server's JSON (`_id`, `dueDate`, `createdAt`), so
//! every type here decodes straight from the `data` member of a response
//! envelope.

use crate::error::ModelError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a server identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Server-assigned project identifier
    ProjectId
);
string_id!(
    /// Server-assigned task identifier
    TaskId
);
string_id!(
    /// Server-assigned user identifier
    UserId
);

/// Task status (one kanban column per known value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started
    Todo,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
    /// Any value the server sends that this client does not know
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Known statuses in board order
    pub const ALL: [TaskStatus; 3] = [Self::Todo, Self::InProgress, Self::Completed];

    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable column label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether this is one of the enumerated statuses
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(ModelError::UnknownStatus(s.to_string())),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority
    Low,
    /// Medium priority (server default)
    Medium,
    /// High priority
    High,
    /// Any value the server sends that this client does not know
    #[serde(other)]
    Unknown,
}

impl Priority {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ModelError::UnknownPriority(s.to_string())),
        }
    }
}

/// Project as returned by `/projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: ProjectId,
    /// Title
    pub title: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Creation time
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last update time, absent on projects never edited
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Update time, falling back to creation time
    #[inline]
    #[must_use]
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

/// Denormalised project reference embedded in a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: ProjectId,
    /// Title at the time the task was read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Task back-reference to its project.
///
/// The server populates the reference on list endpoints and sends the bare
/// id elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectLink {
    /// Bare identifier
    Id(ProjectId),
    /// Populated reference
    Populated(ProjectRef),
}

impl ProjectLink {
    /// Project identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ProjectId {
        match self {
            Self::Id(id) => id,
            Self::Populated(r) => &r.id,
        }
    }

    /// Project title when populated
    #[inline]
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Populated(r) => r.title.as_deref(),
        }
    }
}

/// Assigned user reference embedded in a task
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserRef {
    /// Identifier
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserRef {
    /// Stable identity used to de-duplicate members: id, then email, then name
    #[must_use]
    pub fn identity(&self) -> Option<&str> {
        self.id
            .as_ref()
            .map(UserId::as_str)
            .or(self.email.as_deref())
            .or(self.name.as_deref())
    }
}

/// Task as returned by `/tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: TaskId,
    /// Title
    pub title: String,
    /// Description (may contain rich-text HTML)
    #[serde(default)]
    pub description: String,
    /// Current status
    pub status: TaskStatus,
    /// Priority
    pub priority: Priority,
    /// Due instant
    #[serde(rename = "dueDate")]
    pub due_date: DateTime<Utc>,
    /// Owning project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectLink>,
    /// Assigned user
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserRef>,
}

impl Task {
    /// Whether the task is done
    #[inline]
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Due strictly before `now` and not completed
    #[inline]
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date < now && !self.is_completed()
    }

    /// Owning project id, if any
    #[inline]
    #[must_use]
    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project.as_ref().map(ProjectLink::id)
    }

    /// Owning project title, if populated
    #[inline]
    #[must_use]
    pub fn project_title(&self) -> Option<&str> {
        self.project.as_ref().and_then(ProjectLink::title)
    }
}

/// Session identity from `/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

/// Aggregate counts from `/dashboard/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// All tasks
    pub total: u64,
    /// Completed tasks
    pub completed: u64,
    /// In-progress tasks
    pub in_progress: u64,
    /// Todo tasks
    pub todo: u64,
    /// High-priority tasks
    pub high_priority: u64,
    /// Tasks due within the current week
    pub due_this_week: u64,
}

/// Body for `POST /projects`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDraft {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
}

impl ProjectDraft {
    /// Create draft
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Body for `PUT /projects/:id`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectPatch {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body for `POST /tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Initial status
    pub status: TaskStatus,
    /// Priority
    pub priority: Priority,
    /// Due instant
    #[serde(rename = "dueDate")]
    pub due_date: DateTime<Utc>,
    /// Owning project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectId>,
}

impl TaskDraft {
    /// Create draft with the form defaults (todo, medium priority)
    #[must_use]
    pub fn new(title: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date,
            project: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With priority
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// In project
    #[inline]
    #[must_use]
    pub fn in_project(mut self, project: impl Into<ProjectId>) -> Self {
        self.project = Some(project.into());
        self
    }
}

/// Body for `PUT /tasks/:id`; only present fields are sent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// New due instant
    #[serde(rename = "dueDate", default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Patch that only moves the task to another status
    #[inline]
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether the patch changes anything
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

/// Body for `POST /auth/login`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[inline]
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body for `POST /auth/register`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
