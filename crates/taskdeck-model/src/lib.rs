//! TaskDeck Model
//!
//! Typed payloads exchanged with the TaskDeck REST API.
//!
//! # Overview
//!
//! - **Project** / **Task**: server-owned entities, decoded at the gateway
//! - **TaskStatus** / **Priority**: closed enums with an explicit `Unknown`
//!   variant so an unexpected server value never breaks rendering
//! - **TaskQuery**: list filters for `GET /tasks`
//! - **Drafts and patches**: request bodies for create/update calls
//!
//! # Example
//!
//! ```rust
//! use taskdeck_model::{Priority, TaskQuery, TaskStatus};
//!
//! let query = TaskQuery::new()
//!     .for_project("p1")
//!     .with_status(TaskStatus::Todo)
//!     .with_priority(Priority::High);
//!
//! assert_eq!(query.to_params().len(), 3);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod query;
pub mod types;

pub use error::ModelError;
pub use query::TaskQuery;
pub use types::{
    Credentials, DashboardStats, Priority, Project, ProjectDraft, ProjectId, ProjectLink,
    ProjectPatch, ProjectRef, Registration, Task, TaskDraft, TaskId, TaskPatch, TaskStatus, User,
    UserId, UserRef,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with TaskDeck payloads
    pub use crate::{
        DashboardStats, Priority, Project, ProjectId, Task, TaskId, TaskQuery, TaskStatus,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
