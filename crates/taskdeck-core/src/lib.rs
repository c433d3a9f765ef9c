//! TaskDeck Core - application facade
//!
//! Wires the workspace together behind [`TaskDeck`]:
//! - Remote gateway over HTTP with session-expiry redirects
//! - One shared query cache with keyed invalidation
//! - Named mutations with their invalidation sets
//! - Dashboard analytics and the kanban board over cached lists
//! - Local activity notes and theme preference
//!
//! # Example
//!
//! ```rust,ignore
//! use taskdeck_core::{TaskDeck, TaskDeckConfig};
//!
//! let deck = TaskDeck::connect(TaskDeckConfig::from_env()?)?;
//! let overview = deck.overview(&chrono::Local::now()).await?;
//! println!("{}% done", overview.counts.progress());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod deck;
pub mod error;

pub use config::{CacheSettings, TaskDeckConfig, DEFAULT_API_URL, DEFAULT_DATA_DIR};
pub use deck::{Mutations, Overview, SearchResults, TaskDeck, UpcomingPanel, UPCOMING_LIMIT};
pub use error::TaskDeckError;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for applications built on TaskDeck
    pub use crate::{TaskDeck, TaskDeckConfig, TaskDeckError};
    pub use taskdeck_board::{DropOutcome, KanbanController};
    pub use taskdeck_model::{ProjectId, Task, TaskId, TaskQuery, TaskStatus};
    pub use taskdeck_query::{QueryFilter, QueryKey};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
