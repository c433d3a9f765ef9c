//! TaskDeck Kanban Board
//!
//! Columns grouped from the cached task list and a drag-and-drop protocol
//! whose only side effect is a status update on drop.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskdeck_board::KanbanController;
//!
//! let board = KanbanController::new(gateway, coordinator, project_id);
//! let columns = board.load().await?;
//! board.start_drag(task_id)?;
//! board.enter_column(TaskStatus::Completed)?;
//! board.drop_card().await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod columns;
pub mod controller;
pub mod drag;
pub mod error;

pub use columns::{Board, Column, ColumnSpec, COLUMNS};
pub use controller::{move_mutation, DropOutcome, KanbanController};
pub use drag::{transition, DragEvent, DragMachine, DragState, DropIntent};
pub use error::BoardError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
