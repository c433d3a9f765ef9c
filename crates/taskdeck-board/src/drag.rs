//! Drag-and-drop state machine
//!
//! Renderer-independent: a UI feeds [`DragEvent`]s in and acts on the
//! [`DropIntent`] a completed drop yields. Dropping is the only event that
//! can lead to a write.
//!
//! ```text
//! Idle ──Start──▶ Dragging ──Enter(c)──▶ OverColumn(c) ──Drop──▶ Idle + intent
//!                    ▲  │                   │    ▲
//!                    └──┼──────Leave────────┘    └─Enter(c')
//!                       └──Drop / Cancel──▶ Idle
//! ```

use crate::error::BoardError;
use serde::Serialize;
use taskdeck_model::{TaskId, TaskStatus};

/// Where a drag gesture stands
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum DragState {
    /// No gesture
    #[default]
    Idle,
    /// A card is held outside any column
    Dragging {
        /// Held card
        task: TaskId,
    },
    /// A card is held over a column
    OverColumn {
        /// Held card
        task: TaskId,
        /// Column under the pointer
        column: TaskStatus,
    },
}

impl DragState {
    /// Card being dragged, if any
    #[must_use]
    pub fn task(&self) -> Option<&TaskId> {
        match self {
            Self::Idle => None,
            Self::Dragging { task } | Self::OverColumn { task, .. } => Some(task),
        }
    }

    /// Column under the pointer, if any
    #[must_use]
    pub fn column(&self) -> Option<TaskStatus> {
        match self {
            Self::OverColumn { column, .. } => Some(*column),
            Self::Idle | Self::Dragging { .. } => None,
        }
    }
}

/// Input from the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DragEvent {
    /// Card picked up
    Start(TaskId),
    /// Pointer entered a column
    Enter(TaskStatus),
    /// Pointer left the column
    Leave,
    /// Card released
    Drop,
    /// Gesture aborted
    Cancel,
}

/// A completed drop onto a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIntent {
    /// Dropped card
    pub task: TaskId,
    /// Target column
    pub target: TaskStatus,
}

/// Compute the next state.
///
/// # Errors
/// [`BoardError::IllegalTransition`] when `event` makes no sense in `state`,
/// including entering a column for an unknown status.
pub fn transition(
    state: &DragState,
    event: DragEvent,
) -> Result<(DragState, Option<DropIntent>), BoardError> {
    let next = match (state, &event) {
        (DragState::Idle, DragEvent::Start(task)) => DragState::Dragging { task: task.clone() },
        (DragState::Dragging { task } | DragState::OverColumn { task, .. }, DragEvent::Enter(column))
            if column.is_known() =>
        {
            DragState::OverColumn {
                task: task.clone(),
                column: *column,
            }
        }
        (DragState::OverColumn { task, .. }, DragEvent::Leave) => DragState::Dragging { task: task.clone() },
        (DragState::OverColumn { task, column }, DragEvent::Drop) => {
            let intent = DropIntent {
                task: task.clone(),
                target: *column,
            };
            return Ok((DragState::Idle, Some(intent)));
        }
        (DragState::Dragging { .. }, DragEvent::Drop) | (_, DragEvent::Cancel) => DragState::Idle,
        _ => {
            return Err(BoardError::IllegalTransition {
                state: state.clone(),
                event: event.clone(),
            })
        }
    };
    Ok((next, None))
}

/// Stateful wrapper around [`transition`]
#[derive(Debug, Default)]
pub struct DragMachine {
    state: DragState,
}

impl DragMachine {
    /// Idle machine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Feed one event; an illegal event leaves the state unchanged.
    ///
    /// # Errors
    /// See [`transition`].
    pub fn apply(&mut self, event: DragEvent) -> Result<Option<DropIntent>, BoardError> {
        let (next, intent) = transition(&self.state, event)?;
        self.state = next;
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t1() -> TaskId {
        TaskId::new("t1")
    }

    #[test]
    fn drop_over_column_yields_intent() {
        let mut machine = DragMachine::new();
        machine.apply(DragEvent::Start(t1())).unwrap();
        machine.apply(DragEvent::Enter(TaskStatus::InProgress)).unwrap();
        machine.apply(DragEvent::Enter(TaskStatus::Completed)).unwrap();

        let intent = machine.apply(DragEvent::Drop).unwrap();
        assert_eq!(
            intent,
            Some(DropIntent {
                task: t1(),
                target: TaskStatus::Completed
            })
        );
        assert_eq!(machine.state(), &DragState::Idle);
    }

    #[test]
    fn drop_outside_columns_does_nothing() {
        let mut machine = DragMachine::new();
        machine.apply(DragEvent::Start(t1())).unwrap();
        machine.apply(DragEvent::Enter(TaskStatus::Todo)).unwrap();
        machine.apply(DragEvent::Leave).unwrap();

        assert_eq!(machine.apply(DragEvent::Drop).unwrap(), None);
        assert_eq!(machine.state(), &DragState::Idle);
    }

    #[test]
    fn illegal_events_are_rejected() {
        let mut machine = DragMachine::new();
        assert!(machine.apply(DragEvent::Drop).is_err());
        assert!(machine.apply(DragEvent::Leave).is_err());

        machine.apply(DragEvent::Start(t1())).unwrap();
        assert!(machine.apply(DragEvent::Start(TaskId::new("t2"))).is_err());
        assert!(machine.apply(DragEvent::Enter(TaskStatus::Unknown)).is_err());
        assert_eq!(machine.state().task(), Some(&t1()));
    }

    #[test]
    fn cancel_always_returns_to_idle() {
        let mut machine = DragMachine::new();
        machine.apply(DragEvent::Cancel).unwrap();
        machine.apply(DragEvent::Start(t1())).unwrap();
        machine.apply(DragEvent::Enter(TaskStatus::Todo)).unwrap();
        machine.apply(DragEvent::Cancel).unwrap();
        assert_eq!(machine.state(), &DragState::Idle);
    }
}
