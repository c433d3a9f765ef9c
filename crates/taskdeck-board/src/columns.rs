//! Column grouping

use serde::Serialize;
use taskdeck_model::{Task, TaskId, TaskStatus};

/// Column metadata in display order
pub const COLUMNS: [ColumnSpec; 3] = [
    ColumnSpec {
        status: TaskStatus::Todo,
        label: "Todo",
    },
    ColumnSpec {
        status: TaskStatus::InProgress,
        label: "In Progress",
    },
    ColumnSpec {
        status: TaskStatus::Completed,
        label: "Completed",
    },
];

/// Static description of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    /// Status shown in the column
    pub status: TaskStatus,
    /// Heading
    pub label: &'static str,
}

/// One column with its cards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Status shown in the column
    pub status: TaskStatus,
    /// Heading
    pub label: &'static str,
    /// Cards in server order
    pub tasks: Vec<Task>,
}

impl Column {
    /// Card count
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.tasks.len()
    }
}

/// Columns grouped from one task snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    /// Columns in display order
    pub columns: Vec<Column>,
}

impl Board {
    /// Group `tasks` by their current status. Tasks with an unknown status
    /// are left off the board.
    #[must_use]
    pub fn group(tasks: &[Task]) -> Self {
        let columns = COLUMNS
            .iter()
            .map(|spec| Column {
                status: spec.status,
                label: spec.label,
                tasks: tasks
                    .iter()
                    .filter(|task| task.status == spec.status)
                    .cloned()
                    .collect(),
            })
            .collect();
        Self { columns }
    }

    /// Empty board
    #[must_use]
    pub fn empty() -> Self {
        Self::group(&[])
    }

    /// Column for `status`
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> Option<&Column> {
        self.columns.iter().find(|column| column.status == status)
    }

    /// Card count for `status`
    #[must_use]
    pub fn count(&self, status: TaskStatus) -> usize {
        self.column(status).map_or(0, Column::count)
    }

    /// Cards on the board
    #[must_use]
    pub fn total(&self) -> usize {
        self.columns.iter().map(Column::count).sum()
    }

    /// Locate a card
    #[must_use]
    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.columns
            .iter()
            .flat_map(|column| column.tasks.iter())
            .find(|task| &task.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_model::Priority;
    use taskdeck_test_utils::task;

    #[test]
    fn groups_by_current_status() {
        let tasks = vec![
            task("a", TaskStatus::Todo, Priority::Low),
            task("b", TaskStatus::Completed, Priority::Low),
            task("c", TaskStatus::Todo, Priority::High),
            task("d", TaskStatus::Unknown, Priority::Low),
        ];

        let board = Board::group(&tasks);
        assert_eq!(board.count(TaskStatus::Todo), 2);
        assert_eq!(board.count(TaskStatus::InProgress), 0);
        assert_eq!(board.count(TaskStatus::Completed), 1);
        assert_eq!(board.total(), 3);
        assert!(board.find(&TaskId::new("d")).is_none());
    }

    #[test]
    fn column_order_and_labels() {
        let labels: Vec<&str> = Board::empty().columns.iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["Todo", "In Progress", "Completed"]);
    }
}
