//! Kanban controller
//!
//! Binds one project's board to the query cache and turns completed drops
//! into status updates. The board is never edited in place: after a move
//! the task lists are invalidated and the next [`KanbanController::load`]
//! regroups from the refetched list.

use crate::columns::Board;
use crate::drag::{DragEvent, DragMachine, DragState};
use crate::error::BoardError;
use parking_lot::Mutex;
use std::sync::Arc;
use taskdeck_gateway::Gateway;
use taskdeck_model::{ProjectId, Task, TaskId, TaskPatch, TaskQuery, TaskStatus};
use taskdeck_query::{
    resources, Mutation, MutationCoordinator, QueryFilter, QueryKey, QueryStatus,
};

/// Result of a drop
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Target equals the current status; nothing was written
    Unchanged,
    /// The server accepted the move
    Moved(Task),
}

impl DropOutcome {
    /// Whether a write happened
    #[inline]
    #[must_use]
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }
}

/// Board controller for one project
pub struct KanbanController {
    gateway: Gateway,
    coordinator: MutationCoordinator,
    project: ProjectId,
    move_task: Mutation,
    drag: Mutex<DragMachine>,
}

impl KanbanController {
    /// Controller for `project` with its own move mutation
    #[must_use]
    pub fn new(gateway: Gateway, coordinator: MutationCoordinator, project: ProjectId) -> Self {
        Self {
            gateway,
            coordinator,
            project,
            move_task: move_mutation(),
            drag: Mutex::new(DragMachine::new()),
        }
    }

    /// Use `mutation` for status updates.
    ///
    /// Controllers sharing one mutation share its pending state, so a move
    /// started on one board is refused on another until it settles.
    #[must_use]
    pub fn with_move_mutation(mut self, mutation: Mutation) -> Self {
        self.move_task = mutation;
        self
    }

    /// Project shown on the board
    #[inline]
    #[must_use]
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Cache key of the project's task list
    #[must_use]
    pub fn tasks_key(&self) -> QueryKey {
        resources::tasks(&TaskQuery::new().for_project(self.project.clone()))
    }

    /// The status-update mutation, for observing its pending state
    #[inline]
    #[must_use]
    pub fn move_mutation(&self) -> &Mutation {
        &self.move_task
    }

    /// Read the project's tasks through the cache and group them.
    ///
    /// # Errors
    /// [`BoardError::Query`] when the list cannot be fetched.
    pub async fn load(&self) -> Result<Board, BoardError> {
        let query = TaskQuery::new().for_project(self.project.clone());
        let key = resources::tasks(&query);
        let gateway = self.gateway.clone();
        let tasks = self
            .coordinator
            .cache()
            .get(&key, move || async move { gateway.list_tasks(&query).await })
            .await?;
        Ok(Board::group(&tasks))
    }

    /// Group whatever list is cached right now, without fetching
    pub async fn board(&self) -> Board {
        match self.cached_tasks().await {
            Some(tasks) => Board::group(&tasks),
            None => Board::empty(),
        }
    }

    async fn cached_tasks(&self) -> Option<Arc<Vec<Task>>> {
        self.coordinator
            .cache()
            .peek::<Vec<Task>>(&self.tasks_key())
            .await
    }

    /// Status of `task` in the cached list, only while that list is fresh
    async fn fresh_status(&self, task: &TaskId) -> Option<TaskStatus> {
        let state = self
            .coordinator
            .cache()
            .state::<Vec<Task>>(&self.tasks_key())
            .await;
        if state.status != QueryStatus::Success {
            return None;
        }
        state
            .data?
            .iter()
            .find(|t| &t.id == task)
            .map(|t| t.status)
    }

    /// Current drag state
    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag.lock().state().clone()
    }

    /// A card was picked up
    ///
    /// # Errors
    /// [`BoardError::IllegalTransition`] if a drag is already running.
    pub fn start_drag(&self, task: TaskId) -> Result<(), BoardError> {
        self.drag.lock().apply(DragEvent::Start(task)).map(|_| ())
    }

    /// The pointer entered the column for `status`
    ///
    /// # Errors
    /// [`BoardError::IllegalTransition`] without a held card or for an
    /// unknown status.
    pub fn enter_column(&self, status: TaskStatus) -> Result<(), BoardError> {
        self.drag.lock().apply(DragEvent::Enter(status)).map(|_| ())
    }

    /// The pointer left the column
    ///
    /// # Errors
    /// [`BoardError::IllegalTransition`] when not over a column.
    pub fn leave_column(&self) -> Result<(), BoardError> {
        self.drag.lock().apply(DragEvent::Leave).map(|_| ())
    }

    /// Abort the gesture
    pub fn cancel_drag(&self) {
        // Cancel is accepted in every state
        let _ = self.drag.lock().apply(DragEvent::Cancel);
    }

    /// Release the held card. Returns `None` when it was not over a column.
    ///
    /// # Errors
    /// [`BoardError::IllegalTransition`] without a held card, otherwise as
    /// [`KanbanController::on_drop`].
    pub async fn drop_card(&self) -> Result<Option<DropOutcome>, BoardError> {
        let intent = self.drag.lock().apply(DragEvent::Drop)?;
        match intent {
            Some(intent) => self.on_drop(&intent.task, intent.target).await.map(Some),
            None => Ok(None),
        }
    }

    /// Move `task` to `target`.
    ///
    /// Skips the write when a fresh cached copy already has `target`; a
    /// stale list is never trusted. On success every task list, the task
    /// itself and the dashboard stats are invalidated before this
    /// returns.
    ///
    /// # Errors
    /// [`BoardError::UnknownColumn`] for a status without a column,
    /// [`BoardError::Mutation`] when the update fails or a move is already
    /// in flight.
    pub async fn on_drop(&self, task: &TaskId, target: TaskStatus) -> Result<DropOutcome, BoardError> {
        if !target.is_known() {
            return Err(BoardError::UnknownColumn(target));
        }
        if self.fresh_status(task).await == Some(target) {
            tracing::debug!(%task, status = %target, "drop onto current column");
            return Ok(DropOutcome::Unchanged);
        }

        let extra = [
            QueryFilter::exact(&resources::task(task)),
            QueryFilter::exact(&resources::dashboard_stats()),
        ];
        let patch = TaskPatch::status(target);
        let updated = self
            .coordinator
            .mutate_invalidating(&self.move_task, &extra, self.gateway.update_task(task, &patch))
            .await?;
        tracing::info!(%task, status = %target, "task moved");
        Ok(DropOutcome::Moved(updated))
    }
}

/// The status-update mutation a board uses unless given another
#[must_use]
pub fn move_mutation() -> Mutation {
    Mutation::new("Move task")
        .with_fallback_message("Failed to update task status")
        .invalidating(QueryFilter::resource(resources::TASKS))
}

impl std::fmt::Debug for KanbanController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KanbanController")
            .field("project", &self.project)
            .field("drag", &self.drag.lock().state())
            .finish_non_exhaustive()
    }
}
