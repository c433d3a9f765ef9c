use pretty_assertions::assert_eq;
use std::time::Duration;
use taskdeck_board::{move_mutation, BoardError, DropOutcome, KanbanController};
use taskdeck_gateway::{Gateway, Method};
use taskdeck_model::{DashboardStats, ProjectId, Task, TaskId, TaskStatus};
use taskdeck_query::{resources, MutationCoordinator, MutationError, QueryCache, QueryStatus};
use std::sync::Arc;
use taskdeck_test_utils::{
    fake_gateway, slow_gateway, stats_json, task_in, task_json, tasks_json, FakeTransport,
};

fn controller() -> (KanbanController, QueryCache, Arc<FakeTransport>) {
    let (board, cache, transport, _gateway) = controller_with_gateway();
    (board, cache, transport)
}

fn controller_with_gateway() -> (KanbanController, QueryCache, Arc<FakeTransport>, Gateway) {
    let (gateway, transport) = fake_gateway();
    let cache = QueryCache::new();
    let coordinator = MutationCoordinator::new(cache.clone());
    let board = KanbanController::new(gateway.clone(), coordinator, ProjectId::new("p1"));
    (board, cache, transport, gateway)
}

fn moved(task: &Task, status: TaskStatus) -> Task {
    Task {
        status,
        ..task.clone()
    }
}

#[tokio::test]
async fn load_groups_cached_tasks() {
    let (board, _cache, transport) = controller();
    transport.ok(
        Method::Get,
        "/tasks",
        tasks_json(&[
            task_in("t1", "p1", TaskStatus::Todo),
            task_in("t2", "p1", TaskStatus::InProgress),
            task_in("t3", "p1", TaskStatus::Todo),
        ]),
    );

    let columns = board.load().await.unwrap();
    assert_eq!(columns.count(TaskStatus::Todo), 2);
    assert_eq!(columns.count(TaskStatus::InProgress), 1);
    assert_eq!(columns.count(TaskStatus::Completed), 0);

    let request = transport.last(Method::Get, "/tasks").unwrap();
    assert_eq!(request.param("project"), Some("p1"));

    // Second read is served from the cache
    assert_eq!(board.board().await, columns);
    board.load().await.unwrap();
    assert_eq!(transport.count(Method::Get, "/tasks"), 1);
}

#[tokio::test]
async fn same_column_drop_issues_no_write() {
    let (board, _cache, transport) = controller();
    transport.ok(Method::Get, "/tasks", tasks_json(&[task_in("t1", "p1", TaskStatus::Todo)]));
    board.load().await.unwrap();

    board.start_drag(TaskId::new("t1")).unwrap();
    board.enter_column(TaskStatus::InProgress).unwrap();
    board.enter_column(TaskStatus::Todo).unwrap();
    let outcome = board.drop_card().await.unwrap();

    assert_eq!(outcome, Some(DropOutcome::Unchanged));
    assert_eq!(transport.count(Method::Put, "/tasks/t1"), 0);
}

#[tokio::test]
async fn drop_outside_a_column_issues_no_write() {
    let (board, _cache, transport) = controller();
    transport.ok(Method::Get, "/tasks", tasks_json(&[task_in("t1", "p1", TaskStatus::Todo)]));
    board.load().await.unwrap();

    board.start_drag(TaskId::new("t1")).unwrap();
    board.enter_column(TaskStatus::Completed).unwrap();
    board.leave_column().unwrap();

    assert_eq!(board.drop_card().await.unwrap(), None);
    assert!(transport.calls().iter().all(|request| request.method == Method::Get));
}

#[tokio::test]
async fn successful_drop_invalidates_and_refetches() {
    let (board, cache, transport, gateway) = controller_with_gateway();
    let before = task_in("t1", "p1", TaskStatus::Todo);
    let after = moved(&before, TaskStatus::Completed);
    transport
        .ok(Method::Get, "/tasks", tasks_json(&[before]))
        .ok(Method::Get, "/tasks", tasks_json(&[after.clone()]));
    transport.ok(Method::Put, "/tasks/t1", task_json(&after));
    transport.ok(Method::Get, "/dashboard/stats", stats_json(1, 0, 0, 1));

    board.load().await.unwrap();
    cache
        .get(&resources::dashboard_stats(), || async move {
            gateway.dashboard_stats().await
        })
        .await
        .unwrap();

    board.start_drag(TaskId::new("t1")).unwrap();
    board.enter_column(TaskStatus::Completed).unwrap();
    let outcome = board.drop_card().await.unwrap();
    assert_eq!(outcome, Some(DropOutcome::Moved(after)));

    let put = transport.last(Method::Put, "/tasks/t1").unwrap();
    assert_eq!(put.body.unwrap()["status"], "completed");

    let state = cache.state::<Vec<Task>>(&board.tasks_key()).await;
    assert_eq!(state.status, QueryStatus::Stale);
    let stats = cache.state::<DashboardStats>(&resources::dashboard_stats()).await;
    assert_eq!(stats.status, QueryStatus::Stale);

    let columns = board.load().await.unwrap();
    assert_eq!(columns.count(TaskStatus::Completed), 1);
    assert_eq!(columns.count(TaskStatus::Todo), 0);
    assert_eq!(transport.count(Method::Get, "/tasks"), 2);
}

#[tokio::test]
async fn failed_drop_keeps_the_cached_board() {
    let (board, cache, transport) = controller();
    transport.ok(Method::Get, "/tasks", tasks_json(&[task_in("t1", "p1", TaskStatus::Todo)]));
    transport.status(Method::Put, "/tasks/t1", 400, "Invalid status transition");
    board.load().await.unwrap();

    let err = board
        .on_drop(&TaskId::new("t1"), TaskStatus::Completed)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::Mutation(MutationError::Validation { ref message }) if message == "Invalid status transition"
    ));

    let state = cache.state::<Vec<Task>>(&board.tasks_key()).await;
    assert_eq!(state.status, QueryStatus::Success);
    assert_eq!(board.board().await.count(TaskStatus::Todo), 1);
    assert!(!board.move_mutation().is_pending());
}

#[tokio::test]
async fn drop_of_uncached_task_still_writes() {
    let (board, _cache, transport) = controller();
    let updated = task_in("t9", "p1", TaskStatus::InProgress);
    transport.ok(Method::Put, "/tasks/t9", task_json(&updated));

    let outcome = board
        .on_drop(&TaskId::new("t9"), TaskStatus::InProgress)
        .await
        .unwrap();
    assert!(outcome.is_moved());
    assert_eq!(transport.count(Method::Put, "/tasks/t9"), 1);
}

#[tokio::test]
async fn illegal_gesture_is_rejected() {
    let (board, _cache, _transport) = controller();
    assert!(matches!(
        board.drop_card().await,
        Err(BoardError::IllegalTransition { .. })
    ));
    board.start_drag(TaskId::new("t1")).unwrap();
    assert!(board.start_drag(TaskId::new("t2")).is_err());
    board.cancel_drag();
    assert_eq!(board.drag_state(), taskdeck_board::DragState::Idle);
}

#[tokio::test]
async fn move_back_after_a_move_is_written() {
    let (board, _cache, transport) = controller();
    let task = task_in("t1", "p1", TaskStatus::Todo);
    transport.ok(Method::Get, "/tasks", tasks_json(&[task.clone()]));
    transport
        .ok(Method::Put, "/tasks/t1", task_json(&moved(&task, TaskStatus::InProgress)))
        .ok(Method::Put, "/tasks/t1", task_json(&task));
    board.load().await.unwrap();

    let id = TaskId::new("t1");
    let first = board.on_drop(&id, TaskStatus::InProgress).await.unwrap();
    assert!(first.is_moved());

    // The list is stale now; its Todo must not count as the current status
    let second = board.on_drop(&id, TaskStatus::Todo).await.unwrap();
    assert_eq!(second, DropOutcome::Moved(task));
    assert_eq!(transport.count(Method::Put, "/tasks/t1"), 2);
    let put = transport.last(Method::Put, "/tasks/t1").unwrap();
    assert_eq!(put.body.unwrap()["status"], "todo");
}

#[tokio::test]
async fn drop_onto_unknown_status_is_refused() {
    let (board, _cache, transport) = controller();

    let err = board
        .on_drop(&TaskId::new("t1"), TaskStatus::Unknown)
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::UnknownColumn(TaskStatus::Unknown)));
    assert!(transport.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn boards_sharing_a_move_refuse_overlapping_moves() {
    let (gateway, transport) = slow_gateway(Duration::from_millis(100));
    transport.ok(
        Method::Put,
        "/tasks/t1",
        task_json(&task_in("t1", "p1", TaskStatus::Completed)),
    );
    let coordinator = MutationCoordinator::new(QueryCache::new());
    let shared = move_mutation();
    let first = KanbanController::new(gateway.clone(), coordinator.clone(), ProjectId::new("p1"))
        .with_move_mutation(shared.clone());
    let second = KanbanController::new(gateway, coordinator, ProjectId::new("p1"))
        .with_move_mutation(shared.clone());

    let id = TaskId::new("t1");
    let (a, b) = tokio::join!(
        first.on_drop(&id, TaskStatus::Completed),
        second.on_drop(&id, TaskStatus::Completed)
    );

    let refused = [&a, &b]
        .iter()
        .filter(|result| {
            matches!(
                result,
                Err(BoardError::Mutation(MutationError::InFlight { .. }))
            )
        })
        .count();
    assert_eq!(refused, 1);
    assert!(a.is_ok() || b.is_ok());
    assert_eq!(transport.count(Method::Put, "/tasks/t1"), 1);
    assert!(!shared.is_pending());
}
