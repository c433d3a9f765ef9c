//! Testing utilities for TaskDeck workspace
//!
//! Shared fixtures, a scripted transport and proptest strategies.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use taskdeck_gateway::{
    ApiRequest, ApiResponse, Gateway, Method, Navigator, Transport, TransportError,
};
use taskdeck_model::{
    Priority, Project, ProjectId, ProjectLink, ProjectRef, Task, TaskId, TaskStatus, UserId,
    UserRef,
};

// Fixtures

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

/// Reference "now" used across fixtures
pub fn fixed_now() -> DateTime<Utc> {
    at(2026, 3, 11, 12, 0)
}

pub fn task(id: &str, status: TaskStatus, priority: Priority) -> Task {
    Task {
        id: TaskId::new(id),
        title: format!("Task {id}"),
        description: String::new(),
        status,
        priority,
        due_date: fixed_now(),
        project: None,
        assignee: None,
    }
}

pub fn task_due(id: &str, status: TaskStatus, due_date: DateTime<Utc>) -> Task {
    Task {
        due_date,
        ..task(id, status, Priority::Medium)
    }
}

pub fn task_in(id: &str, project: &str, status: TaskStatus) -> Task {
    Task {
        project: Some(ProjectLink::Populated(ProjectRef {
            id: ProjectId::new(project),
            title: Some(format!("Project {project}")),
        })),
        ..task(id, status, Priority::Medium)
    }
}

pub fn assigned(mut task: Task, user_id: Option<&str>, name: &str, email: &str) -> Task {
    task.assignee = Some(UserRef {
        id: user_id.map(UserId::new),
        name: Some(name.to_string()),
        email: Some(email.to_string()),
    });
    task
}

pub fn project(id: &str, title: &str) -> Project {
    Project {
        id: ProjectId::new(id),
        title: title.to_string(),
        description: format!("About {title}"),
        created_at: at(2026, 1, 5, 9, 0),
        updated_at: None,
    }
}

pub fn project_described(id: &str, title: &str, description: &str) -> Project {
    Project {
        description: description.to_string(),
        ..project(id, title)
    }
}

/// Wrap a payload in the `{ data }` success envelope
pub fn envelope(data: Value) -> String {
    json!({ "data": data }).to_string()
}

pub fn task_json(task: &Task) -> Value {
    serde_json::to_value(task).unwrap()
}

pub fn tasks_json(tasks: &[Task]) -> Value {
    serde_json::to_value(tasks).unwrap()
}

pub fn projects_json(projects: &[Project]) -> Value {
    serde_json::to_value(projects).unwrap()
}

pub fn stats_json(total: u64, completed: u64, in_progress: u64, todo: u64) -> Value {
    json!({
        "total": total,
        "completed": completed,
        "inProgress": in_progress,
        "todo": todo,
        "highPriority": 0,
        "dueThisWeek": 0,
    })
}

// Scripted transport

type Reply = Result<ApiResponse, TransportError>;

/// Transport answering from a script keyed by method and path.
///
/// Replies for a route are consumed in order; the last one repeats.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<ApiRequest>>,
    delay: Option<Duration>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script a 200 reply carrying `data` in the envelope
    pub fn ok(&self, method: Method, path: &str, data: Value) -> &Self {
        self.reply(method, path, Ok(ApiResponse::new(200, envelope(data))))
    }

    /// Script an error status with a `{ message }` body
    pub fn status(&self, method: Method, path: &str, status: u16, message: &str) -> &Self {
        let body = json!({ "message": message }).to_string();
        self.reply(method, path, Ok(ApiResponse::new(status, body)))
    }

    /// Script a transport failure
    pub fn fail(&self, method: Method, path: &str, error: TransportError) -> &Self {
        self.reply(method, path, Err(error))
    }

    pub fn reply(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Every request seen, in order
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().clone()
    }

    /// Requests seen for one route
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }

    pub fn last(&self, method: Method, path: &str) -> Option<ApiRequest> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|request| request.method == method && request.path == path)
            .cloned()
    }

    fn next_reply(&self, request: &ApiRequest) -> Reply {
        let mut routes = self.routes.lock();
        match routes.get_mut(&(request.method, request.path.clone())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Ok(ApiResponse::new(404, r#"{"message":"Not found"}"#)),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.calls.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply(request)
    }
}

/// Gateway over a fresh shared fake transport
pub fn fake_gateway() -> (Gateway, Arc<FakeTransport>) {
    let transport = Arc::new(FakeTransport::new());
    (Gateway::new(transport.clone()), transport)
}

/// Gateway over a fake transport that answers after `delay`
pub fn slow_gateway(delay: Duration) -> (Gateway, Arc<FakeTransport>) {
    let transport = Arc::new(FakeTransport::new().with_delay(delay));
    (Gateway::new(transport.clone()), transport)
}

// Navigation

/// Navigator that records redirects instead of performing them
#[derive(Debug)]
pub struct RecordingNavigator {
    path: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn at(path: &str) -> Arc<Self> {
        Arc::new(Self {
            path: Mutex::new(path.to_string()),
            redirects: Mutex::new(Vec::new()),
        })
    }

    pub fn set_path(&self, path: &str) {
        *self.path.lock() = path.to_string();
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.path.lock().clone()
    }

    fn redirect(&self, path: &str) {
        self.redirects.lock().push(path.to_string());
        *self.path.lock() = path.to_string();
    }
}

// Proptest strategies

pub fn any_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Todo),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Completed),
        Just(TaskStatus::Unknown),
    ]
}

pub fn any_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::Unknown),
    ]
}

/// Task due within roughly a month either side of [`fixed_now`]
pub fn arb_task() -> impl Strategy<Value = Task> {
    (any_status(), any_priority(), -30 * 24 * 60_i64..30 * 24 * 60, 0u32..10_000).prop_map(
        |(status, priority, offset_minutes, n)| Task {
            due_date: fixed_now() + chrono::Duration::minutes(offset_minutes),
            ..task(&format!("t{n}"), status, priority)
        },
    )
}

pub fn arb_tasks(max: usize) -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(arb_task(), 0..max)
}
