//! TaskDeck application facade
//!
//! Owns the one shared [`QueryCache`] and hands it, through a
//! [`MutationCoordinator`], to every reader and writer:
//! - Reads go through the cache by key and fetch lazily
//! - Writes run as named [`Mutation`]s and invalidate what they touch
//! - Dashboard figures are derived from cached lists, never stored
//! - Activity notes and the theme live in the local store

use crate::config::TaskDeckConfig;
use crate::error::TaskDeckError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use taskdeck_analytics::{
    aggregate, drilldown, priority_distribution, project_members, recent_projects,
    search_projects, search_term, status_breakdown, summarize, tasks_by_day, upcoming,
    upcoming_window, weekly_series, AggregateCounts, Drilldown, MonthGrid, PriorityDistribution,
    ProjectSummary, StatusBreakdown, Window, SEARCH_RESULTS, WEEK_DAYS,
};
use taskdeck_board::{move_mutation, BoardError, DropOutcome, KanbanController};
use taskdeck_gateway::{Gateway, GatewayError, HttpTransport, Navigator};
use taskdeck_local::{ActivityEntry, ActivityLog, FileStore, LocalStore, Theme, ThemePreference};
use taskdeck_model::{
    Credentials, DashboardStats, Project, ProjectDraft, ProjectId, ProjectPatch, Registration,
    Task, TaskDraft, TaskId, TaskPatch, TaskQuery, TaskStatus, User, UserRef,
};
use taskdeck_query::{
    resources, Mutation, MutationCoordinator, Notifier, QueryCache, QueryFilter, QueryKey,
};

/// Upcoming tasks shown on the dashboard
pub const UPCOMING_LIMIT: usize = 5;

/// Named writes; each tracks its own pending state
#[derive(Debug)]
pub struct Mutations {
    /// `POST /auth/login`
    pub login: Mutation,
    /// `POST /auth/register`
    pub register: Mutation,
    /// `POST /auth/logout`
    pub logout: Mutation,
    /// `POST /projects`
    pub create_project: Mutation,
    /// `PUT /projects/:id`
    pub update_project: Mutation,
    /// `DELETE /projects/:id`
    pub delete_project: Mutation,
    /// `POST /tasks`
    pub create_task: Mutation,
    /// `PUT /tasks/:id`
    pub update_task: Mutation,
    /// `DELETE /tasks/:id`
    pub delete_task: Mutation,
    /// `PUT /tasks/:id` with a new status, shared by every board
    pub move_task: Mutation,
}

impl Default for Mutations {
    fn default() -> Self {
        let session = QueryFilter::all;
        let projects = || QueryFilter::resource(resources::PROJECTS);
        let tasks = || QueryFilter::resource(resources::TASKS);
        let stats = || QueryFilter::resource(resources::DASHBOARD_STATS);

        Self {
            login: Mutation::new("Log in")
                .with_fallback_message("Invalid credentials")
                .with_success_message("Logged in")
                .invalidating(session()),
            register: Mutation::new("Register")
                .with_fallback_message("Registration failed")
                .with_success_message("Account created")
                .invalidating(session()),
            logout: Mutation::new("Log out")
                .with_success_message("Logged out")
                .invalidating(session()),
            create_project: Mutation::new("Create project")
                .with_fallback_message("Create failed")
                .with_success_message("Project created")
                .invalidating(projects()),
            update_project: Mutation::new("Update project")
                .with_fallback_message("Update failed")
                .with_success_message("Project updated")
                .invalidating(projects()),
            delete_project: Mutation::new("Delete project")
                .with_fallback_message("Delete failed")
                .with_success_message("Project deleted")
                .invalidating(projects())
                .invalidating(tasks())
                .invalidating(stats()),
            create_task: Mutation::new("Create task")
                .with_fallback_message("Create failed")
                .with_success_message("Task created")
                .invalidating(tasks())
                .invalidating(stats()),
            update_task: Mutation::new("Update task")
                .with_fallback_message("Update failed")
                .with_success_message("Task updated")
                .invalidating(tasks())
                .invalidating(stats()),
            delete_task: Mutation::new("Delete task")
                .with_fallback_message("Delete failed")
                .with_success_message("Task deleted")
                .invalidating(tasks())
                .invalidating(stats()),
            move_task: move_mutation().invalidating(stats()),
        }
    }
}

/// Headline figures of the dashboard page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    /// Server-side counters
    pub stats: DashboardStats,
    /// Counts derived from the task list
    pub counts: AggregateCounts,
    /// Status shares of the server counters
    pub breakdown: StatusBreakdown,
    /// Priority split of the task list
    pub priorities: PriorityDistribution,
    /// Completed tasks per day, oldest first
    pub weekly: [usize; WEEK_DAYS],
    /// Open work due soon
    pub upcoming: Vec<Task>,
}

/// Deadline panel: this month's grid and the week's due tasks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingPanel {
    /// Window the tasks were requested for
    pub window: Window,
    /// Month containing today
    pub calendar: MonthGrid,
    /// Due tasks, soonest first
    pub tasks: Vec<Task>,
    /// Due tasks by local day
    pub by_day: BTreeMap<NaiveDate, Vec<Task>>,
}

/// Quick-search hits
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// Matching projects, filtered locally
    pub projects: Vec<Project>,
    /// Matching tasks, searched by the server
    pub tasks: Vec<Task>,
}

impl SearchResults {
    /// Check if nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.tasks.is_empty()
    }
}

/// Application facade
pub struct TaskDeck {
    config: TaskDeckConfig,
    gateway: Gateway,
    coordinator: MutationCoordinator,
    mutations: Mutations,
    activity: ActivityLog,
    theme: ThemePreference,
}

impl TaskDeck {
    /// Connect over HTTP with a file-backed local store
    ///
    /// # Errors
    /// [`TaskDeckError::Config`] for invalid settings, or a store error when
    /// the data directory cannot be created.
    pub fn connect(config: TaskDeckConfig) -> Result<Self, TaskDeckError> {
        config.validate()?;
        let transport = HttpTransport::new(config.api_url.clone(), config.timeout())
            .map_err(|e| TaskDeckError::Gateway(GatewayError::Config(e.to_string())))?;
        let store = FileStore::open(config.data_dir.clone())?;
        tracing::info!(api = %config.api_url, data = %config.data_dir.display(), "taskdeck ready");
        Ok(Self::with_parts(
            config,
            Gateway::new(Arc::new(transport)),
            Arc::new(store),
        ))
    }

    /// Assemble from an existing gateway and store
    #[must_use]
    pub fn with_parts(config: TaskDeckConfig, gateway: Gateway, store: Arc<dyn LocalStore>) -> Self {
        let cache = QueryCache::with_config(config.cache_config());
        Self {
            coordinator: MutationCoordinator::new(cache),
            mutations: Mutations::default(),
            activity: ActivityLog::new(Arc::clone(&store)),
            theme: ThemePreference::new(store),
            gateway,
            config,
        }
    }

    /// Report mutation outcomes through `notifier`
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.coordinator = MutationCoordinator::with_notifier(self.cache().clone(), notifier);
        self
    }

    /// Send expired sessions to the configured login path via `navigator`
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.gateway = self
            .gateway
            .with_navigator(navigator, self.config.login_path.clone());
        self
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TaskDeckConfig {
        &self.config
    }

    /// Shared query cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        self.coordinator.cache()
    }

    /// Gateway in use
    #[inline]
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Named writes, for observing pending state
    #[inline]
    #[must_use]
    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    async fn read<T, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<Arc<T>, TaskDeckError>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Gateway) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>> + Send + 'static,
    {
        let gateway = self.gateway.clone();
        Ok(self.cache().get(key, move || fetch(gateway)).await?)
    }

    // Reads

    /// Current user
    ///
    /// # Errors
    /// [`TaskDeckError::Query`]; an auth failure means no session.
    pub async fn me(&self) -> Result<Arc<User>, TaskDeckError> {
        self.read(&resources::me(), |g| async move { g.me().await })
            .await
    }

    /// All projects
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn projects(&self) -> Result<Arc<Vec<Project>>, TaskDeckError> {
        self.read(&resources::projects(), |g| async move {
            g.list_projects().await
        })
        .await
    }

    /// One project
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn project(&self, id: &ProjectId) -> Result<Arc<Project>, TaskDeckError> {
        let owned = id.clone();
        self.read(&resources::project(id), |g| async move {
            g.get_project(&owned).await
        })
        .await
    }

    /// Tasks matching `query`
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn tasks(&self, query: &TaskQuery) -> Result<Arc<Vec<Task>>, TaskDeckError> {
        let owned = query.clone();
        self.read(&resources::tasks(query), |g| async move {
            g.list_tasks(&owned).await
        })
        .await
    }

    /// One task
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn task(&self, id: &TaskId) -> Result<Arc<Task>, TaskDeckError> {
        let owned = id.clone();
        self.read(&resources::task(id), |g| async move {
            g.get_task(&owned).await
        })
        .await
    }

    /// Server-side dashboard counters
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn dashboard_stats(&self) -> Result<Arc<DashboardStats>, TaskDeckError> {
        self.read(&resources::dashboard_stats(), |g| async move {
            g.dashboard_stats().await
        })
        .await
    }

    // Derived views

    /// Dashboard figures as seen at `now`
    ///
    /// # Errors
    /// [`TaskDeckError::Query`] if either source list fails.
    pub async fn overview<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Overview, TaskDeckError> {
        let all = TaskQuery::new();
        let (tasks, stats) = tokio::join!(self.tasks(&all), self.dashboard_stats());
        let (tasks, stats) = (tasks?, stats?);

        Ok(Overview {
            stats: *stats,
            counts: aggregate(&tasks, now.with_timezone(&Utc)),
            breakdown: StatusBreakdown::from_stats(&stats),
            priorities: priority_distribution(&tasks),
            weekly: weekly_series(&tasks, now),
            upcoming: upcoming(&tasks, now, UPCOMING_LIMIT)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    /// Completed tasks per local day for the week ending today
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn weekly<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<[usize; WEEK_DAYS], TaskDeckError> {
        let tasks = self.tasks(&TaskQuery::new()).await?;
        Ok(weekly_series(&tasks, now))
    }

    /// Status shares computed from a task list rather than the counters
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn status_breakdown(&self, query: &TaskQuery) -> Result<StatusBreakdown, TaskDeckError> {
        let tasks = self.tasks(query).await?;
        Ok(status_breakdown(&tasks))
    }

    /// One summary row per project, from a single task list
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn project_summaries(&self) -> Result<Vec<ProjectSummary>, TaskDeckError> {
        let all = TaskQuery::new();
        let (projects, tasks) = tokio::join!(self.projects(), self.tasks(&all));
        Ok(summaries(&projects?, &tasks?))
    }

    /// Summary rows for the recent-projects table
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn recent_projects(&self) -> Result<Vec<ProjectSummary>, TaskDeckError> {
        let all = TaskQuery::new();
        let (projects, tasks) = tokio::join!(self.projects(), self.tasks(&all));
        Ok(summaries(recent_projects(&projects?), &tasks?))
    }

    /// People assigned to a project's tasks
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn project_members(&self, id: &ProjectId) -> Result<Vec<UserRef>, TaskDeckError> {
        let tasks = self.tasks(&TaskQuery::new().for_project(id.clone())).await?;
        Ok(project_members(&tasks))
    }

    /// Rows behind a dashboard card
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn drilldown<Tz: TimeZone>(
        &self,
        selection: Drilldown,
        now: &DateTime<Tz>,
    ) -> Result<Vec<Task>, TaskDeckError> {
        let tasks = self.tasks(&TaskQuery::new()).await?;
        Ok(drilldown(&tasks, selection, now).into_iter().cloned().collect())
    }

    /// Month grid and tasks due from today through the next seven days.
    ///
    /// The due range is filtered by the server.
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn upcoming_panel<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<UpcomingPanel, TaskDeckError> {
        let window = upcoming_window(now);
        let query = TaskQuery::new()
            .due_after(window.start)
            .due_before(window.end);
        let fetched = self.tasks(&query).await?;

        let mut tasks = fetched.to_vec();
        tasks.sort_by_key(|task| task.due_date);
        let by_day = tasks_by_day(&tasks, &now.timezone())
            .into_iter()
            .map(|(day, due)| (day, due.into_iter().cloned().collect()))
            .collect();

        Ok(UpcomingPanel {
            window,
            calendar: MonthGrid::for_date(now.date_naive()),
            tasks,
            by_day,
        })
    }

    /// Summary for one project from its own task list
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn project_summary(&self, id: &ProjectId) -> Result<ProjectSummary, TaskDeckError> {
        let query = TaskQuery::new().for_project(id.clone());
        let (project, tasks) = tokio::join!(self.project(id), self.tasks(&query));
        let project = project?;
        Ok(summarize(&project, &tasks?))
    }

    /// Quick search over projects and tasks, at most five of each.
    ///
    /// Terms shorter than two characters return nothing without a request.
    /// Projects are matched locally; tasks use the server's `search` filter.
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn search(&self, term: &str) -> Result<SearchResults, TaskDeckError> {
        if search_term(term).is_none() {
            return Ok(SearchResults::default());
        }
        let query = TaskQuery::new().with_search(term.trim());
        let (projects, tasks) = tokio::join!(self.search_projects(term), self.tasks(&query));
        Ok(SearchResults {
            projects: projects?,
            tasks: tasks?.iter().take(SEARCH_RESULTS).cloned().collect(),
        })
    }

    /// Client-side project search
    ///
    /// # Errors
    /// [`TaskDeckError::Query`].
    pub async fn search_projects(&self, term: &str) -> Result<Vec<Project>, TaskDeckError> {
        let projects = self.projects().await?;
        Ok(search_projects(&projects, term).into_iter().cloned().collect())
    }

    // Board

    /// Kanban controller for `project` sharing this cache and the move
    /// mutation
    #[must_use]
    pub fn board(&self, project: ProjectId) -> KanbanController {
        KanbanController::new(self.gateway.clone(), self.coordinator.clone(), project)
            .with_move_mutation(self.mutations.move_task.clone())
    }

    /// Move a task to `target` through its project's board
    ///
    /// # Errors
    /// [`TaskDeckError::Query`] if the task cannot be read, otherwise as
    /// [`KanbanController::on_drop`].
    pub async fn move_task(&self, id: &TaskId, target: TaskStatus) -> Result<DropOutcome, TaskDeckError> {
        if !target.is_known() {
            return Err(BoardError::UnknownColumn(target).into());
        }
        let task = self.task(id).await?;
        if task.status == target {
            return Ok(DropOutcome::Unchanged);
        }
        match task.project_id() {
            Some(project) => {
                let board = self.board(project.clone());
                board.load().await?;
                Ok(board.on_drop(id, target).await?)
            }
            None => {
                let patch = TaskPatch::status(target);
                let call = self.gateway.update_task(id, &patch);
                let extra = [QueryFilter::exact(&resources::task(id))];
                let updated = self
                    .coordinator
                    .mutate_invalidating(&self.mutations.move_task, &extra, call)
                    .await?;
                Ok(DropOutcome::Moved(updated))
            }
        }
    }

    // Writes

    /// Log in; every cached read is invalidated on success
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn login(&self, credentials: &Credentials) -> Result<(), TaskDeckError> {
        let call = self.gateway.login(credentials);
        self.coordinator.mutate(&self.mutations.login, call).await?;
        self.gateway.navigated();
        Ok(())
    }

    /// Create an account and session
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn register(&self, registration: &Registration) -> Result<(), TaskDeckError> {
        let call = self.gateway.register(registration);
        self.coordinator.mutate(&self.mutations.register, call).await?;
        self.gateway.navigated();
        Ok(())
    }

    /// End the session
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn logout(&self) -> Result<(), TaskDeckError> {
        let call = self.gateway.logout();
        Ok(self.coordinator.mutate(&self.mutations.logout, call).await?)
    }

    /// Create a project
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, TaskDeckError> {
        let call = self.gateway.create_project(draft);
        Ok(self.coordinator.mutate(&self.mutations.create_project, call).await?)
    }

    /// Update a project
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn update_project(&self, id: &ProjectId, patch: &ProjectPatch) -> Result<Project, TaskDeckError> {
        let call = self.gateway.update_project(id, patch);
        let extra = [QueryFilter::exact(&resources::project(id))];
        Ok(self
            .coordinator
            .mutate_invalidating(&self.mutations.update_project, &extra, call)
            .await?)
    }

    /// Delete a project
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn delete_project(&self, id: &ProjectId) -> Result<(), TaskDeckError> {
        let call = self.gateway.delete_project(id);
        let extra = [QueryFilter::exact(&resources::project(id))];
        Ok(self
            .coordinator
            .mutate_invalidating(&self.mutations.delete_project, &extra, call)
            .await?)
    }

    /// Create a task
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, TaskDeckError> {
        let call = self.gateway.create_task(draft);
        Ok(self.coordinator.mutate(&self.mutations.create_task, call).await?)
    }

    /// Update a task
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, TaskDeckError> {
        let call = self.gateway.update_task(id, patch);
        let extra = [QueryFilter::exact(&resources::task(id))];
        Ok(self
            .coordinator
            .mutate_invalidating(&self.mutations.update_task, &extra, call)
            .await?)
    }

    /// Delete a task
    ///
    /// # Errors
    /// [`TaskDeckError::Mutation`].
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), TaskDeckError> {
        let call = self.gateway.delete_task(id);
        let extra = [QueryFilter::exact(&resources::task(id))];
        Ok(self
            .coordinator
            .mutate_invalidating(&self.mutations.delete_task, &extra, call)
            .await?)
    }

    // Local data

    /// Activity notes for a task, newest first
    #[must_use]
    pub fn activity(&self, task: &TaskId) -> Vec<ActivityEntry> {
        self.activity.load(task)
    }

    /// Add a note; blank text is ignored
    ///
    /// # Errors
    /// [`TaskDeckError::Store`].
    pub fn comment(&self, task: &TaskId, text: &str) -> Result<Option<ActivityEntry>, TaskDeckError> {
        Ok(self.activity.append(task, text)?)
    }

    /// Saved theme
    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme.load()
    }

    /// Save a theme
    ///
    /// # Errors
    /// [`TaskDeckError::Store`].
    pub fn set_theme(&self, theme: Theme) -> Result<(), TaskDeckError> {
        Ok(self.theme.save(theme)?)
    }

    /// Flip the theme
    ///
    /// # Errors
    /// [`TaskDeckError::Store`].
    pub fn toggle_theme(&self) -> Result<Theme, TaskDeckError> {
        Ok(self.theme.toggle()?)
    }
}

fn summaries(projects: &[Project], tasks: &[Task]) -> Vec<ProjectSummary> {
    let mut by_project: HashMap<&ProjectId, Vec<Task>> = HashMap::new();
    for task in tasks {
        if let Some(project) = task.project_id() {
            by_project.entry(project).or_default().push(task.clone());
        }
    }
    projects
        .iter()
        .map(|project| {
            let tasks = by_project.get(&project.id).map_or(&[][..], Vec::as_slice);
            summarize(project, tasks)
        })
        .collect()
}

impl std::fmt::Debug for TaskDeck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDeck")
            .field("api_url", &self.config.api_url)
            .field("cache", self.cache())
            .finish_non_exhaustive()
    }
}
