//! Typed REST endpoints

use crate::error::GatewayError;
use crate::gateway::{to_body, Gateway};
use crate::transport::Method;
use taskdeck_model::{
    Credentials, DashboardStats, Project, ProjectDraft, ProjectId, ProjectPatch, Registration,
    Task, TaskDraft, TaskId, TaskPatch, TaskQuery, User,
};

impl Gateway {
    // Auth

    /// `GET /auth/me`
    ///
    /// # Errors
    /// [`GatewayError::Auth`] when no session exists.
    pub async fn me(&self) -> Result<User, GatewayError> {
        self.fetch(Method::Get, "/auth/me", &[], None).await
    }

    /// `POST /auth/login`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), GatewayError> {
        let path = "/auth/login";
        let body = to_body(path, credentials)?;
        self.execute(Method::Post, path, Some(body)).await
    }

    /// `POST /auth/register`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn register(&self, registration: &Registration) -> Result<(), GatewayError> {
        let path = "/auth/register";
        let body = to_body(path, registration)?;
        self.execute(Method::Post, path, Some(body)).await
    }

    /// `POST /auth/logout`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn logout(&self) -> Result<(), GatewayError> {
        self.execute(Method::Post, "/auth/logout", None).await
    }

    // Projects

    /// `GET /projects`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn list_projects(&self) -> Result<Vec<Project>, GatewayError> {
        self.fetch(Method::Get, "/projects", &[], None).await
    }

    /// `GET /projects/:id`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn get_project(&self, id: &ProjectId) -> Result<Project, GatewayError> {
        self.fetch(Method::Get, &format!("/projects/{id}"), &[], None)
            .await
    }

    /// `POST /projects`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn create_project(&self, draft: &ProjectDraft) -> Result<Project, GatewayError> {
        let path = "/projects";
        let body = to_body(path, draft)?;
        self.fetch(Method::Post, path, &[], Some(body)).await
    }

    /// `PUT /projects/:id`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn update_project(
        &self,
        id: &ProjectId,
        patch: &ProjectPatch,
    ) -> Result<Project, GatewayError> {
        let path = format!("/projects/{id}");
        let body = to_body(&path, patch)?;
        self.fetch(Method::Put, &path, &[], Some(body)).await
    }

    /// `DELETE /projects/:id`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn delete_project(&self, id: &ProjectId) -> Result<(), GatewayError> {
        self.execute(Method::Delete, &format!("/projects/{id}"), None)
            .await
    }

    // Tasks

    /// `GET /tasks` with filters
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, GatewayError> {
        self.fetch(Method::Get, "/tasks", &query.to_params(), None)
            .await
    }

    /// `GET /tasks/:id`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn get_task(&self, id: &TaskId) -> Result<Task, GatewayError> {
        self.fetch(Method::Get, &format!("/tasks/{id}"), &[], None)
            .await
    }

    /// `POST /tasks`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, GatewayError> {
        let path = "/tasks";
        let body = to_body(path, draft)?;
        self.fetch(Method::Post, path, &[], Some(body)).await
    }

    /// `PUT /tasks/:id`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, GatewayError> {
        let path = format!("/tasks/{id}");
        let body = to_body(&path, patch)?;
        self.fetch(Method::Put, &path, &[], Some(body)).await
    }

    /// `DELETE /tasks/:id`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), GatewayError> {
        self.execute(Method::Delete, &format!("/tasks/{id}"), None)
            .await
    }

    // Dashboard

    /// `GET /dashboard/stats`
    ///
    /// # Errors
    /// Propagates gateway failures.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, GatewayError> {
        self.fetch(Method::Get, "/dashboard/stats", &[], None).await
    }
}
