//! Remote data gateway
//!
//! Single point of server communication. Wraps a [`Transport`], unwraps the
//! `{ data }` envelope, classifies failures and runs the session-expiry
//! policy. It never retries.

use crate::error::GatewayError;
use crate::session::{Navigator, SessionGuard};
use crate::transport::{ApiRequest, Method, Transport};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Remote data gateway
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
    session: Arc<SessionGuard>,
}

impl Gateway {
    /// Create gateway over a transport with headless session handling
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            session: Arc::new(SessionGuard::default()),
        }
    }

    /// Route session-expired redirects through `navigator`
    #[must_use]
    pub fn with_navigator(
        mut self,
        navigator: Arc<dyn Navigator>,
        login_path: impl Into<String>,
    ) -> Self {
        self.session = Arc::new(SessionGuard::new(navigator, login_path));
        self
    }

    /// Send a request and return the raw JSON body (`Null` for empty bodies)
    ///
    /// # Errors
    /// See [`GatewayError`] for the status mapping. A 401 additionally fires
    /// the session-expired redirect.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, GatewayError> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect(),
            body,
        };

        tracing::debug!(%method, path, params = request.params.len(), "api request");

        let response = self.transport.send(&request).await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "transport failure");
            GatewayError::Network(e.to_string())
        })?;

        if !response.is_success() {
            let err = GatewayError::from_status(response.status, &response.body);
            if err.is_auth() {
                self.session.on_unauthorized();
            }
            tracing::debug!(%method, path, status = response.status, error = %err, "api error");
            return Err(err);
        }

        if response.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| GatewayError::decode(path, e.to_string()))
    }

    /// Send a request and decode the `data` member of the envelope
    ///
    /// # Errors
    /// As [`Gateway::request`], plus [`GatewayError::Decode`] when the payload
    /// does not match `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<T, GatewayError> {
        let value = self.request(method, path, params, body).await?;
        serde_json::from_value::<Envelope<T>>(value)
            .map(|envelope| envelope.data)
            .map_err(|e| GatewayError::decode(path, e.to_string()))
    }

    /// Send a request whose response payload is not needed
    ///
    /// # Errors
    /// As [`Gateway::request`].
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), GatewayError> {
        self.request(method, path, &[], body).await.map(|_| ())
    }

    /// Tell the session policy that a navigation happened
    #[inline]
    pub fn navigated(&self) {
        self.session.navigated();
    }

    /// Session policy
    #[inline]
    #[must_use]
    pub fn session(&self) -> &SessionGuard {
        &self.session
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Serialize a request body
pub(crate) fn to_body<T: serde::Serialize>(
    path: &str,
    value: &T,
) -> Result<serde_json::Value, GatewayError> {
    serde_json::to_value(value).map_err(|e| GatewayError::decode(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockNavigator;
    use crate::transport::{ApiResponse, TransportError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct StubTransport {
        responses: Mutex<Vec<Result<ApiResponse, TransportError>>>,
        seen: Mutex<Vec<ApiRequest>>,
    }

    impl StubTransport {
        fn replying(response: Result<ApiResponse, TransportError>) -> Arc<Self> {
            let stub = Self::default();
            stub.responses.lock().push(response);
            Arc::new(stub)
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
            self.seen.lock().push(request.clone());
            self.responses
                .lock()
                .pop()
                .unwrap_or_else(|| Ok(ApiResponse::new(404, "")))
        }
    }

    #[tokio::test]
    async fn fetch_unwraps_envelope() {
        let stub = StubTransport::replying(Ok(ApiResponse::new(
            200,
            r#"{"data":{"total":3,"completed":1,"inProgress":1,"todo":1,"highPriority":1,"dueThisWeek":0}}"#,
        )));
        let gateway = Gateway::new(stub.clone());

        let stats: taskdeck_model::DashboardStats = gateway
            .fetch(Method::Get, "/dashboard/stats", &[], None)
            .await
            .unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stub.seen.lock()[0].path, "/dashboard/stats");
    }

    #[tokio::test]
    async fn shape_mismatch_is_decode_error() {
        let stub = StubTransport::replying(Ok(ApiResponse::new(200, r#"{"data":[{"oops":1}]}"#)));
        let gateway = Gateway::new(stub);

        let result: Result<Vec<taskdeck_model::Task>, _> =
            gateway.fetch(Method::Get, "/tasks", &[], None).await;

        assert!(matches!(result, Err(GatewayError::Decode { path, .. }) if path == "/tasks"));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let stub = StubTransport::replying(Err(TransportError::Timeout(
            std::time::Duration::from_secs(30),
        )));
        let gateway = Gateway::new(stub);

        let result = gateway.request(Method::Get, "/projects", &[], None).await;
        assert!(matches!(result, Err(GatewayError::Network(_))));
    }

    #[tokio::test]
    async fn unauthorized_fires_redirect() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .returning(|| "/projects".to_string());
        navigator.expect_redirect().times(1).return_const(());

        let stub = StubTransport::default();
        stub.responses.lock().push(Ok(ApiResponse::new(401, "")));
        stub.responses.lock().push(Ok(ApiResponse::new(401, "")));
        let gateway = Gateway::new(Arc::new(stub)).with_navigator(Arc::new(navigator), "/login");

        let first = gateway.request(Method::Get, "/projects", &[], None).await;
        let second = gateway.request(Method::Get, "/tasks", &[], None).await;

        assert_eq!(first, Err(GatewayError::Auth));
        assert_eq!(second, Err(GatewayError::Auth));
        assert!(gateway.session().has_redirected());
    }

    #[tokio::test]
    async fn params_and_body_are_forwarded() {
        let stub = StubTransport::replying(Ok(ApiResponse::new(204, "")));
        let gateway = Gateway::new(stub.clone());

        gateway
            .request(
                Method::Put,
                "/tasks/t1",
                &[("project", "p1".to_string())],
                Some(json!({ "status": "completed" })),
            )
            .await
            .unwrap();

        let seen = stub.seen.lock();
        assert_eq!(seen[0].method, Method::Put);
        assert_eq!(seen[0].param("project"), Some("p1"));
        assert_eq!(seen[0].body, Some(json!({ "status": "completed" })));
    }
}
