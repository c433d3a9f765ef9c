//! Session-expiry redirect policy
//!
//! A 401 from any request sends the user to the login view, once per
//! navigation, and never while the login view is already showing.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default login route
pub const LOGIN_PATH: &str = "/login";

/// Navigation seam (the router is an external collaborator)
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Path of the view currently showing
    fn current_path(&self) -> String;

    /// Navigate to `path`
    fn redirect(&self, path: &str);
}

/// Navigator for headless use: never on the login view, redirects are logged
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessNavigator;

impl Navigator for HeadlessNavigator {
    fn current_path(&self) -> String {
        "/".to_string()
    }

    fn redirect(&self, path: &str) {
        tracing::info!(path, "session expired, login required");
    }
}

/// Fires the session-expired redirect at most once per navigation
pub struct SessionGuard {
    navigator: Arc<dyn Navigator>,
    login_path: String,
    redirected: AtomicBool,
}

impl SessionGuard {
    /// Create guard
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>, login_path: impl Into<String>) -> Self {
        Self {
            navigator,
            login_path: login_path.into(),
            redirected: AtomicBool::new(false),
        }
    }

    /// Handle an authentication failure.
    ///
    /// Returns `true` if this call triggered the redirect.
    pub fn on_unauthorized(&self) -> bool {
        let current = self.navigator.current_path();
        if current.starts_with(&self.login_path) {
            tracing::debug!(%current, "401 while on login view, no redirect");
            return false;
        }
        if self.redirected.swap(true, Ordering::SeqCst) {
            return false;
        }

        tracing::warn!(from = %current, to = %self.login_path, "session expired");
        self.navigator.redirect(&self.login_path);
        true
    }

    /// A navigation happened; the next 401 may redirect again
    #[inline]
    pub fn navigated(&self) {
        self.redirected.store(false, Ordering::SeqCst);
    }

    /// Whether a redirect fired since the last navigation
    #[inline]
    #[must_use]
    pub fn has_redirected(&self) -> bool {
        self.redirected.load(Ordering::SeqCst)
    }

    /// Login route
    #[inline]
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new(Arc::new(HeadlessNavigator), LOGIN_PATH)
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("login_path", &self.login_path)
            .field("redirected", &self.has_redirected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn redirects_once_per_navigation() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .returning(|| "/dashboard".to_string());
        navigator
            .expect_redirect()
            .with(eq("/login"))
            .times(2)
            .return_const(());

        let guard = SessionGuard::new(Arc::new(navigator), LOGIN_PATH);

        assert!(guard.on_unauthorized());
        assert!(!guard.on_unauthorized());
        assert!(guard.has_redirected());

        guard.navigated();
        assert!(guard.on_unauthorized());
    }

    #[test]
    fn no_redirect_on_login_view() {
        let mut navigator = MockNavigator::new();
        navigator
            .expect_current_path()
            .returning(|| "/login?next=/tasks".to_string());
        navigator.expect_redirect().never();

        let guard = SessionGuard::new(Arc::new(navigator), LOGIN_PATH);
        assert!(!guard.on_unauthorized());
        assert!(!guard.has_redirected());
    }
}
