//! Light/dark theme preference

use crate::store::{LocalStore, LocalStoreError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Storage key
pub const THEME_KEY: &str = "theme";

/// Color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light
    #[default]
    Light,
    /// Dark
    Dark,
}

impl Theme {
    /// Stored form
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised theme name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

/// Persisted theme choice
#[derive(Clone)]
pub struct ThemePreference {
    store: Arc<dyn LocalStore>,
}

impl ThemePreference {
    /// Preference over `store`
    #[must_use]
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Saved theme; light when absent or unreadable
    #[must_use]
    pub fn load(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(error) => {
                tracing::warn!(%error, "theme unreadable");
                Theme::default()
            }
        }
    }

    /// Save `theme`
    ///
    /// # Errors
    /// Backend failures.
    pub fn save(&self, theme: Theme) -> Result<(), LocalStoreError> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    /// Flip and save; returns the new theme
    ///
    /// # Errors
    /// Backend failures.
    pub fn toggle(&self) -> Result<Theme, LocalStoreError> {
        let next = self.load().toggled();
        self.save(next)?;
        Ok(next)
    }
}

impl fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemePreference").finish_non_exhaustive()
    }
}
