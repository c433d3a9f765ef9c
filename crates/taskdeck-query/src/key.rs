//! Structured cache keys and invalidation filters

use std::collections::BTreeMap;
use std::fmt;

/// Cache key: logical resource name plus a parameter set.
///
/// Parameters live in a sorted map, so two keys built with the same
/// parameters in a different order are equal and hash identically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey {
    resource: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    /// Key for a resource without parameters
    #[inline]
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add every pair
    #[must_use]
    pub fn with_all<N, V>(mut self, params: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        for (name, value) in params {
            self.params.insert(name.into(), value.into());
        }
        self
    }

    /// Resource name
    #[inline]
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Parameter value
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// All parameters, sorted by name
    #[inline]
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource)?;
        if self.params.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}:{value}")?;
        }
        f.write_str("}")
    }
}

/// Selects cache entries to invalidate.
///
/// A filter built from a key matches every key of the same resource whose
/// parameters include the filter's parameters, so `tasks{project:p1}` also
/// matches `tasks{project:p1,status:todo}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    resource: Option<String>,
    params: BTreeMap<String, String>,
    exact: bool,
}

impl QueryFilter {
    /// Match every entry
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self {
            resource: None,
            params: BTreeMap::new(),
            exact: false,
        }
    }

    /// Match every key of a resource, whatever its parameters
    #[inline]
    #[must_use]
    pub fn resource(resource: impl Into<String>) -> Self {
        Self {
            resource: Some(resource.into()),
            params: BTreeMap::new(),
            exact: false,
        }
    }

    /// Match exactly one key
    #[inline]
    #[must_use]
    pub fn exact(key: &QueryKey) -> Self {
        Self {
            resource: Some(key.resource.clone()),
            params: key.params.clone(),
            exact: true,
        }
    }

    /// Require a parameter value
    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Whether `key` is selected
    #[must_use]
    pub fn matches(&self, key: &QueryKey) -> bool {
        if let Some(resource) = &self.resource {
            if resource != &key.resource {
                return false;
            }
        }
        if self.exact {
            return self.params == key.params;
        }
        self.params
            .iter()
            .all(|(name, value)| key.params.get(name) == Some(value))
    }
}

impl From<QueryKey> for QueryFilter {
    fn from(key: QueryKey) -> Self {
        Self {
            resource: Some(key.resource),
            params: key.params,
            exact: false,
        }
    }
}

impl From<&QueryKey> for QueryFilter {
    fn from(key: &QueryKey) -> Self {
        Self::from(key.clone())
    }
}

impl fmt::Display for QueryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            None => f.write_str("*"),
            Some(resource) => {
                let key = QueryKey {
                    resource: resource.clone(),
                    params: self.params.clone(),
                };
                if self.exact {
                    write!(f, "={key}")
                } else {
                    write!(f, "{key}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &QueryKey) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn key_equality_ignores_insertion_order() {
        let a = QueryKey::new("tasks").with("project", "p1").with("status", "todo");
        let b = QueryKey::new("tasks").with("status", "todo").with("project", "p1");

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn key_display() {
        assert_eq!(QueryKey::new("projects").to_string(), "projects");
        assert_eq!(
            QueryKey::new("tasks").with("status", "todo").with("project", "p1").to_string(),
            "tasks{project:p1,status:todo}"
        );
    }

    #[test]
    fn resource_filter_ignores_params() {
        let filter = QueryFilter::resource("tasks");

        assert!(filter.matches(&QueryKey::new("tasks")));
        assert!(filter.matches(&QueryKey::new("tasks").with("project", "X")));
        assert!(filter.matches(&QueryKey::new("tasks").with("status", "Y")));
        assert!(!filter.matches(&QueryKey::new("task").with("id", "1")));
        assert!(!filter.matches(&QueryKey::new("projects")));
    }

    #[test]
    fn key_filter_matches_superset_params() {
        let filter = QueryFilter::from(QueryKey::new("tasks").with("project", "p1"));

        assert!(filter.matches(&QueryKey::new("tasks").with("project", "p1")));
        assert!(filter.matches(&QueryKey::new("tasks").with("project", "p1").with("status", "todo")));
        assert!(!filter.matches(&QueryKey::new("tasks").with("project", "p2")));
        assert!(!filter.matches(&QueryKey::new("tasks")));
    }

    #[test]
    fn exact_filter() {
        let key = QueryKey::new("tasks").with("project", "p1");
        let filter = QueryFilter::exact(&key);

        assert!(filter.matches(&key));
        assert!(!filter.matches(&key.clone().with("status", "todo")));
    }

    #[test]
    fn all_filter() {
        assert!(QueryFilter::all().matches(&QueryKey::new("anything").with("a", "b")));
        assert_eq!(QueryFilter::all().to_string(), "*");
    }
}
