//! TaskDeck Query Cache
//!
//! Keyed cache of server reads plus the coordinator that runs writes and
//! keeps the cache honest afterwards.
//!
//! # Features
//!
//! - **Structural keys**: `tasks{project:p1}` equals however it was built
//! - **Request dedup**: one network fetch per key at a time
//! - **Partial invalidation**: a filter marks matching keys stale
//! - **Sticky failures**: errors are stored, not retried in a loop
//!
//! # Example
//!
//! ```rust,ignore
//! use taskdeck_query::{Mutation, MutationCoordinator, QueryCache, QueryFilter, QueryKey};
//!
//! let cache = QueryCache::new();
//! let key = QueryKey::new("projects");
//! let projects = cache.get(&key, || {
//!     let gateway = gateway.clone();
//!     async move { gateway.list_projects().await }
//! }).await?;
//!
//! let coordinator = MutationCoordinator::new(cache.clone());
//! let create = Mutation::new("Create project").invalidating(QueryFilter::resource("projects"));
//! coordinator.mutate(&create, gateway.create_project(&draft)).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod error;
pub mod key;
pub mod mutation;
pub mod resources;

pub use cache::{
    CacheConfig, CacheStats, QueryCache, QueryState, QueryStatus, RefetchPolicy, Subscription,
    DEFAULT_MAX_ENTRIES,
};
pub use error::{MutationError, QueryError};
pub use key::{QueryFilter, QueryKey};
pub use mutation::{LogNotifier, Mutation, MutationCoordinator, MutationStatus, Notifier};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for reading and writing through the cache
    pub use crate::{
        Mutation, MutationCoordinator, MutationError, QueryCache, QueryError, QueryFilter,
        QueryKey, QueryStatus,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
