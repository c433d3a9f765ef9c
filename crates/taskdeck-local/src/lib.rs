//! TaskDeck Local Persistence
//!
//! Data that never leaves the device: per-task activity notes and the
//! theme preference, over a pluggable synchronous [`LocalStore`].

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod activity;
pub mod store;
pub mod theme;

pub use activity::{activity_key, ActivityEntry, ActivityLog, KEY_PREFIX, MAX_ENTRIES};
pub use store::{FileStore, LocalStore, LocalStoreError, MemoryStore};
pub use theme::{Theme, ThemePreference, UnknownTheme, THEME_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
