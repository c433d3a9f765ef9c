//! TaskDeck Remote Data Gateway
//!
//! The only component that talks to the REST API.
//!
//! # Architecture
//!
//! ```text
//! Query cache / mutations → Gateway → Transport (reqwest + cookie jar) → API
//!                              │
//!                              └─ 401 → SessionGuard → Navigator::redirect("/login")
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskdeck_gateway::{Gateway, HttpTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new("http://localhost:5000/api/v1", Duration::from_secs(30))?;
//! let gateway = Gateway::new(Arc::new(transport));
//!
//! let stats = gateway.dashboard_stats().await?;
//! println!("{} tasks", stats.total);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod endpoints;
pub mod error;
pub mod gateway;
pub mod session;
pub mod transport;

pub use error::{GatewayError, GENERIC_FAILURE, GENERIC_REJECTION};
pub use gateway::Gateway;
pub use session::{HeadlessNavigator, Navigator, SessionGuard, LOGIN_PATH};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport, TransportError};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the gateway
    pub use crate::{Gateway, GatewayError, HttpTransport, Method, Navigator, Transport};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
