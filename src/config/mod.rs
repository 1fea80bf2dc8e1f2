//! # Configuration Module
//!
//! Loads the route table and the process-wide application settings.
//!
//! ## Format
//!
//! ```yaml
//! not_found: [Errors, notFound]
//! server_error: [Errors, serverError]
//! retry: { max_attempts: 20, delay_us: 100 }
//! routes:
//!   GET:
//!     /: [Home, index]
//!     /user/edit/:id: { controller: User, action: edit, acl: [user.edit] }
//!     /user/display/:id/*: [User, show]
//!   POST:
//!     /rest/api/:id: [Home, post]
//!   "*":
//!     /api/update/:id: [Home, test]
//! ```
//!
//! YAML, JSON and TOML are accepted; the format follows the file extension. Route maps are read
//! in document order because the first matching pattern wins.

mod load;
mod types;

pub use load::{load_config, parse_config, ConfigFormat};
pub use types::{Acl, AppConfig, HandlerRef, MethodKey, RouteEntry, RouteTable};
