//! # edge-router
//!
//! **edge-router** is the request-dispatch core of an MVC web framework. It maps an incoming
//! request to a controller/action pair, runs the controller's filters around the action,
//! retries the action on transient transaction conflicts and translates every failure into
//! a fully formed HTTP response.
//!
//! ## Architecture
//!
//! - **[`config`]** - Route table and application configuration (YAML, JSON or TOML)
//! - **[`router`]** - Pattern matching with `:placeholders` and `/*` greedy tails, plus link
//!   generation as the inverse of matching
//! - **[`filter`]** - Pre/post filter chains with short-circuit support
//! - **[`controller`]** - Controller contract, per-action context and the controller registry
//! - **[`dispatcher`]** - Orchestrates resolution, filters, the retry loop and error handling
//! - **[`server`]** - Request, response and body transformer collaborators
//! - **[`database`]** - Transaction collaborator consulted on failure
//! - **[`telemetry`]** - `tracing` subscriber setup
//! - **[`runtime_config`]** - Environment overrides for the retry policy
//! - **[`ids`]** - ULID request identifiers
//! - **[`cli`]** - `edge-router` command for inspecting route tables
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Dispatcher
//!     participant Router
//!     participant Filters as Filter Chain
//!     participant Controller
//!
//!     Client->>Dispatcher: GET /user/edit/42
//!     Dispatcher->>Router: resolve(GET, "/user/edit/42")
//!     alt No Route Match
//!         Router-->>Dispatcher: None
//!         Dispatcher-->>Client: 404 (not-found handler)
//!     end
//!     Router-->>Dispatcher: User::edit ["42"]
//!     Dispatcher->>Filters: pre_process
//!     alt Filter halts
//!         Filters-->>Dispatcher: Halt
//!     else Continue
//!         loop up to 20 attempts while Conflict
//!             Dispatcher->>Controller: call("edit", ["42"])
//!         end
//!     end
//!     Dispatcher->>Filters: post_process
//!     Dispatcher->>Dispatcher: shutdown callbacks
//!     Dispatcher-->>Client: 200 (encoded body)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use edge_router::config::load_config;
//! use edge_router::dispatcher::Dispatcher;
//! use edge_router::server::IncomingRequest;
//! use http::Method;
//!
//! let config = load_config("config/app.yaml")?;
//! let dispatcher = Dispatcher::builder(config)
//!     .controller("Home", || HomeController)
//!     .controller("Errors", || ErrorsController)
//!     .build()?;
//!
//! let mut sent = Vec::new();
//! let response = dispatcher.dispatch(&IncomingRequest::new(Method::GET, "/"), &mut sent);
//! assert_eq!(response.status, 200);
//! ```

pub mod cli;
pub mod config;
pub mod controller;
pub mod database;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod ids;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod telemetry;

pub use config::{load_config, AppConfig, RouteTable};
pub use controller::{ActionContext, Controller};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{BuildError, ControllerError, DispatchError};
pub use filter::{Filter, Flow};
pub use router::Router;
