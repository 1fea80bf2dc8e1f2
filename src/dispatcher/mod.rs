//! # Dispatcher Module
//!
//! The dispatcher turns one request into exactly one written response.
//!
//! ## Request Flow
//!
//! 1. The raw URL is normalized (a single trailing `/` is dropped, an empty URL becomes `/`)
//! 2. The [`Router`](crate::Router) resolves it against the method bucket, then the `*` bucket.
//!    An unmapped URL goes straight to the not-found handler
//! 3. The controller name is capitalized, the route ACL is moved into the request context and,
//!    for non-GET requests, decoded body parameters are appended to the arguments. A JSON-RPC
//!    request replaces the action with its RPC method
//! 4. The controller is instantiated from the registry and its filters run their `pre` phase.
//!    A halting filter skips the action without failing the request
//! 5. The action runs inside the [`RetryPolicy`] loop; its result is encoded by the request's
//!    transformer into the response body
//! 6. `post` filters run, then deferred callbacks in registration order
//! 7. The response is written
//!
//! ## Error Handling
//!
//! Any error in steps 3-6 rolls back an open transaction (when a [`Transactional`] connection
//! is attached), is logged with a backtrace and is rendered by the configured handler:
//!
//! - [`ControllerError::NotFound`] and unknown actions go to the not-found handler (404)
//! - everything else goes to the server-error handler (500 unless a status was already set)
//!
//! If the server-error handler itself fails, the response degrades to a bare 500 whose body is
//! the failure message. Panics are caught at the top of [`Dispatcher::dispatch`] and handled
//! like server errors; the response's write-once flag keeps a late panic from writing twice.
//!
//! ## Example
//!
//! ```rust,ignore
//! use edge_router::{load_config, Dispatcher};
//! use edge_router::server::{IncomingRequest, Response};
//!
//! let dispatcher = Dispatcher::builder(load_config("routes.yaml")?)
//!     .controller("User", || UserController::default())
//!     .controller("Errors", || ErrorsController)
//!     .filter("auth", |args| AuthFilter::new(args))
//!     .build()?;
//!
//! let mut written: Vec<Response> = Vec::new();
//! let request = IncomingRequest::new(http::Method::GET, "/user/edit/42");
//! let response = dispatcher.dispatch(&request, &mut written);
//! assert_eq!(response.status, 200);
//! ```
//!
//! [`Transactional`]: crate::database::Transactional
//! [`ControllerError::NotFound`]: crate::ControllerError::NotFound

mod core;
mod retry;

pub use core::{Dispatcher, DispatcherBuilder};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY_US};
