//! # Router Module
//!
//! Path matching, argument extraction and link generation.
//!
//! ## Pattern Syntax
//!
//! - literal segments: `/user/view/1`
//! - `:name` placeholders capturing one segment of `[a-zA-Z0-9\-_.%()]`: `/user/edit/:id`
//! - a trailing `/*` capturing any number of extra segments: `/user/display/:id/*`
//!
//! ## Resolution Order
//!
//! 1. If the raw path (query string included) is literally a pattern of the bucket, that
//!    route wins with no arguments.
//! 2. Otherwise the query string is dropped and patterns are tried in declaration order.
//!    There is no "most specific wins" rule: the first pattern that matches is used.
//! 3. The request method's bucket is searched before the `*` bucket.
//!
//! ## Example
//!
//! ```rust,ignore
//! use edge_router::config::RouteTable;
//! use edge_router::router::Router;
//! use http::Method;
//!
//! let table = RouteTable::new()
//!     .route(Method::GET, "/user/edit/:id", "User", "edit")
//!     .route(Method::GET, "/user/display/:id/*", "User", "show");
//! let router = Router::new(table)?;
//!
//! let route = router.resolve(&Method::GET, "/user/display/5/extra/more").unwrap();
//! assert_eq!(route.args.as_slice(), ["5", "extra", "more"]);
//!
//! let url = router.create_link("User", "edit", &[("id", "42")], &Method::GET);
//! assert_eq!(url.as_deref(), Some("/user/edit/42"));
//! ```

mod core;
mod pattern;

pub use core::{normalize_path, ArgVec, ResolvedRoute, Router, RouterError, MAX_INLINE_ARGS};
pub use pattern::{escape_html, RoutePattern};
