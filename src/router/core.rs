//! Router core module - hot path for request routing.
//!
//! The following clippy lints are denied here to keep allocation out of the match loop:
//!
//! - `clippy::inefficient_to_string`
//! - `clippy::format_push_string`
//! - `clippy::unnecessary_to_owned`

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use http::Method;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::pattern::{build_link, RoutePattern};
use crate::config::{Acl, MethodKey, RouteEntry, RouteTable};

/// Maximum number of positional arguments before heap allocation.
pub const MAX_INLINE_ARGS: usize = 8;

/// Positional arguments extracted from a path, in placeholder order.
pub type ArgVec = SmallVec<[String; MAX_INLINE_ARGS]>;

/// A route table pattern that could not be compiled.
#[derive(Debug, Error)]
#[error("route `{method} {pattern}` failed to compile: {source}")]
pub struct RouterError {
    pub method: String,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Result of resolving a request path against the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub controller: String,
    pub action: String,
    /// Positional arguments (named placeholders first, then greedy tail segments), HTML-escaped.
    pub args: ArgVec,
    pub acl: Option<Acl>,
    /// The pattern that matched, as declared.
    pub pattern: String,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    entry: RouteEntry,
    pattern: RoutePattern,
}

impl CompiledRoute {
    fn resolved(&self, args: ArgVec) -> ResolvedRoute {
        ResolvedRoute {
            controller: self.entry.controller.clone(),
            action: self.entry.action.clone(),
            args,
            acl: self.entry.acl.clone(),
            pattern: self.entry.pattern.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Bucket {
    routes: Vec<CompiledRoute>,
    /// Raw pattern -> index, for the exact-match fast path.
    exact: HashMap<String, usize>,
}

impl Bucket {
    /// Exact key first (query string included), then patterns in declaration order.
    fn resolve(&self, path: &str) -> Option<ResolvedRoute> {
        if let Some(&idx) = self.exact.get(path) {
            return Some(self.routes[idx].resolved(ArgVec::new()));
        }
        let path = path.split_once('?').map_or(path, |(path, _query)| path);
        self.routes
            .iter()
            .find_map(|route| route.pattern.extract(path).map(|args| route.resolved(args)))
    }
}

/// Strip a single trailing `/` (except from `/` itself); an empty URL is `/`.
pub fn normalize_path(url: &str) -> &str {
    if url.is_empty() {
        return "/";
    }
    match url.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => url,
    }
}

/// Router that maps `(method, path)` to a controller action.
///
/// Every pattern is compiled when the router is built, so a malformed table fails at startup
/// rather than on the first request that reaches it.
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
    buckets: HashMap<MethodKey, Bucket>,
}

impl Router {
    /// Compile every pattern in the table.
    pub fn new(table: RouteTable) -> Result<Self, RouterError> {
        let mut buckets = HashMap::new();
        for (method, entries) in table.buckets() {
            let mut bucket = Bucket::default();
            for entry in entries {
                let pattern =
                    RoutePattern::compile(&entry.pattern).map_err(|source| RouterError {
                        method: method.to_string(),
                        pattern: entry.pattern.clone(),
                        source,
                    })?;
                bucket
                    .exact
                    .insert(entry.pattern.clone(), bucket.routes.len());
                bucket.routes.push(CompiledRoute {
                    entry: entry.clone(),
                    pattern,
                });
            }
            buckets.insert(method.clone(), bucket);
        }

        let routes_summary: Vec<String> = table
            .buckets()
            .flat_map(|(method, entries)| {
                entries
                    .iter()
                    .map(move |e| format!("{method} {} -> {}::{}", e.pattern, e.controller, e.action))
            })
            .take(10)
            .collect();
        info!(
            routes_count = table.len(),
            buckets = buckets.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Ok(Self { table, buckets })
    }

    /// The table this router was built from.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve a normalized request path.
    ///
    /// The bucket for the request's method is tried first, then the `*` bucket, so a
    /// wildcard-method route never shadows a method-specific one.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let route = router.resolve(&Method::GET, "/user/edit/42").unwrap();
    /// assert_eq!(route.action, "edit");
    /// assert_eq!(route.args.as_slice(), ["42"]);
    /// ```
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<ResolvedRoute> {
        debug!(method = %method, path = %path, "Route match attempt");
        let match_start = Instant::now();

        let result = self
            .resolve_in(&MethodKey::Exact(method.clone()), path)
            .or_else(|| self.resolve_in(&MethodKey::Any, path));

        let match_duration = match_start.elapsed();
        match &result {
            Some(route) if match_duration > Duration::from_millis(1) => warn!(
                method = %method,
                path = %path,
                route_pattern = %route.pattern,
                duration_us = match_duration.as_micros(),
                "Slow route matching detected"
            ),
            Some(route) => info!(
                method = %method,
                path = %path,
                controller = %route.controller,
                action = %route.action,
                route_pattern = %route.pattern,
                args = ?route.args,
                duration_us = match_duration.as_micros(),
                "Route matched"
            ),
            None => warn!(
                method = %method,
                path = %path,
                duration_us = match_duration.as_micros(),
                "No route matched"
            ),
        }
        result
    }

    /// Resolve against a single bucket only.
    #[must_use]
    pub fn resolve_in(&self, method: &MethodKey, path: &str) -> Option<ResolvedRoute> {
        self.buckets.get(method)?.resolve(path)
    }

    /// Build the URL that routes to `controller::action` with the given named arguments.
    ///
    /// Candidates are the `method` bucket followed by the `*` bucket entries whose pattern the
    /// method bucket does not already declare. A method with no bucket of its own gets no link. Argument keys may be written `id` or `:id`; an
    /// `anchor` argument is appended verbatim. Returns `None` when no route targets the pair.
    ///
    /// ```rust,ignore
    /// router.create_link("User", "edit", &[("id", "42")], &Method::GET);        // /user/edit/42
    /// router.create_link("Home", "index", &[("anchor", "#list")], &Method::GET); // /#list
    /// ```
    #[must_use]
    pub fn create_link(
        &self,
        controller: &str,
        action: &str,
        args: &[(&str, &str)],
        method: &Method,
    ) -> Option<String> {
        let Some(specific) = self.table.bucket(&MethodKey::Exact(method.clone())) else {
            debug!(method = %method, "No routes declared for method, no link built");
            return None;
        };
        let shared = self.table.bucket(&MethodKey::Any).unwrap_or_default();

        let entry = specific
            .iter()
            .chain(
                shared
                    .iter()
                    .filter(|w| !specific.iter().any(|e| e.pattern == w.pattern)),
            )
            .find(|e| e.controller == controller && e.action == action);

        match entry {
            Some(entry) => Some(build_link(&entry.pattern, args)),
            None => {
                debug!(controller, action, method = %method, "No route to build a link for");
                None
            }
        }
    }
}
