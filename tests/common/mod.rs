//! Shared fixtures for dispatcher integration tests.
//!
//! Controllers and filters record what they do into a [`Journal`] so tests can assert on
//! execution order without a real application around them.

#![allow(dead_code)]

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use edge_router::config::{AppConfig, HandlerRef, MethodKey, RouteEntry, RouteTable};
use edge_router::controller::{ActionContext, Controller};
use edge_router::database::Transactional;
use edge_router::dispatcher::{Dispatcher, DispatcherBuilder, RetryPolicy};
use edge_router::error::ControllerError;
use edge_router::filter::{ActionScope, Filter, FilterSpec, Flow};
use edge_router::server::{IncomingRequest, Response};
use http::Method;
use serde_json::{json, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

// ============================================================================
// Journal
// ============================================================================

pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

// ============================================================================
// Database
// ============================================================================

/// Counts rollbacks; reports an open transaction until the first rollback.
pub struct RecordingDb {
    active: AtomicBool,
    rollbacks: AtomicUsize,
}

impl RecordingDb {
    pub fn new(active: bool) -> Arc<Self> {
        Arc::new(Self {
            active: AtomicBool::new(active),
            rollbacks: AtomicUsize::new(0),
        })
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

impl Transactional for RecordingDb {
    fn in_transaction(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn rollback(&self) -> anyhow::Result<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Controllers
// ============================================================================

pub struct HomeController;

impl Controller for HomeController {
    fn has_action(&self, action: &str) -> bool {
        matches!(action, "index" | "update")
    }

    fn call(
        &mut self,
        action: &str,
        args: &[Value],
        _cx: &mut ActionContext<'_>,
    ) -> Result<Value, ControllerError> {
        match action {
            "index" => Ok(json!({ "page": "home" })),
            _ => Ok(json!({ "action": action, "args": args })),
        }
    }
}

/// Controller whose actions exercise every dispatch path.
pub struct ShopController {
    pub journal: Journal,
    pub calls: Arc<AtomicU32>,
    /// `checkout` reports this many conflicts before succeeding.
    pub conflicts: u32,
    pub filters: Vec<FilterSpec>,
}

impl ShopController {
    pub const ACTIONS: &'static [&'static str] = &[
        "checkout", "missing", "explode", "panic", "defer", "deferThenFail", "echo", "forbid",
        "link",
    ];
}

impl Controller for ShopController {
    fn has_action(&self, action: &str) -> bool {
        Self::ACTIONS.contains(&action)
    }

    fn filters(&self) -> Vec<FilterSpec> {
        self.filters.clone()
    }

    fn call(
        &mut self,
        action: &str,
        args: &[Value],
        cx: &mut ActionContext<'_>,
    ) -> Result<Value, ControllerError> {
        record(&self.journal, format!("action:{action}"));
        match action {
            "checkout" => {
                let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= self.conflicts {
                    Err(ControllerError::conflict("order row locked"))
                } else {
                    Ok(json!({ "attempts": n }))
                }
            }
            "missing" => Err(ControllerError::not_found("order 9 does not exist")),
            "explode" => Err(ControllerError::failure("payment gateway unreachable")),
            "panic" => panic!("inventory invariant violated"),
            "defer" => {
                let first = self.journal.clone();
                let second = self.journal.clone();
                cx.defer(move || record(&first, "callback:first"));
                cx.defer(move || record(&second, "callback:second"));
                Ok(json!("deferred"))
            }
            "deferThenFail" => {
                let journal = self.journal.clone();
                cx.defer(move || record(&journal, "callback:never"));
                Err(ControllerError::failure("failed after deferring"))
            }
            "echo" => Ok(json!({
                "action": cx.action(),
                "args": args,
                "acl": cx.permissions(),
            })),
            "forbid" => {
                cx.response.status = http::StatusCode::FORBIDDEN;
                Err(ControllerError::failure("not allowed"))
            }
            "link" => Ok(json!(cx.link("shop", "echo", &[("id", "7")]))),
            other => Err(ControllerError::failure(format!("unhandled {other}"))),
        }
    }
}

/// Accepts any action name.
pub struct CatchAllController;

impl Controller for CatchAllController {
    fn has_action(&self, _action: &str) -> bool {
        false
    }

    fn handles_any(&self) -> bool {
        true
    }

    fn call(
        &mut self,
        action: &str,
        _args: &[Value],
        _cx: &mut ActionContext<'_>,
    ) -> Result<Value, ControllerError> {
        Ok(json!({ "caught": action }))
    }
}

pub struct ErrorsController;

impl Controller for ErrorsController {
    fn has_action(&self, action: &str) -> bool {
        matches!(action, "notFound" | "serverError")
    }

    fn call(
        &mut self,
        action: &str,
        args: &[Value],
        _cx: &mut ActionContext<'_>,
    ) -> Result<Value, ControllerError> {
        match action {
            "notFound" => Ok(json!({ "url": args[0], "message": args[1] })),
            _ => Ok(json!({ "error": args[0] })),
        }
    }
}

/// Error pages that fail themselves.
pub struct BrokenErrorsController {
    pub panic: bool,
}

impl Controller for BrokenErrorsController {
    fn has_action(&self, action: &str) -> bool {
        matches!(action, "notFound" | "serverError")
    }

    fn call(
        &mut self,
        action: &str,
        _args: &[Value],
        _cx: &mut ActionContext<'_>,
    ) -> Result<Value, ControllerError> {
        match (action, self.panic) {
            ("notFound", _) => Err(ControllerError::failure("not-found page broke")),
            (_, true) => panic!("error page panicked"),
            (_, false) => Err(ControllerError::failure("error page broke")),
        }
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Journals both phases; optionally halts the pre phase.
pub struct RecordingFilter {
    label: &'static str,
    journal: Journal,
    halt_pre: bool,
    scope: ActionScope,
}

impl RecordingFilter {
    pub fn new(label: &'static str, journal: Journal, halt_pre: bool, args: &[String]) -> Self {
        Self {
            label,
            journal,
            halt_pre,
            scope: ActionScope::from_args(args),
        }
    }
}

impl Filter for RecordingFilter {
    fn applies_to(&self, action: &str) -> bool {
        self.scope.applies_to(action)
    }

    fn pre_process(&self, cx: &mut ActionContext<'_>) -> Result<Flow, ControllerError> {
        record(&self.journal, format!("{}:pre:{}", self.label, cx.action()));
        if self.halt_pre {
            cx.response.status = http::StatusCode::UNAUTHORIZED;
            Ok(Flow::Halt)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn post_process(&self, cx: &mut ActionContext<'_>) -> Result<Flow, ControllerError> {
        record(&self.journal, format!("{}:post:{}", self.label, cx.action()));
        Ok(Flow::Continue)
    }
}

/// Fails in the pre phase.
pub struct FailingFilter;

impl Filter for FailingFilter {
    fn pre_process(&self, _cx: &mut ActionContext<'_>) -> Result<Flow, ControllerError> {
        Err(ControllerError::failure("filter exploded"))
    }
}

// ============================================================================
// Configuration and dispatcher assembly
// ============================================================================

pub fn routes() -> RouteTable {
    let mut table = RouteTable::new()
        .route(Method::GET, "/", "home", "index")
        .route(Method::GET, "/shop/checkout", "shop", "checkout")
        .route(Method::GET, "/shop/missing", "shop", "missing")
        .route(Method::GET, "/shop/explode", "shop", "explode")
        .route(Method::GET, "/shop/panic", "shop", "panic")
        .route(Method::GET, "/shop/defer", "shop", "defer")
        .route(Method::GET, "/shop/defer-fail", "shop", "deferThenFail")
        .route(Method::GET, "/shop/forbid", "shop", "forbid")
        .route(Method::GET, "/shop/link", "shop", "link")
        .route(Method::GET, "/shop/nothing", "shop", "nothing")
        .route(Method::GET, "/shop/echo/:id/*", "shop", "echo")
        .route(Method::GET, "/any/:what", "anything", "whatever")
        .route(MethodKey::Any, "/api/update/:id", "home", "update")
        .route(MethodKey::Any, "/api/rpc", "shop", "checkout");
    table.insert(
        Method::GET,
        RouteEntry::new("/admin/:id", "shop", "echo").with_acl(["admin.read", "admin.write"]),
    );
    table
}

pub fn app_config() -> AppConfig {
    AppConfig::new(
        routes(),
        HandlerRef::new("Errors", "notFound"),
        HandlerRef::new("Errors", "serverError"),
    )
}

/// Knobs for [`build`].
pub struct Fixture {
    pub journal: Journal,
    pub calls: Arc<AtomicU32>,
    pub conflicts: u32,
    pub shop_filters: Vec<FilterSpec>,
    pub database: Option<Arc<RecordingDb>>,
    pub broken_errors: Option<bool>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self {
            journal: journal(),
            calls: Arc::new(AtomicU32::new(0)),
            conflicts: 0,
            shop_filters: Vec::new(),
            database: None,
            broken_errors: None,
        }
    }
}

impl Fixture {
    pub fn builder(&self) -> DispatcherBuilder {
        let journal = self.journal.clone();
        let calls = self.calls.clone();
        let conflicts = self.conflicts;
        let shop_filters = self.shop_filters.clone();
        let audit_journal = self.journal.clone();
        let gate_journal = self.journal.clone();

        let builder = Dispatcher::builder(app_config())
            .retry_policy(RetryPolicy::new(20, 0))
            .controller("Home", || HomeController)
            .controller("Shop", move || ShopController {
                journal: journal.clone(),
                calls: calls.clone(),
                conflicts,
                filters: shop_filters.clone(),
            })
            .controller("Anything", || CatchAllController)
            .filter("audit", move |args| {
                RecordingFilter::new("audit", audit_journal.clone(), false, args)
            })
            .filter("gate", move |args| {
                RecordingFilter::new("gate", gate_journal.clone(), true, args)
            })
            .filter("failing", |_| FailingFilter);

        let builder = match self.broken_errors {
            Some(panic) => builder.controller("Errors", move || BrokenErrorsController { panic }),
            None => builder.controller("Errors", || ErrorsController),
        };
        match &self.database {
            Some(db) => builder.database(db.clone()),
            None => builder,
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.builder().build().expect("fixture dispatcher builds")
    }
}

/// Dispatch and return the response together with everything written.
pub fn dispatch(dispatcher: &Dispatcher, request: &IncomingRequest) -> (Response, Vec<Response>) {
    let mut written = Vec::new();
    let response = dispatcher.dispatch(request, &mut written);
    (response, written)
}

pub fn get(url: &str) -> IncomingRequest {
    IncomingRequest::new(Method::GET, url)
}

pub fn body_json(response: &Response) -> Value {
    serde_json::from_str(&response.body).expect("response body is JSON")
}

// ============================================================================
// Log capture
// ============================================================================

/// Collects the messages of events at or above a level for the current thread.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

/// Install a capturing subscriber for the current thread until the guard drops.
pub fn capture_logs() -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}
