//! Dispatcher core module - per-request state machine.
//!
//! The following clippy lints are denied on the success path; the allocations that remain are
//! in error rendering:
//!
//! - `clippy::inefficient_to_string`
//! - `clippy::format_push_string`
//! - `clippy::unnecessary_to_owned`

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, error, info, info_span, warn};

use super::retry::RetryPolicy;
use crate::config::{Acl, AppConfig, HandlerRef};
use crate::controller::{ActionContext, Controller, ControllerRegistry, ShutdownCallback};
use crate::database::Transactional;
use crate::error::{BuildError, ControllerError, DispatchError};
use crate::filter::{Filter, FilterRegistry, Phase};
use crate::router::{normalize_path, ResolvedRoute, Router};
use crate::runtime_config::RuntimeConfig;
use crate::server::{Request, Response, ResponseWriter};

const NOT_FOUND_ROLE: &str = "not-found";
const SERVER_ERROR_ROLE: &str = "server-error";

/// Route target after controller normalization and argument assembly.
#[derive(Debug)]
struct Target {
    controller: String,
    action: String,
    args: Vec<Value>,
    acl: Option<Acl>,
}

/// Process-wide dispatch engine: router, registries, error handlers and retry policy.
///
/// Built once through [`Dispatcher::builder`] and shared by reference; every call to
/// [`dispatch`](Dispatcher::dispatch) owns its own request state.
pub struct Dispatcher {
    router: Router,
    controllers: ControllerRegistry,
    filters: FilterRegistry,
    not_found: HandlerRef,
    server_error: HandlerRef,
    retry: RetryPolicy,
    database: Option<Arc<dyn Transactional>>,
}

/// Collects registrations and validates them against the configuration.
pub struct DispatcherBuilder {
    config: AppConfig,
    controllers: ControllerRegistry,
    filters: FilterRegistry,
    retry: Option<RetryPolicy>,
    runtime: Option<RuntimeConfig>,
    database: Option<Arc<dyn Transactional>>,
}

impl DispatcherBuilder {
    #[must_use]
    pub fn controller<F, C>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        self.controllers.register(name, factory);
        self
    }

    #[must_use]
    pub fn filter<F, T>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(&[String]) -> T + Send + Sync + 'static,
        T: Filter + 'static,
    {
        self.filters.register(name, factory);
        self
    }

    /// Attach the connection rolled back when a dispatch fails.
    #[must_use]
    pub fn database(mut self, database: Arc<dyn Transactional>) -> Self {
        self.database = Some(database);
        self
    }

    /// Override the retry policy read from the configuration.
    #[must_use]
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Environment overrides laid over the configured retry policy. Read from the process
    /// environment when not given. Ignored when [`retry_policy`](Self::retry_policy) is set.
    #[must_use]
    pub fn runtime_config(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Compile the routes and check every name the configuration and controllers refer to.
    ///
    /// # Errors
    ///
    /// - a pattern does not compile
    /// - a route, an error handler or a declared filter names something unregistered
    /// - an error handler action is not an action of its controller
    pub fn build(self) -> Result<Dispatcher, BuildError> {
        let Self {
            config,
            controllers,
            filters,
            retry,
            runtime,
            database,
        } = self;

        for (method, entries) in config.routes.buckets() {
            for entry in entries {
                let controller = ucfirst(&entry.controller);
                if !controllers.contains(&controller) {
                    return Err(BuildError::UnknownRouteController {
                        method: method.to_string(),
                        pattern: entry.pattern.clone(),
                        controller,
                    });
                }
            }
        }

        for (role, handler) in [
            (NOT_FOUND_ROLE, &config.not_found),
            (SERVER_ERROR_ROLE, &config.server_error),
        ] {
            let instance = controllers.instantiate(&handler.controller).ok_or_else(|| {
                BuildError::UnknownHandlerController {
                    role,
                    controller: handler.controller.clone(),
                }
            })?;
            if !instance.has_action(&handler.action) && !instance.handles_any() {
                return Err(BuildError::UnknownHandlerAction {
                    role,
                    controller: handler.controller.clone(),
                    action: handler.action.clone(),
                });
            }
        }

        let mut names: Vec<&str> = controllers.names().collect();
        names.sort_unstable();
        for name in names {
            let Some(instance) = controllers.instantiate(name) else {
                continue;
            };
            if let Some(spec) = instance
                .filters()
                .into_iter()
                .find(|spec| !filters.contains(&spec.name))
            {
                return Err(BuildError::UnknownFilter {
                    controller: name.to_owned(),
                    filter: spec.name,
                });
            }
        }

        let router = Router::new(config.routes)?;
        let retry = retry.unwrap_or_else(|| {
            runtime
                .unwrap_or_else(RuntimeConfig::from_env)
                .apply(config.retry)
        });
        info!(
            controllers = controllers.len(),
            filters = filters.len(),
            max_attempts = retry.max_attempts,
            retry_delay_us = retry.delay_us,
            transactional = database.is_some(),
            "Dispatcher ready"
        );

        Ok(Dispatcher {
            router,
            controllers,
            filters,
            not_found: config.not_found,
            server_error: config.server_error,
            retry,
            database,
        })
    }
}

impl Dispatcher {
    pub fn builder(config: AppConfig) -> DispatcherBuilder {
        DispatcherBuilder {
            config,
            controllers: ControllerRegistry::new(),
            filters: FilterRegistry::new(),
            retry: None,
            runtime: None,
            database: None,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Dispatch one request and write its response through `out`.
    ///
    /// Never panics and never returns an error: every failure is rendered by the not-found
    /// or server-error handler. A panic anywhere below is caught here and rendered as a server
    /// error unless the response was already written. The returned response is the one that
    /// was written.
    pub fn dispatch(&self, request: &dyn Request, out: &mut dyn ResponseWriter) -> Response {
        let request_id = request.request_id().unwrap_or_default();
        let span = info_span!(
            "dispatch",
            request_id = %request_id,
            method = %request.http_method(),
            url = %request.request_url()
        );
        let _enter = span.enter();
        let started = Instant::now();

        let mut response = Response::new();
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.run(request, &mut response, &mut *out)));

        if let Err(payload) = outcome {
            let message = panic_message(&*payload);
            error!(
                panic_message = %message,
                backtrace = %Backtrace::force_capture(),
                "Dispatch panicked"
            );
            if !response.is_written() {
                self.rollback();
                self.handle_server_error(request, &mut response, &message);
                write_response(&mut response, out);
            }
        }

        info!(
            status = response.status.as_u16(),
            duration_ms = started.elapsed().as_millis(),
            "Request dispatched"
        );
        response
    }

    fn run(&self, request: &dyn Request, response: &mut Response, out: &mut dyn ResponseWriter) {
        let url = request.request_url();
        let path = normalize_path(url);

        let Some(route) = self.router.resolve(request.http_method(), path) else {
            let message = format!("{url} is not mapped to any route");
            error!(url = %url, "{}", message);
            self.handle_not_found(request, response, &message);
            write_response(response, out);
            return;
        };

        let result = self
            .prepare(request, route)
            .and_then(|target| self.invoke(request, response, &target));
        if let Err(err) = result {
            self.fail(request, response, err);
        }
        write_response(response, out);
    }

    fn prepare(&self, request: &dyn Request, route: ResolvedRoute) -> Result<Target, DispatchError> {
        let ResolvedRoute {
            controller,
            action,
            args,
            acl,
            ..
        } = route;

        let mut target = Target {
            controller: ucfirst(&controller),
            action,
            args: args.into_iter().map(Value::String).collect(),
            acl,
        };

        if !request.is(&Method::GET) {
            if let Some(params) = request.params()? {
                if !is_empty_params(&params) {
                    target.args.push(params);
                }
            }
            if request.is_json_rpc() {
                if let Some(method) = request.transformer().rpc_method() {
                    debug!(rpc_method = %method, "Action overridden by JSON-RPC method");
                    target.action = method.to_owned();
                }
            }
        }
        Ok(target)
    }

    fn invoke(
        &self,
        request: &dyn Request,
        response: &mut Response,
        target: &Target,
    ) -> Result<(), DispatchError> {
        let mut controller = self
            .controllers
            .instantiate(&target.controller)
            .ok_or_else(|| DispatchError::UnknownController(target.controller.clone()))?;

        if !controller.has_action(&target.action) && !controller.handles_any() {
            return Err(ControllerError::not_found(format!(
                "action `{}` not found on controller `{}`",
                target.action, target.controller
            ))
            .into());
        }

        let chain = self.filters.load(&controller.filters())?;
        let permissions = target.acl.as_deref();
        let mut callbacks: Vec<ShutdownCallback> = Vec::new();

        let proceed = {
            let mut cx = ActionContext::new(
                request,
                response,
                &self.router,
                &target.action,
                permissions,
                &mut callbacks,
            );
            chain.run(Phase::Pre, &mut cx)?
        };

        if proceed {
            let value = self.retry.run(|attempt| {
                debug!(
                    controller = %target.controller,
                    action = %target.action,
                    attempt,
                    "Invoking action"
                );
                let mut cx = ActionContext::new(
                    request,
                    response,
                    &self.router,
                    &target.action,
                    permissions,
                    &mut callbacks,
                );
                controller.call(&target.action, &target.args, &mut cx)
            })?;
            encode_into(request, response, &value)?;
        } else {
            info!(action = %target.action, "Action skipped by pre filter");
        }

        {
            let mut cx = ActionContext::new(
                request,
                response,
                &self.router,
                &target.action,
                permissions,
                &mut callbacks,
            );
            chain.run(Phase::Post, &mut cx)?;
        }

        for callback in callbacks {
            callback();
        }
        Ok(())
    }

    fn fail(&self, request: &dyn Request, response: &mut Response, err: DispatchError) {
        self.rollback();
        error!(
            error = %err,
            error_code = err.error_code(),
            backtrace = %Backtrace::force_capture(),
            "Dispatch failed"
        );
        let message = err.to_string();
        if err.is_not_found() {
            self.handle_not_found(request, response, &message);
        } else {
            self.handle_server_error(request, response, &message);
        }
    }

    fn rollback(&self) {
        let Some(database) = &self.database else {
            return;
        };
        if !database.in_transaction() {
            return;
        }
        match database.rollback() {
            Ok(()) => info!("Open transaction rolled back"),
            Err(err) => error!(error = %err, "Transaction rollback failed"),
        }
    }

    fn handle_not_found(&self, request: &dyn Request, response: &mut Response, message: &str) {
        response.status = StatusCode::NOT_FOUND;
        let args = [
            Value::String(request.request_url().to_owned()),
            Value::String(message.to_owned()),
        ];
        if let Err(err) = self.call_handler(&self.not_found, request, response, &args) {
            warn!(error = %err, "Not-found handler failed, rendering as server error");
            self.handle_server_error(request, response, &err.to_string());
        }
    }

    fn handle_server_error(&self, request: &dyn Request, response: &mut Response, message: &str) {
        if response.status == StatusCode::OK {
            response.status = StatusCode::INTERNAL_SERVER_ERROR;
        }
        let args = [Value::String(message.to_owned())];
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.call_handler(&self.server_error, request, &mut *response, &args)
        }));

        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(&*payload),
        };
        error!(error = %failure, "Server-error handler failed");
        response.status = StatusCode::INTERNAL_SERVER_ERROR;
        response.set_body_value(Value::String(failure));
    }

    fn call_handler(
        &self,
        handler: &HandlerRef,
        request: &dyn Request,
        response: &mut Response,
        args: &[Value],
    ) -> Result<(), DispatchError> {
        let mut controller = self
            .controllers
            .instantiate(&handler.controller)
            .ok_or_else(|| DispatchError::UnknownController(handler.controller.clone()))?;
        let mut callbacks: Vec<ShutdownCallback> = Vec::new();
        let value = {
            let mut cx = ActionContext::new(
                request,
                response,
                &self.router,
                &handler.action,
                None,
                &mut callbacks,
            );
            controller.call(&handler.action, args, &mut cx)?
        };
        encode_into(request, response, &value)?;
        if !callbacks.is_empty() {
            debug!(
                dropped = callbacks.len(),
                "Callbacks deferred by an error handler are not run"
            );
        }
        Ok(())
    }
}

fn encode_into(
    request: &dyn Request,
    response: &mut Response,
    value: &Value,
) -> Result<(), DispatchError> {
    let transformer = request.transformer();
    response.body = transformer.encode(value)?;
    response.set_header(CONTENT_TYPE.as_str(), transformer.content_type());
    Ok(())
}

fn write_response(response: &mut Response, out: &mut dyn ResponseWriter) {
    match response.write(out) {
        Ok(true) => debug!(status = response.status.as_u16(), "Response written"),
        Ok(false) => debug!("Response already written"),
        Err(err) => error!(error = %err, "Failed to write response"),
    }
}

fn ucfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_empty_params(params: &Value) -> bool {
    match params {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
