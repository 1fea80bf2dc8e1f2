use http::Method;

use crate::router::Router;
use crate::server::{Request, Response};

/// Work deferred until the action and its post filters have finished.
pub type ShutdownCallback = Box<dyn FnOnce() + Send>;

/// Per-request view handed to actions and filters.
pub struct ActionContext<'a> {
    pub request: &'a dyn Request,
    pub response: &'a mut Response,
    router: &'a Router,
    action: &'a str,
    permissions: Option<&'a [String]>,
    callbacks: &'a mut Vec<ShutdownCallback>,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        request: &'a dyn Request,
        response: &'a mut Response,
        router: &'a Router,
        action: &'a str,
        permissions: Option<&'a [String]>,
        callbacks: &'a mut Vec<ShutdownCallback>,
    ) -> Self {
        Self {
            request,
            response,
            router,
            action,
            permissions,
            callbacks,
        }
    }

    /// Action being dispatched.
    pub fn action(&self) -> &str {
        self.action
    }

    /// ACL of the matched route, if it declared one.
    pub fn permissions(&self) -> Option<&[String]> {
        self.permissions
    }

    pub fn router(&self) -> &Router {
        self.router
    }

    /// Build a GET link; see [`Router::create_link`].
    pub fn link(&self, controller: &str, action: &str, args: &[(&str, &str)]) -> Option<String> {
        self.router.create_link(controller, action, args, &Method::GET)
    }

    /// Run `callback` after the post filters, on the success path only.
    pub fn defer(&mut self, callback: impl FnOnce() + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }
}
