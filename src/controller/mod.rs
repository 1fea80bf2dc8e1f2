//! # Controller Module
//!
//! Controllers are registered by name in a [`ControllerRegistry`] and instantiated once per
//! request. The dispatcher asks the instance whether it knows the resolved action, collects its
//! filters and then calls the action with the positional arguments extracted from the path
//! (plus decoded body parameters for non-GET requests).
//!
//! ```rust,ignore
//! struct UserController;
//!
//! impl Controller for UserController {
//!     fn has_action(&self, action: &str) -> bool {
//!         matches!(action, "edit" | "show")
//!     }
//!
//!     fn filters(&self) -> Vec<FilterSpec> {
//!         vec![FilterSpec::new("auth").arg("edit")]
//!     }
//!
//!     fn call(&mut self, action: &str, args: &[Value], cx: &mut ActionContext<'_>)
//!         -> Result<Value, ControllerError>
//!     {
//!         let id = args.first().and_then(Value::as_str).unwrap_or_default();
//!         cx.defer(|| tracing::info!("audit flushed"));
//!         Ok(json!({ "id": id, "action": action }))
//!     }
//! }
//! ```

mod context;
mod registry;

use serde_json::Value;

use crate::error::ControllerError;
use crate::filter::FilterSpec;

pub use context::{ActionContext, ShutdownCallback};
pub use registry::{ControllerFactory, ControllerRegistry};

/// A set of actions addressable by the router.
pub trait Controller {
    /// Whether `action` is a declared action of this controller.
    fn has_action(&self, action: &str) -> bool;

    /// Whether the controller accepts actions it does not declare (catch-all handler).
    fn handles_any(&self) -> bool {
        false
    }

    /// Filters wrapped around every action, in execution order.
    fn filters(&self) -> Vec<FilterSpec> {
        Vec::new()
    }

    /// Run an action. Returning [`ControllerError::Conflict`] makes the dispatcher retry.
    fn call(
        &mut self,
        action: &str,
        args: &[Value],
        cx: &mut ActionContext<'_>,
    ) -> Result<Value, ControllerError>;
}
