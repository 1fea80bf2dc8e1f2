use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::controller::ActionContext;
use crate::error::{ControllerError, DispatchError};

/// Whether the chain should keep going after a filter ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop the chain. In the pre phase this also skips the action.
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pre,
    Post,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
        })
    }
}

/// Cross-cutting hook wrapped around controller actions. Both phases default to pass-through.
pub trait Filter {
    fn applies_to(&self, _action: &str) -> bool {
        true
    }

    fn pre_process(&self, _cx: &mut ActionContext<'_>) -> Result<Flow, ControllerError> {
        Ok(Flow::Continue)
    }

    fn post_process(&self, _cx: &mut ActionContext<'_>) -> Result<Flow, ControllerError> {
        Ok(Flow::Continue)
    }
}

/// A filter as declared by a controller: registry name plus constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub name: String,
    pub args: Vec<String>,
}

impl FilterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Constructor closure for a filter; receives the declared arguments (empty when none).
pub type FilterFactory = Box<dyn Fn(&[String]) -> Box<dyn Filter> + Send + Sync>;

/// Filter names mapped to their constructors.
#[derive(Default)]
pub struct FilterRegistry {
    factories: HashMap<String, FilterFactory>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, T>(&mut self, name: &str, factory: F)
    where
        F: Fn(&[String]) -> T + Send + Sync + 'static,
        T: Filter + 'static,
    {
        let boxed: FilterFactory =
            Box::new(move |args: &[String]| -> Box<dyn Filter> { Box::new(factory(args)) });
        if self.factories.insert(name.to_owned(), boxed).is_some() {
            warn!(filter = %name, "Replaced existing filter registration");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate a controller's declared filters, preserving declaration order.
    pub fn load(&self, specs: &[FilterSpec]) -> Result<FilterChain, DispatchError> {
        let filters = specs
            .iter()
            .map(|spec| {
                self.factories
                    .get(&spec.name)
                    .map(|factory| factory(&spec.args))
                    .ok_or_else(|| DispatchError::UnknownFilter(spec.name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterChain { filters })
    }
}

/// Instantiated filters of one dispatch.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run one phase in declaration order, skipping filters that do not apply to the action.
    ///
    /// Returns `Ok(false)` as soon as a filter halts; later filters of the phase do not run.
    pub fn run(&self, phase: Phase, cx: &mut ActionContext<'_>) -> Result<bool, ControllerError> {
        for (idx, filter) in self.filters.iter().enumerate() {
            if !filter.applies_to(cx.action()) {
                continue;
            }
            let flow = match phase {
                Phase::Pre => filter.pre_process(cx)?,
                Phase::Post => filter.post_process(cx)?,
            };
            if flow == Flow::Halt {
                debug!(
                    phase = %phase,
                    filter_idx = idx,
                    action = %cx.action(),
                    "Filter halted the chain"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }
}
