use std::collections::HashMap;

use tracing::{debug, warn};

use super::Controller;

/// Constructor closure for a controller.
pub type ControllerFactory = Box<dyn Fn() -> Box<dyn Controller> + Send + Sync>;

/// Controller names mapped to their constructors.
#[derive(Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. Registering a name twice replaces the earlier constructor.
    pub fn register<F, C>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Controller + 'static,
    {
        let boxed: ControllerFactory =
            Box::new(move || -> Box<dyn Controller> { Box::new(factory()) });
        if self.factories.insert(name.to_owned(), boxed).is_some() {
            warn!(controller = %name, "Replaced existing controller registration");
        } else {
            debug!(controller = %name, total = self.factories.len(), "Controller registered");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Construct a fresh instance.
    pub fn instantiate(&self, name: &str) -> Option<Box<dyn Controller>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
