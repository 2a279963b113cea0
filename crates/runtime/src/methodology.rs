//! Methodology: the method store
//!
//! Methods are keyed by `(name, version)`; registering the same
//! identity again replaces the earlier entry. Lookup is exact or
//! latest-by-semver. A method referenced by a live agent cannot be
//! unregistered.

use crate::method::{Method, Version};
use crate::registry::AgentRegistry;
use std::rc::Rc;

#[derive(Default)]
pub struct Methodology {
    // Registration order, for deterministic persistence
    methods: Vec<Rc<Method>>,
}

impl Methodology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compiled method, replacing any entry with the same
    /// identity. Returns the shared handle agents will reference.
    pub fn register(&mut self, method: Method) -> Rc<Method> {
        let handle = Rc::new(method);
        let identity = (handle.name().to_string(), handle.version());
        self.methods
            .retain(|existing| (existing.name().to_string(), existing.version()) != identity);
        self.methods.push(handle.clone());
        handle
    }

    pub fn get(&self, name: &str, version: Version) -> Option<Rc<Method>> {
        self.methods
            .iter()
            .find(|method| method.name() == name && method.version() == version)
            .cloned()
    }

    /// The highest-versioned method with the given name.
    pub fn latest(&self, name: &str) -> Option<Rc<Method>> {
        self.methods
            .iter()
            .filter(|method| method.name() == name)
            .max_by_key(|method| method.version())
            .cloned()
    }

    /// Remove a method. Fails when the identity is unknown or a live
    /// agent still references it.
    pub fn unregister(&mut self, name: &str, version: Version, agents: &AgentRegistry) -> bool {
        let registered = self
            .methods
            .iter()
            .any(|method| method.name() == name && method.version() == version);
        if !registered {
            return false;
        }

        let in_use = agents
            .iter()
            .any(|agent| agent.method().name() == name && agent.method().version() == version);
        if in_use {
            return false;
        }

        self.methods
            .retain(|method| !(method.name() == name && method.version() == version));
        true
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Methods in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<Method>> {
        self.methods.iter()
    }
}
