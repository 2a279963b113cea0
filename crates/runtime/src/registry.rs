//! Agent registry
//!
//! Allocates strictly increasing positive ids, keeps the id → agent
//! mapping, and iterates agents in insertion order — the order the
//! scheduler scans.

use crate::agent::{Agent, LIFECYCLE_DESTROY, LIFECYCLE_SPAWN};
use crate::method::Version;
use crate::methodology::Methodology;
use agerun_core::{Data, EventLog};
use std::collections::HashMap;

pub struct AgentRegistry {
    agents: HashMap<i64, Agent>,
    order: Vec<i64>,
    next_id: i64,
}

impl AgentRegistry {
    pub fn new() -> Self {
        AgentRegistry { agents: HashMap::new(), order: Vec::new(), next_id: 1 }
    }

    /// Create an agent running `name`/`version_text` with the given
    /// owned context map. The new agent's first queued message is the
    /// `__spawn__` lifecycle announcement. Returns the new id.
    pub fn spawn(
        &mut self,
        methodology: &Methodology,
        log: &EventLog,
        name: &str,
        version_text: &str,
        context: Data,
    ) -> Option<i64> {
        let Some(version) = Version::parse(version_text) else {
            log.error(format!("spawn: invalid version '{version_text}'"));
            return None;
        };
        let Some(method) = methodology.get(name, version) else {
            log.error(format!("spawn: unknown method '{name}' version {version}"));
            return None;
        };
        if !matches!(context, Data::Map(_)) {
            log.error("spawn: context must be a map");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;

        let mut agent = Agent::new(id, method, context);
        agent.enqueue_lifecycle(LIFECYCLE_SPAWN);
        self.agents.insert(id, agent);
        self.order.push(id);
        tracing::debug!(agent_id = id, method = name, "agent spawned");
        Some(id)
    }

    /// Re-insert a restored agent under its persisted id. Fails on a
    /// duplicate or non-positive id. Advances the id allocator past
    /// the restored id.
    pub(crate) fn insert_restored(&mut self, agent: Agent) -> bool {
        let id = agent.id();
        if id <= 0 || self.agents.contains_key(&id) {
            return false;
        }
        self.agents.insert(id, agent);
        self.order.push(id);
        if id >= self.next_id {
            self.next_id = id + 1;
        }
        true
    }

    /// Request destruction: mark the agent dying and enqueue its
    /// `__destroy__` message. The scheduler removes the agent after
    /// that message is processed.
    pub fn begin_destroy(&mut self, id: i64) -> bool {
        match self.agents.get_mut(&id) {
            Some(agent) if !agent.is_dying() => {
                agent.mark_dying();
                agent.enqueue_lifecycle(LIFECYCLE_DESTROY);
                tracing::debug!(agent_id = id, "agent destruction requested");
                true
            }
            _ => false,
        }
    }

    /// Enqueue a message to an agent; the message is dropped when the
    /// id is unknown or the agent is dying.
    pub fn deliver(&mut self, id: i64, message: Data) -> bool {
        match self.agents.get_mut(&id) {
            Some(agent) => agent.deliver(message),
            None => false,
        }
    }

    pub fn get(&self, id: i64) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn remove(&mut self, id: i64) -> Option<Agent> {
        let agent = self.agents.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(agent)
    }

    /// Agent ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.order.iter().copied()
    }

    /// Agents in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.order.iter().filter_map(|id| self.agents.get(id))
    }

    /// The first agent (insertion order) with a pending message.
    pub fn first_with_message(&self) -> Option<i64> {
        self.order
            .iter()
            .copied()
            .find(|id| self.agents.get(id).is_some_and(Agent::has_messages))
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// The id the next spawn will receive.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{LIFECYCLE_SPAWN, is_lifecycle};
    use crate::method::Method;
    use agerun_core::MemorySink;

    fn fixture() -> (Methodology, EventLog) {
        let log = EventLog::with_sink(Box::new(MemorySink::new()));
        let mut methodology = Methodology::new();
        let method = Method::compile("echo", "send(0, message)", "1.0.0", &log).unwrap();
        methodology.register(method);
        (methodology, log)
    }

    #[test]
    fn test_spawn_allocates_increasing_ids() {
        let (methodology, log) = fixture();
        let mut registry = AgentRegistry::new();

        let first = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();
        let second = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_spawn_seeds_lifecycle_message() {
        let (methodology, log) = fixture();
        let mut registry = AgentRegistry::new();
        let id = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();

        let agent = registry.get_mut(id).unwrap();
        let first_message = agent.pop_message().unwrap();
        assert!(is_lifecycle(&first_message, LIFECYCLE_SPAWN));
    }

    #[test]
    fn test_spawn_unknown_method_fails() {
        let (methodology, log) = fixture();
        let mut registry = AgentRegistry::new();
        assert!(registry.spawn(&methodology, &log, "nope", "1.0.0", Data::map()).is_none());
        assert!(registry.spawn(&methodology, &log, "echo", "9.9.9", Data::map()).is_none());
        assert!(registry.spawn(&methodology, &log, "echo", "bananas", Data::map()).is_none());
        assert!(log.last_error().is_some());
    }

    #[test]
    fn test_iteration_is_insertion_order_after_removal() {
        let (methodology, log) = fixture();
        let mut registry = AgentRegistry::new();
        let a = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();
        let b = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();
        let c = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();

        registry.remove(b);
        let ids: Vec<i64> = registry.ids().collect();
        assert_eq!(ids, vec![a, c]);

        // Removal never reuses ids
        let d = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();
        assert_eq!(d, 4);
    }

    #[test]
    fn test_deliver_to_unknown_id_drops() {
        let mut registry = AgentRegistry::new();
        assert!(!registry.deliver(42, Data::Integer(1)));
    }

    #[test]
    fn test_begin_destroy() {
        let (methodology, log) = fixture();
        let mut registry = AgentRegistry::new();
        let id = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();

        assert!(registry.begin_destroy(id));
        // Second request is a no-op
        assert!(!registry.begin_destroy(id));
        // Unknown agent
        assert!(!registry.begin_destroy(99));

        let agent = registry.get(id).unwrap();
        assert!(agent.is_dying());
        assert_eq!(agent.queue_len(), 2); // __spawn__ then __destroy__
    }

    #[test]
    fn test_first_with_message() {
        let (methodology, log) = fixture();
        let mut registry = AgentRegistry::new();
        let a = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();
        let b = registry.spawn(&methodology, &log, "echo", "1.0.0", Data::map()).unwrap();

        // Both have their spawn message; insertion order wins
        assert_eq!(registry.first_with_message(), Some(a));

        registry.get_mut(a).unwrap().pop_message();
        assert_eq!(registry.first_with_message(), Some(b));

        registry.get_mut(b).unwrap().pop_message();
        assert_eq!(registry.first_with_message(), None);
    }
}
