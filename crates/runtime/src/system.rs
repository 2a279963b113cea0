//! System: the cooperative scheduling loop
//!
//! Owns the methodology, the agent registry, and the delegation
//! facade, and drives everything from `step()`: exactly one message is
//! processed per step. Pending delegate messages are serviced before
//! agent messages; among agents, the first one in insertion order with
//! a non-empty queue wins. Errors raised while evaluating a method are
//! local — the step still counts as handled and the loop moves on.

use crate::agent::{LIFECYCLE_DESTROY, is_lifecycle};
use crate::delegate::DelegateHandler;
use crate::delegation::Delegation;
use crate::evaluator::{Services, evaluate_instruction};
use crate::frame::Frame;
use crate::methodology::Methodology;
use crate::registry::AgentRegistry;
use agerun_core::{Data, EventLog};
use std::rc::Rc;

pub struct System {
    log: Rc<EventLog>,
    methodology: Methodology,
    agents: AgentRegistry,
    delegation: Delegation,
}

impl System {
    pub fn new() -> Self {
        Self::with_log(Rc::new(EventLog::new()))
    }

    pub fn with_log(log: Rc<EventLog>) -> Self {
        System {
            methodology: Methodology::new(),
            agents: AgentRegistry::new(),
            delegation: Delegation::new(log.clone()),
            log,
        }
    }

    pub fn log(&self) -> &Rc<EventLog> {
        &self.log
    }

    pub fn methodology(&self) -> &Methodology {
        &self.methodology
    }

    pub fn methodology_mut(&mut self) -> &mut Methodology {
        &mut self.methodology
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn delegation(&self) -> &Delegation {
        &self.delegation
    }

    pub fn delegation_mut(&mut self) -> &mut Delegation {
        &mut self.delegation
    }

    /// Compile and register a method; false when the source or
    /// version does not parse (diagnostics on the event log).
    pub fn compile_method(&mut self, name: &str, source: &str, version: &str) -> bool {
        match crate::method::Method::compile(name, source, version, &self.log) {
            Some(method) => {
                self.methodology.register(method);
                true
            }
            None => false,
        }
    }

    /// Spawn an agent; `context` must be an owned map (or any map
    /// snapshot the host built). Returns the new positive id.
    pub fn spawn(&mut self, name: &str, version: &str, context: Data) -> Option<i64> {
        self.agents.spawn(&self.methodology, &self.log, name, version, context)
    }

    /// Request agent destruction; the `__destroy__` lifecycle message
    /// is processed before the agent disappears.
    pub fn destroy_agent(&mut self, id: i64) -> bool {
        self.agents.begin_destroy(id)
    }

    pub fn register_delegate(&mut self, id: i64, handler: Box<dyn DelegateHandler>) -> bool {
        self.delegation.register_delegate(id, handler)
    }

    /// Host-side send: routes by id sign exactly like the `send`
    /// instruction, with sender id 0.
    pub fn deliver(&mut self, target: i64, message: Data) -> bool {
        if target == 0 {
            false
        } else if target > 0 {
            self.agents.deliver(target, message)
        } else {
            self.delegation.send_to_delegate(target, 0, message)
        }
    }

    /// Process at most one pending message. Returns true iff a
    /// message was processed (delegate or agent), false when idle.
    pub fn step(&mut self) -> bool {
        // Delegates first: handle one queued request and route the
        // response map back to the sending agent.
        if let Some((delegate_id, sender_id, response)) = self.delegation.process_next_message() {
            if sender_id > 0 && !self.agents.deliver(sender_id, response) {
                self.log.warning(format!(
                    "delegate {delegate_id} response dropped: sender {sender_id} is gone"
                ));
            }
            return true;
        }

        let Some(agent_id) = self.agents.first_with_message() else {
            return false;
        };
        let Some(agent) = self.agents.get_mut(agent_id) else {
            return false;
        };
        let Some(message) = agent.pop_message() else {
            return false;
        };

        // Check the memory map out of the agent so the evaluators can
        // reach the registries (including this agent's own queue)
        // while the frame holds memory mutably.
        let mut memory = agent.checkout_memory();
        let context = agent.context_handle();
        let method = agent.method().clone();

        tracing::debug!(agent_id, method = method.name(), "processing message");
        let log = self.log.clone();
        match Frame::new(&mut memory, &context, &message) {
            Some(mut frame) => {
                let mut services = Services {
                    methodology: &mut self.methodology,
                    agents: &mut self.agents,
                    delegation: &mut self.delegation,
                    log: &log,
                    self_id: agent_id,
                };
                for instruction in method.instructions() {
                    // Instruction failures are local; keep going
                    evaluate_instruction(&mut services, &mut frame, instruction);
                }
            }
            None => {
                log.error(format!("agent {agent_id}: could not bind execution frame"));
            }
        }

        let was_destroy = is_lifecycle(&message, LIFECYCLE_DESTROY);
        if let Some(agent) = self.agents.get_mut(agent_id) {
            agent.restore_memory(memory);
            if was_destroy && agent.is_dying() {
                self.agents.remove(agent_id);
                tracing::debug!(agent_id, "agent torn down");
            }
        }

        true
    }

    /// Step until idle; returns the number of messages processed.
    pub fn run_until_idle(&mut self) -> usize {
        let mut processed = 0;
        while self.step() {
            processed += 1;
        }
        processed
    }

    /// Persist the methodology and agency snapshots.
    pub fn save_state(
        &self,
        methodology_path: &std::path::Path,
        agency_path: &std::path::Path,
    ) -> Result<(), crate::store::StoreError> {
        crate::store::save_methodology(&self.methodology, methodology_path)?;
        crate::store::save_agents(&self.agents, agency_path)
    }

    /// Load both snapshots (methodology first, so restored agents can
    /// resolve their methods). Returns `(methods, agents)` counts.
    pub fn load_state(
        &mut self,
        methodology_path: &std::path::Path,
        agency_path: &std::path::Path,
    ) -> Result<(usize, usize), crate::store::StoreError> {
        let methods =
            crate::store::load_methodology(&mut self.methodology, &self.log, methodology_path)?;
        let agents = crate::store::load_agents(
            &mut self.agents,
            &self.methodology,
            &self.log,
            agency_path,
        )?;
        Ok((methods, agents))
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}
