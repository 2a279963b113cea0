//! Delegation facade
//!
//! Composes the delegate registry with the convenience calls the rest
//! of the runtime uses: enqueue on send, consumer-side draining for
//! adapter threads, and one-shot processing for the system loop.

use crate::delegate::DelegateHandler;
use crate::delegate_registry::DelegateRegistry;
use agerun_core::{Data, EventLog};
use std::rc::Rc;

pub struct Delegation {
    registry: DelegateRegistry,
    log: Rc<EventLog>,
}

impl Delegation {
    pub fn new(log: Rc<EventLog>) -> Self {
        Delegation { registry: DelegateRegistry::new(), log }
    }

    /// Register a delegate under a negative id; the registry takes
    /// ownership.
    pub fn register_delegate(&mut self, id: i64, handler: Box<dyn DelegateHandler>) -> bool {
        let registered = self.registry.register(id, handler);
        if !registered {
            self.log.error(format!("delegate registration failed for id {id}"));
        }
        registered
    }

    pub fn unregister_delegate(&mut self, id: i64) -> bool {
        self.registry.unregister(id).is_some()
    }

    pub fn is_registered(&self, id: i64) -> bool {
        self.registry.contains(id)
    }

    pub fn delegate_type(&self, id: i64) -> Option<&str> {
        self.registry.delegate_type(id)
    }

    /// Enqueue `message` for delegate `id`. An unknown id drops the
    /// message and records a warning.
    pub fn send_to_delegate(&mut self, id: i64, sender_id: i64, message: Data) -> bool {
        if self.registry.enqueue(id, sender_id, message) {
            true
        } else {
            self.log.warning(format!("send: no delegate registered at id {id}"));
            false
        }
    }

    pub fn delegate_has_messages(&self, id: i64) -> bool {
        self.registry.has_messages(id)
    }

    /// Consumer-side dequeue, for hosts that run delegates on adapter
    /// threads. Returns `(sender_id, message)`, transferring ownership.
    pub fn take_delegate_message(&mut self, id: i64) -> Option<(i64, Data)> {
        self.registry.take_message(id)
    }

    /// True when any delegate has a pending message.
    pub fn has_pending(&self) -> bool {
        self.registry.first_with_message().is_some()
    }

    /// Pop and handle one pending delegate message (registration
    /// order). Returns `(delegate_id, sender_id, response)`.
    pub fn process_next_message(&mut self) -> Option<(i64, i64, Data)> {
        let id = self.registry.first_with_message()?;
        let (sender_id, message) = self.registry.take_message(id)?;
        let handler = self.registry.handler_mut(id)?;
        let response = handler.handle_message(&message, sender_id);
        tracing::trace!(delegate_id = id, sender_id, "delegate message handled");
        Some((id, sender_id, response))
    }

    pub fn delegate_count(&self) -> usize {
        self.registry.len()
    }
}
