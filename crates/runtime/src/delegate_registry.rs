//! Delegate registry
//!
//! Keeps the id → delegate mapping for negative ids, plus a FIFO
//! queue of `(sender_id, message)` pairs per delegate. Ids are
//! host-assigned; duplicates and non-negative ids are rejected.
//! Dropping the registry drops every contained delegate and any
//! undelivered messages.

use crate::delegate::DelegateHandler;
use agerun_core::Data;
use std::collections::{HashMap, VecDeque};

struct DelegateSlot {
    handler: Box<dyn DelegateHandler>,
    queue: VecDeque<(i64, Data)>,
}

#[derive(Default)]
pub struct DelegateRegistry {
    slots: HashMap<i64, DelegateSlot>,
    order: Vec<i64>,
}

impl DelegateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delegate under `id` (< 0). Fails on a non-negative
    /// or already-registered id; the handler is dropped in that case.
    pub fn register(&mut self, id: i64, handler: Box<dyn DelegateHandler>) -> bool {
        if id >= 0 || self.slots.contains_key(&id) {
            return false;
        }
        self.slots.insert(id, DelegateSlot { handler, queue: VecDeque::new() });
        self.order.push(id);
        true
    }

    /// Remove a delegate, dropping its queued messages.
    pub fn unregister(&mut self, id: i64) -> Option<Box<dyn DelegateHandler>> {
        let slot = self.slots.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(slot.handler)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn delegate_type(&self, id: i64) -> Option<&str> {
        self.slots.get(&id).map(|slot| slot.handler.delegate_type())
    }

    /// Enqueue a message for a delegate; takes ownership. The message
    /// is dropped when the id is unknown.
    pub fn enqueue(&mut self, id: i64, sender_id: i64, message: Data) -> bool {
        match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.queue.push_back((sender_id, message));
                true
            }
            None => false,
        }
    }

    pub fn has_messages(&self, id: i64) -> bool {
        self.slots.get(&id).is_some_and(|slot| !slot.queue.is_empty())
    }

    /// Dequeue the oldest pending message for `id`.
    pub fn take_message(&mut self, id: i64) -> Option<(i64, Data)> {
        self.slots.get_mut(&id)?.queue.pop_front()
    }

    /// The first delegate (registration order) with a pending message.
    pub fn first_with_message(&self) -> Option<i64> {
        self.order
            .iter()
            .copied()
            .find(|id| self.slots.get(id).is_some_and(|slot| !slot.queue.is_empty()))
    }

    pub fn handler_mut(&mut self, id: i64) -> Option<&mut dyn DelegateHandler> {
        self.slots.get_mut(&id).map(|slot| &mut *slot.handler as &mut dyn DelegateHandler)
    }

    /// Delegate ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
