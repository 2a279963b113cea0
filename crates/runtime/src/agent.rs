//! Agents
//!
//! An agent is a message-driven execution unit: a positive id, a
//! reference to its compiled method, private memory, an immutable
//! spawn context, and a FIFO message queue. Lifecycle transitions are
//! announced to the agent itself through reserved messages.

use crate::method::Method;
use agerun_core::Data;
use std::collections::VecDeque;
use std::rc::Rc;

/// Key of the reserved lifecycle map.
pub const LIFECYCLE_KEY: &str = "__lifecycle__";
/// Lifecycle value delivered as the first message after spawn.
pub const LIFECYCLE_SPAWN: &str = "__spawn__";
/// Lifecycle value delivered as the last message before teardown.
pub const LIFECYCLE_DESTROY: &str = "__destroy__";

/// Build a `{__lifecycle__: <event>}` message.
pub fn lifecycle_message(event: &str) -> Data {
    let mut message = Data::map();
    // Root-level insert into a fresh map cannot fail
    let _ = message.set_path(LIFECYCLE_KEY, Data::from(event));
    message
}

/// True when `message` is the given lifecycle announcement.
pub fn is_lifecycle(message: &Data, event: &str) -> bool {
    message.get_path_string(LIFECYCLE_KEY) == Some(event)
}

pub struct Agent {
    id: i64,
    method: Rc<Method>,
    memory: Data,
    context: Rc<Data>,
    queue: VecDeque<Data>,
    /// Set once destruction has been requested; the agent is removed
    /// after it processes its `__destroy__` message.
    dying: bool,
}

impl Agent {
    /// `context` must already be an owned map snapshot.
    pub(crate) fn new(id: i64, method: Rc<Method>, context: Data) -> Agent {
        Agent {
            id,
            method,
            memory: Data::map(),
            context: Rc::new(context),
            queue: VecDeque::new(),
            dying: false,
        }
    }

    /// Rebuild an agent from a persisted snapshot: memory restored,
    /// context empty, queue empty, no lifecycle message.
    pub(crate) fn restored(id: i64, method: Rc<Method>, memory: Data) -> Agent {
        Agent {
            id,
            method,
            memory,
            context: Rc::new(Data::map()),
            queue: VecDeque::new(),
            dying: false,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn method(&self) -> &Rc<Method> {
        &self.method
    }

    pub fn memory(&self) -> &Data {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Data {
        &mut self.memory
    }

    pub fn context(&self) -> &Data {
        &self.context
    }

    pub(crate) fn context_handle(&self) -> Rc<Data> {
        self.context.clone()
    }

    /// Enqueue a message, taking ownership. Rejected (and dropped)
    /// once the agent is dying.
    pub fn deliver(&mut self, message: Data) -> bool {
        if self.dying {
            return false;
        }
        self.queue.push_back(message);
        true
    }

    /// Internal enqueue for lifecycle announcements; bypasses the
    /// dying check so `__destroy__` itself can be queued.
    pub(crate) fn enqueue_lifecycle(&mut self, event: &str) {
        self.queue.push_back(lifecycle_message(event));
    }

    pub fn pop_message(&mut self) -> Option<Data> {
        self.queue.pop_front()
    }

    pub fn has_messages(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    pub(crate) fn mark_dying(&mut self) {
        self.dying = true;
    }

    /// Move the memory map out for the duration of one evaluation.
    pub(crate) fn checkout_memory(&mut self) -> Data {
        std::mem::replace(&mut self.memory, Data::map())
    }

    pub(crate) fn restore_memory(&mut self, memory: Data) {
        self.memory = memory;
    }
}
