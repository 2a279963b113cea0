//! Execution frame
//!
//! The triple an agent's method runs against: mutable memory, the
//! immutable spawn context, and the message being processed. The frame
//! borrows all three; it never owns the referents.

use agerun_core::Data;

pub struct Frame<'a> {
    memory: &'a mut Data,
    context: &'a Data,
    message: &'a Data,
}

impl<'a> Frame<'a> {
    /// Bind a frame. Memory and context must both be maps; the
    /// message may be any value.
    pub fn new(memory: &'a mut Data, context: &'a Data, message: &'a Data) -> Option<Frame<'a>> {
        if !matches!(memory, Data::Map(_)) || !matches!(context, Data::Map(_)) {
            return None;
        }
        Some(Frame { memory, context, message })
    }

    pub fn memory(&self) -> &Data {
        self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Data {
        self.memory
    }

    pub fn context(&self) -> &Data {
        self.context
    }

    pub fn message(&self) -> &Data {
        self.message
    }
}
