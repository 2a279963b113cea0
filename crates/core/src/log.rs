//! Buffered event log
//!
//! Parsers, evaluators, and delegates report diagnostics here rather
//! than printing. Events are buffered in memory and flushed to a
//! [`LogSink`] when the buffer fills and when the log is dropped. The
//! most recent event of each severity stays retrievable after a flush,
//! which is what the parser error surface and the tests rely on.
//!
//! The log is shared by many single-threaded collaborators, so it
//! takes `&self` and keeps its state behind a `RefCell`.

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

/// Number of events buffered before a flush is forced.
pub const BUFFER_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Error,
    Warning,
    Info,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Error => "ERROR",
            EventKind::Warning => "WARNING",
            EventKind::Info => "INFO",
        }
    }
}

/// A single logged event. `position` is a byte offset into whatever
/// source text the reporter was scanning, when one applies.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub message: String,
    pub position: Option<usize>,
}

/// Receiver for flushed events.
pub trait LogSink {
    fn write(&mut self, event: &Event);
}

/// Default sink: forward flushed events to `tracing`.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&mut self, event: &Event) {
        match event.kind {
            EventKind::Error => tracing::error!(position = ?event.position, "{}", event.message),
            EventKind::Warning => tracing::warn!(position = ?event.position, "{}", event.message),
            EventKind::Info => tracing::info!(position = ?event.position, "{}", event.message),
        }
    }
}

/// Append flushed events as lines to a file. Write failures are
/// swallowed; the log has nowhere left to report them.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSink { path: path.into() }
    }
}

impl LogSink for FileSink {
    fn write(&mut self, event: &Event) {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = match event.position {
                Some(position) => {
                    writeln!(file, "{} [pos {}]: {}", event.kind.label(), position, event.message)
                }
                None => writeln!(file, "{}: {}", event.kind.label(), event.message),
            };
        }
    }
}

/// Collect flushed events in memory; the handle returned by
/// [`MemorySink::events`] stays valid after the sink moves into a log.
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Rc<RefCell<Vec<Event>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }
}

impl LogSink for MemorySink {
    fn write(&mut self, event: &Event) {
        self.events.borrow_mut().push(event.clone());
    }
}

struct Inner {
    buffer: Vec<Event>,
    last_error: Option<Event>,
    last_warning: Option<Event>,
    last_info: Option<Event>,
    sink: Box<dyn LogSink>,
}

impl Inner {
    fn flush(&mut self) {
        for event in self.buffer.drain(..) {
            self.sink.write(&event);
        }
    }
}

/// The event log handed to parsers, evaluators, and delegates.
pub struct EventLog {
    inner: RefCell<Inner>,
}

impl EventLog {
    /// A log flushing to `tracing`.
    pub fn new() -> Self {
        Self::with_sink(Box::new(TracingSink))
    }

    pub fn with_sink(sink: Box<dyn LogSink>) -> Self {
        EventLog {
            inner: RefCell::new(Inner {
                buffer: Vec::new(),
                last_error: None,
                last_warning: None,
                last_info: None,
                sink,
            }),
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.record(EventKind::Error, message.into(), None);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.record(EventKind::Warning, message.into(), None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.record(EventKind::Info, message.into(), None);
    }

    pub fn error_at(&self, message: impl Into<String>, position: usize) {
        self.record(EventKind::Error, message.into(), Some(position));
    }

    pub fn warning_at(&self, message: impl Into<String>, position: usize) {
        self.record(EventKind::Warning, message.into(), Some(position));
    }

    pub fn info_at(&self, message: impl Into<String>, position: usize) {
        self.record(EventKind::Info, message.into(), Some(position));
    }

    fn record(&self, kind: EventKind, message: String, position: Option<usize>) {
        let mut inner = self.inner.borrow_mut();
        let event = Event { kind, message, position };
        match kind {
            EventKind::Error => inner.last_error = Some(event.clone()),
            EventKind::Warning => inner.last_warning = Some(event.clone()),
            EventKind::Info => inner.last_info = Some(event.clone()),
        }
        inner.buffer.push(event);
        if inner.buffer.len() >= BUFFER_CAPACITY {
            inner.flush();
        }
    }

    pub fn last_error(&self) -> Option<Event> {
        self.inner.borrow().last_error.clone()
    }

    pub fn last_warning(&self) -> Option<Event> {
        self.inner.borrow().last_warning.clone()
    }

    pub fn last_info(&self) -> Option<Event> {
        self.inner.borrow().last_info.clone()
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.last_error().map(|event| event.message)
    }

    pub fn last_error_position(&self) -> Option<usize> {
        self.last_error().and_then(|event| event.position)
    }

    /// Push all buffered events to the sink now.
    pub fn flush(&self) {
        self.inner.borrow_mut().flush();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        self.inner.borrow_mut().flush();
    }
}
