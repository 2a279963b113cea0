//! AgeRun core: the shared foundation of the agent runtime
//!
//! This crate holds what every other layer builds on:
//!
//! - `value`: the tagged [`Data`] type (integers, doubles, strings,
//!   lists, string-keyed maps) with move-semantics ownership, dotted
//!   path access, and shallow copying
//! - `path`: dotted-path splitting shared by the value walkers and the
//!   language front-end
//! - `log`: the buffered [`EventLog`] that parsers, evaluators, and
//!   delegates report diagnostics to

pub mod log;
pub mod path;
pub mod value;

pub use log::{Event, EventKind, EventLog, FileSink, LogSink, MemorySink, TracingSink};
pub use value::{Data, DataType};
