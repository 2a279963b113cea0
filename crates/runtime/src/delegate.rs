//! Delegate handler contract
//!
//! A delegate participates in the message bus exactly like an agent —
//! it is addressed by id and receives queued messages — but it is
//! implemented in native code and answers with a response map instead
//! of interpreting a method. Delegates live under negative ids; id 0
//! is reserved for "no target".

use agerun_core::{Data, EventLog};

/// Native message handler behind a delegate id.
pub trait DelegateHandler {
    /// Short type tag: `"file"`, `"network"`, `"log"`, or a custom
    /// name.
    fn delegate_type(&self) -> &str;

    /// Handle one message from `sender_id`. The message is borrowed;
    /// the returned response map is a fresh value.
    fn handle_message(&mut self, message: &Data, sender_id: i64) -> Data;
}

/// `{status: "success"}`
pub(crate) fn success_response() -> Data {
    let mut response = Data::map();
    let _ = response.set_path("status", Data::from("success"));
    response
}

/// `{status: "error", message: <reason>}`; the reason is also
/// recorded on the event log.
pub(crate) fn error_response(log: &EventLog, reason: &str) -> Data {
    log.error(reason);
    let mut response = Data::map();
    let _ = response.set_path("status", Data::from("error"));
    let _ = response.set_path("message", Data::from(reason));
    response
}
