//! Log delegate
//!
//! Lets agents emit structured log lines through the event log.
//! Levels below the configured minimum are refused; a message may
//! carry its own `agent_id` only when it matches the actual sender,
//! so agents cannot log on each other's behalf.
//!
//! Message schema: `{level: "info"|"warning"|"error",
//! message: <string>, agent_id?: <integer>}`. Emitted lines look like
//! `2026-01-05T12:00:00Z level=error agent=3 message=disk full`.

use crate::delegate::{DelegateHandler, error_response, success_response};
use agerun_core::{Data, EventLog};
use chrono::Utc;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    fn parse(text: &str) -> Option<Level> {
        match text {
            "info" => Some(Level::Info),
            "warning" => Some(Level::Warning),
            "error" => Some(Level::Error),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

pub struct LogDelegate {
    log: Rc<EventLog>,
    min_level: Level,
}

impl LogDelegate {
    /// `min_level` accepts `"info"`, `"warning"`, or `"error"`;
    /// `None` or an unrecognized value selects `info`.
    pub fn new(log: Rc<EventLog>, min_level: Option<&str>) -> Self {
        let min_level = min_level.and_then(Level::parse).unwrap_or(Level::Info);
        LogDelegate { log, min_level }
    }

    pub fn min_level(&self) -> &'static str {
        self.min_level.as_str()
    }

    fn format_line(level: Level, sender_id: i64, text: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        format!("{timestamp} level={} agent={sender_id} message={text}", level.as_str())
    }
}

impl DelegateHandler for LogDelegate {
    fn delegate_type(&self) -> &str {
        "log"
    }

    fn handle_message(&mut self, message: &Data, sender_id: i64) -> Data {
        if !matches!(message, Data::Map(_)) {
            return error_response(&self.log, "Invalid message");
        }

        let (Some(level_text), Some(text)) =
            (message.get_path_string("level"), message.get_path_string("message"))
        else {
            return error_response(&self.log, "Invalid message");
        };

        // Anti-spoofing: an explicit agent_id must be the sender's own
        if let Some(claimed) = message.get_path("agent_id") {
            match claimed.as_integer() {
                Some(id) if id == sender_id => {}
                Some(_) => {
                    return error_response(&self.log, "agent_id does not match sender_id");
                }
                None => return error_response(&self.log, "Invalid agent_id"),
            }
        }

        let Some(level) = Level::parse(level_text) else {
            return error_response(&self.log, "Invalid log level");
        };

        if level < self.min_level {
            return error_response(&self.log, "Log level below minimum");
        }

        let line = Self::format_line(level, sender_id, text);
        match level {
            Level::Info => self.log.info(line),
            Level::Warning => self.log.warning(line),
            Level::Error => self.log.error(line),
        }

        success_response()
    }
}
