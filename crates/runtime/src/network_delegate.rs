//! Network delegate (architectural stub)
//!
//! Validates requests and enforces the URL whitelist, but performs no
//! transport: a passing request yields `{status: "success", content:
//! "stub", stubbed: 1}`. Hosts that need real HTTP run it on an
//! adapter outside the core and feed responses back through the
//! delegation facade.
//!
//! Message schema: `{action: "GET"|"POST", url: <string>,
//! body?: <string>}`.

use crate::delegate::{DelegateHandler, error_response, success_response};
use agerun_core::{Data, EventLog};
use std::rc::Rc;

pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

pub struct NetworkDelegate {
    log: Rc<EventLog>,
    whitelist: Vec<String>,
    max_response_size: usize,
    timeout_seconds: u64,
}

impl NetworkDelegate {
    /// An empty whitelist allows any URL; otherwise the URL must start
    /// with one of the prefixes. Zero limits select the defaults.
    pub fn new(
        log: Rc<EventLog>,
        whitelist: Vec<String>,
        max_response_size: usize,
        timeout_seconds: u64,
    ) -> Self {
        NetworkDelegate {
            log,
            whitelist,
            max_response_size: if max_response_size == 0 {
                DEFAULT_MAX_RESPONSE_SIZE
            } else {
                max_response_size
            },
            timeout_seconds: if timeout_seconds == 0 { DEFAULT_TIMEOUT_SECONDS } else { timeout_seconds },
        }
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    pub fn max_response_size(&self) -> usize {
        self.max_response_size
    }

    /// Configured request timeout; enforced by transport adapters,
    /// not by the stub.
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn is_whitelisted(&self, url: &str) -> bool {
        self.whitelist.is_empty() || self.whitelist.iter().any(|prefix| url.starts_with(prefix))
    }

    fn stub_response(&self) -> Data {
        let content = "stub";
        if content.len() > self.max_response_size {
            return error_response(&self.log, "Response too large");
        }
        let mut response = success_response();
        let _ = response.set_path("content", Data::from(content));
        let _ = response.set_path("stubbed", Data::Integer(1));
        response
    }
}

impl DelegateHandler for NetworkDelegate {
    fn delegate_type(&self) -> &str {
        "network"
    }

    fn handle_message(&mut self, message: &Data, _sender_id: i64) -> Data {
        if !matches!(message, Data::Map(_)) {
            return error_response(&self.log, "Invalid message");
        }

        let (Some(action), Some(url)) =
            (message.get_path_string("action"), message.get_path_string("url"))
        else {
            return error_response(&self.log, "Invalid message");
        };

        if !self.is_whitelisted(url) {
            return error_response(&self.log, "URL not whitelisted");
        }

        match action {
            "GET" => self.stub_response(),
            "POST" => {
                if message.get_path_string("body").is_none() {
                    return error_response(&self.log, "Missing body");
                }
                self.stub_response()
            }
            _ => error_response(&self.log, "Unknown action"),
        }
    }
}
