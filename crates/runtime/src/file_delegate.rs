//! File delegate
//!
//! Mediates agent access to the filesystem. Operations are confined
//! to a configured directory; reads are size-limited; writes create
//! the file.
//!
//! Message schema: `{action: "read"|"write", path: <string>,
//! content?: <string>}`. Response schema: `{status: "success",
//! content?} | {status: "error", message}`.

use crate::delegate::{DelegateHandler, error_response, success_response};
use agerun_core::{Data, EventLog};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

/// Read size cap applied when the host configures none.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub struct FileDelegate {
    log: Rc<EventLog>,
    allowed_path: PathBuf,
    max_file_size: u64,
}

impl FileDelegate {
    /// `allowed_path` roots every file operation. `max_file_size` of 0
    /// selects [`DEFAULT_MAX_FILE_SIZE`].
    pub fn new(log: Rc<EventLog>, allowed_path: impl Into<PathBuf>, max_file_size: u64) -> Self {
        FileDelegate {
            log,
            allowed_path: allowed_path.into(),
            max_file_size: if max_file_size == 0 { DEFAULT_MAX_FILE_SIZE } else { max_file_size },
        }
    }

    pub fn allowed_path(&self) -> &Path {
        &self.allowed_path
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Resolve a message path against the sandbox. `None` means the
    /// path escapes: it contains `..` or does not stay lexically under
    /// the allowed root.
    fn resolve(&self, raw: &str) -> Option<PathBuf> {
        let candidate = Path::new(raw);
        if candidate.components().any(|c| matches!(c, Component::ParentDir)) {
            return None;
        }

        let full = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.allowed_path.join(candidate)
        };

        if full.starts_with(&self.allowed_path) { Some(full) } else { None }
    }

    fn handle_read(&self, full_path: &Path) -> Data {
        match fs::metadata(full_path) {
            Ok(metadata) if metadata.len() > self.max_file_size => {
                return error_response(&self.log, "File too large");
            }
            Ok(_) => {}
            Err(_) => return error_response(&self.log, "Failed to read file"),
        }

        match fs::read_to_string(full_path) {
            Ok(content) => {
                let mut response = success_response();
                let _ = response.set_path("content", Data::String(content));
                response
            }
            Err(_) => error_response(&self.log, "Failed to read file"),
        }
    }

    fn handle_write(&self, full_path: &Path, content: &str) -> Data {
        match fs::write(full_path, content) {
            Ok(()) => success_response(),
            Err(_) => error_response(&self.log, "Failed to write file"),
        }
    }
}

impl DelegateHandler for FileDelegate {
    fn delegate_type(&self) -> &str {
        "file"
    }

    fn handle_message(&mut self, message: &Data, _sender_id: i64) -> Data {
        if !matches!(message, Data::Map(_)) {
            return error_response(&self.log, "Invalid message");
        }

        let (Some(action), Some(raw_path)) =
            (message.get_path_string("action"), message.get_path_string("path"))
        else {
            return error_response(&self.log, "Invalid message");
        };

        let Some(full_path) = self.resolve(raw_path) else {
            return error_response(&self.log, "Invalid path");
        };

        match action {
            "read" => self.handle_read(&full_path),
            "write" => match message.get_path_string("content") {
                Some(content) => self.handle_write(&full_path, content),
                None => error_response(&self.log, "Invalid message"),
            },
            _ => error_response(&self.log, "Unknown action"),
        }
    }
}
