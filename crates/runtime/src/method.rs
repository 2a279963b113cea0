//! Methods: named, versioned, compiled instruction lists
//!
//! A method's identity is `(name, version)`. The raw source text is
//! kept alongside the parsed instructions so snapshots can persist the
//! method exactly as it was registered; parsing happens once, at
//! registration.

use agerun_compiler::ast::InstructionAst;
use agerun_compiler::parse_method_source;
use agerun_core::EventLog;
use std::fmt;

/// A `major.minor.patch` semantic version, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version { major, minor, patch }
    }

    /// Parse `"1.2.3"`. Exactly three numeric components are required.
    pub fn parse(text: &str) -> Option<Version> {
        let mut parts = text.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Version { major, minor, patch })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug)]
pub struct Method {
    name: String,
    version: Version,
    source: String,
    instructions: Vec<InstructionAst>,
}

impl Method {
    /// Compile a method from its source text. Parse failures are
    /// recorded on the event log with their position and yield `None`.
    pub fn compile(name: &str, source: &str, version_text: &str, log: &EventLog) -> Option<Method> {
        let Some(version) = Version::parse(version_text) else {
            log.error(format!("method '{name}': invalid version '{version_text}'"));
            return None;
        };

        match parse_method_source(source) {
            Ok(instructions) => Some(Method {
                name: name.to_string(),
                version,
                source: source.to_string(),
                instructions,
            }),
            Err(failure) => {
                log.error_at(
                    format!("method '{name}' line {}: {}", failure.line, failure.error.message),
                    failure.error.position,
                );
                None
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn instructions(&self) -> &[InstructionAst] {
        &self.instructions
    }
}
