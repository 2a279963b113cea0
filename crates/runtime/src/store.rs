//! Persistence: methodology and agency snapshots
//!
//! Both files are YAML documents. The methodology file is a list of
//! `{name, version, instructions}` records; the agency file is
//! `{version: "1.0", agents: [{id, method_name, method_version,
//! memory}]}`.
//!
//! Loading is lenient per entry and strict about structure: a
//! malformed agent record or an unknown method skips that agent with a
//! warning, while a top-level `agents` value that is not a list fails
//! the whole load. After a successful agency load the registry's id
//! allocator sits past the highest restored id.

use crate::agent::Agent;
use crate::method::{Method, Version};
use crate::methodology::Methodology;
use crate::registry::AgentRegistry;
use agerun_core::{Data, EventLog};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::fs;
use std::path::Path;

/// Format tag written to agency snapshots.
pub const AGENCY_FORMAT_VERSION: &str = "1.0";

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    /// Structurally invalid document (for example `agents` is not a
    /// list).
    Format(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(error) => write!(f, "store i/o error: {error}"),
            StoreError::Yaml(error) => write!(f, "store yaml error: {error}"),
            StoreError::Format(reason) => write!(f, "store format error: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::Io(error)
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(error: serde_yaml::Error) -> Self {
        StoreError::Yaml(error)
    }
}

#[derive(Serialize, Deserialize)]
struct MethodRecord {
    name: String,
    version: String,
    instructions: String,
}

/// Write every registered method, in registration order.
pub fn save_methodology(methodology: &Methodology, path: &Path) -> Result<(), StoreError> {
    let records: Vec<MethodRecord> = methodology
        .iter()
        .map(|method| MethodRecord {
            name: method.name().to_string(),
            version: method.version().to_string(),
            instructions: method.source().to_string(),
        })
        .collect();
    fs::write(path, serde_yaml::to_string(&records)?)?;
    Ok(())
}

/// Compile and register every method in the file. Methods that no
/// longer compile are skipped with a warning. Returns the number
/// registered.
pub fn load_methodology(
    methodology: &mut Methodology,
    log: &EventLog,
    path: &Path,
) -> Result<usize, StoreError> {
    let text = fs::read_to_string(path)?;
    let records: Vec<MethodRecord> = serde_yaml::from_str(&text)?;

    let mut loaded = 0;
    for record in records {
        match Method::compile(&record.name, &record.instructions, &record.version, log) {
            Some(method) => {
                methodology.register(method);
                loaded += 1;
            }
            None => {
                log.warning(format!(
                    "skipping method '{}' version {}: does not compile",
                    record.name, record.version
                ));
            }
        }
    }
    Ok(loaded)
}

/// Write the agency snapshot: every live agent's id, method identity,
/// and memory.
pub fn save_agents(agents: &AgentRegistry, path: &Path) -> Result<(), StoreError> {
    let mut records = Vec::new();
    for agent in agents.iter() {
        let mut record = serde_yaml::Mapping::new();
        record.insert(Value::from("id"), Value::from(agent.id()));
        record.insert(Value::from("method_name"), Value::from(agent.method().name()));
        record.insert(
            Value::from("method_version"),
            Value::from(agent.method().version().to_string()),
        );
        record.insert(Value::from("memory"), data_to_yaml(agent.memory()));
        records.push(Value::Mapping(record));
    }

    let mut doc = serde_yaml::Mapping::new();
    doc.insert(Value::from("version"), Value::from(AGENCY_FORMAT_VERSION));
    doc.insert(Value::from("agents"), Value::Sequence(records));
    fs::write(path, serde_yaml::to_string(&Value::Mapping(doc))?)?;
    Ok(())
}

/// Restore agents from an agency snapshot. Returns the number
/// restored. Restored agents get empty queues and contexts and no
/// lifecycle message.
pub fn load_agents(
    agents: &mut AgentRegistry,
    methodology: &Methodology,
    log: &EventLog,
    path: &Path,
) -> Result<usize, StoreError> {
    let text = fs::read_to_string(path)?;
    let doc: Value = serde_yaml::from_str(&text)?;

    let Some(entries) = doc.get("agents") else {
        return Err(StoreError::Format("missing top-level 'agents'".to_string()));
    };
    let Value::Sequence(entries) = entries else {
        return Err(StoreError::Format("'agents' is not a list".to_string()));
    };

    let mut loaded = 0;
    for entry in entries {
        match restore_agent(entry, methodology, log) {
            Some(agent) => {
                let id = agent.id();
                if agents.insert_restored(agent) {
                    loaded += 1;
                } else {
                    log.warning(format!("skipping agent {id}: id already in use"));
                }
            }
            None => {
                // restore_agent already logged the reason
            }
        }
    }
    Ok(loaded)
}

/// Parse one agency entry; `None` (with a warning) for malformed
/// records and unknown methods.
fn restore_agent(entry: &Value, methodology: &Methodology, log: &EventLog) -> Option<Agent> {
    let Some(id) = entry.get("id").and_then(Value::as_i64) else {
        log.warning("skipping agent record: missing or non-integer id");
        return None;
    };
    if id <= 0 {
        log.warning(format!("skipping agent record: invalid id {id}"));
        return None;
    }

    let (Some(method_name), Some(version_text)) = (
        entry.get("method_name").and_then(Value::as_str),
        entry.get("method_version").and_then(Value::as_str),
    ) else {
        log.warning(format!("skipping agent {id}: missing method fields"));
        return None;
    };

    let Some(version) = Version::parse(version_text) else {
        log.warning(format!("skipping agent {id}: bad method version '{version_text}'"));
        return None;
    };
    let Some(method) = methodology.get(method_name, version) else {
        log.warning(format!(
            "skipping agent {id}: method '{method_name}' version {version} not loaded"
        ));
        return None;
    };

    let memory = match entry.get("memory") {
        None | Some(Value::Null) => Data::map(),
        Some(value) => match yaml_to_data(value) {
            Some(memory @ Data::Map(_)) => memory,
            _ => {
                log.warning(format!("skipping agent {id}: memory is not a map"));
                return None;
            }
        },
    };

    Some(Agent::restored(id, method, memory))
}

/// Render a runtime value as YAML.
fn data_to_yaml(data: &Data) -> Value {
    match data {
        Data::Integer(value) => Value::from(*value),
        Data::Double(value) => Value::from(*value),
        Data::String(value) => Value::from(value.as_str()),
        Data::List(items) => Value::Sequence(items.iter().map(data_to_yaml).collect()),
        Data::Map(entries) => {
            // Sorted keys keep snapshots diffable
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            let mut mapping = serde_yaml::Mapping::new();
            for key in keys {
                mapping.insert(Value::from(key.as_str()), data_to_yaml(&entries[key]));
            }
            Value::Mapping(mapping)
        }
    }
}

/// Rebuild a runtime value from YAML. Booleans load as 0/1 integers;
/// nulls, tagged values, and non-string map keys fail.
fn yaml_to_data(value: &Value) -> Option<Data> {
    match value {
        Value::Bool(flag) => Some(Data::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(Data::Integer(int))
            } else {
                number.as_f64().map(Data::Double)
            }
        }
        Value::String(text) => Some(Data::String(text.clone())),
        Value::Sequence(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                list.push(yaml_to_data(item)?);
            }
            Some(Data::List(list))
        }
        Value::Mapping(mapping) => {
            let mut entries = std::collections::HashMap::new();
            for (key, item) in mapping {
                let key = key.as_str()?;
                entries.insert(key.to_string(), yaml_to_data(item)?);
            }
            Some(Data::Map(entries))
        }
        Value::Null | Value::Tagged(_) => None,
    }
}
