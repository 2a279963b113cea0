//! Tagged runtime values
//!
//! `Data` is the single value type the runtime traffics in: agent
//! memory, contexts, messages, and every intermediate expression result
//! are all `Data`. Primitives are integers, doubles, and strings;
//! containers are ordered lists and string-keyed maps, nestable to any
//! depth.
//!
//! Ownership is Rust ownership. Inserting into a container moves the
//! value in; removing moves it back out; a container therefore has
//! exclusive ownership of its members and values never alias. There is
//! no deep copy: [`Data::shallow_copy`] duplicates primitives and
//! flat containers only, and returns `None` for a container that holds
//! another container.
//!
//! Map access supports dotted paths (`"user.address.city"`). Set
//! operations require every intermediate map to already exist;
//! missing intermediates are an error, never auto-created.

use crate::path;
use std::collections::HashMap;

/// Discriminant of a [`Data`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Double,
    String,
    List,
    Map,
}

impl DataType {
    /// Short uppercase name used by diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Double => "DOUBLE",
            DataType::String => "STRING",
            DataType::List => "LIST",
            DataType::Map => "MAP",
        }
    }
}

/// A runtime value.
#[derive(Debug, PartialEq)]
pub enum Data {
    Integer(i64),
    Double(f64),
    String(String),
    List(Vec<Data>),
    Map(HashMap<String, Data>),
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Integer(value)
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Double(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_string())
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::String(value)
    }
}

impl Data {
    /// Create an empty map value.
    pub fn map() -> Data {
        Data::Map(HashMap::new())
    }

    /// Create an empty list value.
    pub fn list() -> Data {
        Data::List(Vec::new())
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Data::Integer(_) => DataType::Integer,
            Data::Double(_) => DataType::Double,
            Data::String(_) => DataType::String,
            Data::List(_) => DataType::List,
            Data::Map(_) => DataType::Map,
        }
    }

    /// True for INTEGER, DOUBLE, and STRING values.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Data::Integer(_) | Data::Double(_) | Data::String(_))
    }

    /// True for a map whose direct members are all primitives.
    /// An empty map qualifies; a non-map value does not.
    pub fn map_contains_only_primitives(&self) -> bool {
        match self {
            Data::Map(entries) => entries.values().all(Data::is_primitive),
            _ => false,
        }
    }

    /// True for a list whose direct members are all primitives.
    /// An empty list qualifies; a non-list value does not.
    pub fn list_contains_only_primitives(&self) -> bool {
        match self {
            Data::List(items) => items.iter().all(Data::is_primitive),
            _ => false,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Data::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Data::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Data>> {
        match self {
            Data::Map(entries) => Some(entries),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Copying
    // ------------------------------------------------------------------

    /// Duplicate a primitive, or a container whose direct members are
    /// all primitives. Returns `None` for a container holding another
    /// container; there is no deep copy.
    pub fn shallow_copy(&self) -> Option<Data> {
        match self {
            Data::Integer(value) => Some(Data::Integer(*value)),
            Data::Double(value) => Some(Data::Double(*value)),
            Data::String(value) => Some(Data::String(value.clone())),
            Data::List(items) => {
                if !self.list_contains_only_primitives() {
                    return None;
                }
                let copied = items
                    .iter()
                    .map(|item| item.shallow_copy())
                    .collect::<Option<Vec<Data>>>()?;
                Some(Data::List(copied))
            }
            Data::Map(entries) => {
                if !self.map_contains_only_primitives() {
                    return None;
                }
                let copied = entries
                    .iter()
                    .map(|(key, value)| Some((key.clone(), value.shallow_copy()?)))
                    .collect::<Option<HashMap<String, Data>>>()?;
                Some(Data::Map(copied))
            }
        }
    }

    // ------------------------------------------------------------------
    // Map access by dotted path
    // ------------------------------------------------------------------

    /// Look up a value by dotted path. `self` must be a map and every
    /// intermediate segment must name a nested map.
    pub fn get_path(&self, key_path: &str) -> Option<&Data> {
        let segs = path::segments(key_path)?;
        self.get_segments(&segs)
    }

    /// Look up a value by pre-split path segments.
    pub fn get_segments<S: AsRef<str>>(&self, segs: &[S]) -> Option<&Data> {
        if segs.is_empty() {
            return None;
        }
        let mut current = self;
        for segment in segs {
            match current {
                Data::Map(entries) => current = entries.get(segment.as_ref())?,
                _ => return None,
            }
        }
        Some(current)
    }

    pub fn get_path_integer(&self, key_path: &str) -> Option<i64> {
        self.get_path(key_path)?.as_integer()
    }

    pub fn get_path_double(&self, key_path: &str) -> Option<f64> {
        self.get_path(key_path)?.as_double()
    }

    pub fn get_path_string(&self, key_path: &str) -> Option<&str> {
        self.get_path(key_path)?.as_str()
    }

    /// Store a value at a dotted path, replacing any existing leaf.
    ///
    /// The parent of the leaf must already exist as a map; missing
    /// intermediates are never created. On failure the value is handed
    /// back unchanged in `Err`.
    pub fn set_path(&mut self, key_path: &str, value: Data) -> Result<(), Data> {
        let segs = match path::segments(key_path) {
            Some(segs) => segs,
            None => return Err(value),
        };
        self.set_segments(&segs, value)
    }

    /// Store a value at a pre-split path.
    pub fn set_segments<S: AsRef<str>>(&mut self, segs: &[S], value: Data) -> Result<(), Data> {
        let Some((leaf, parents)) = segs.split_last() else {
            return Err(value);
        };
        if !matches!(self, Data::Map(_)) {
            return Err(value);
        }

        let mut current: &mut Data = self;
        for segment in parents {
            let Data::Map(entries) = current else {
                return Err(value);
            };
            match entries.get_mut(segment.as_ref()) {
                Some(next @ Data::Map(_)) => current = next,
                _ => return Err(value),
            }
        }

        let Data::Map(entries) = current else {
            return Err(value);
        };
        entries.insert(leaf.as_ref().to_string(), value);
        Ok(())
    }

    /// Store a value addressed by a rooted path (`memory.a.b`), but
    /// only when the first segment equals `expected_root` and the
    /// parent map already exists. The root segment itself refers to
    /// `self`. On failure the value is handed back in `Err`.
    pub fn set_root_matched<S: AsRef<str>>(
        &mut self,
        expected_root: &str,
        full_path: &[S],
        value: Data,
    ) -> Result<(), Data> {
        let Some((root, rest)) = full_path.split_first() else {
            return Err(value);
        };
        if root.as_ref() != expected_root || rest.is_empty() {
            return Err(value);
        }
        self.set_segments(rest, value)
    }

    pub fn set_path_integer(&mut self, key_path: &str, value: i64) -> bool {
        self.set_path(key_path, Data::Integer(value)).is_ok()
    }

    pub fn set_path_double(&mut self, key_path: &str, value: f64) -> bool {
        self.set_path(key_path, Data::Double(value)).is_ok()
    }

    pub fn set_path_string(&mut self, key_path: &str, value: &str) -> bool {
        self.set_path(key_path, Data::String(value.to_string())).is_ok()
    }

    /// All keys of a map, or `None` for non-map values. Order is
    /// unspecified.
    pub fn map_keys(&self) -> Option<Vec<String>> {
        match self {
            Data::Map(entries) => Some(entries.keys().cloned().collect()),
            _ => None,
        }
    }

    /// Number of entries in a map; 0 for non-map values.
    pub fn map_len(&self) -> usize {
        match self {
            Data::Map(entries) => entries.len(),
            _ => 0,
        }
    }

    // ------------------------------------------------------------------
    // List operations
    // ------------------------------------------------------------------

    /// Append a value at the front of a list. Hands the value back in
    /// `Err` when `self` is not a list.
    pub fn push_first(&mut self, value: Data) -> Result<(), Data> {
        match self {
            Data::List(items) => {
                items.insert(0, value);
                Ok(())
            }
            _ => Err(value),
        }
    }

    /// Append a value at the back of a list. Hands the value back in
    /// `Err` when `self` is not a list.
    pub fn push_last(&mut self, value: Data) -> Result<(), Data> {
        match self {
            Data::List(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(value),
        }
    }

    pub fn push_first_integer(&mut self, value: i64) -> bool {
        self.push_first(Data::Integer(value)).is_ok()
    }

    pub fn push_first_double(&mut self, value: f64) -> bool {
        self.push_first(Data::Double(value)).is_ok()
    }

    pub fn push_first_string(&mut self, value: &str) -> bool {
        self.push_first(Data::String(value.to_string())).is_ok()
    }

    pub fn push_last_integer(&mut self, value: i64) -> bool {
        self.push_last(Data::Integer(value)).is_ok()
    }

    pub fn push_last_double(&mut self, value: f64) -> bool {
        self.push_last(Data::Double(value)).is_ok()
    }

    pub fn push_last_string(&mut self, value: &str) -> bool {
        self.push_last(Data::String(value.to_string())).is_ok()
    }

    /// Remove and return the first element; ownership moves back to
    /// the caller.
    pub fn pop_first(&mut self) -> Option<Data> {
        match self {
            Data::List(items) if !items.is_empty() => Some(items.remove(0)),
            _ => None,
        }
    }

    /// Remove and return the last element; ownership moves back to
    /// the caller.
    pub fn pop_last(&mut self) -> Option<Data> {
        match self {
            Data::List(items) => items.pop(),
            _ => None,
        }
    }

    /// Remove the first element if it is an integer. On a type
    /// mismatch the list is left untouched.
    pub fn pop_first_integer(&mut self) -> Option<i64> {
        match self {
            Data::List(items) if matches!(items.first(), Some(Data::Integer(_))) => {
                items.remove(0).as_integer()
            }
            _ => None,
        }
    }

    pub fn pop_first_double(&mut self) -> Option<f64> {
        match self {
            Data::List(items) if matches!(items.first(), Some(Data::Double(_))) => {
                items.remove(0).as_double()
            }
            _ => None,
        }
    }

    pub fn pop_first_string(&mut self) -> Option<String> {
        match self {
            Data::List(items) if matches!(items.first(), Some(Data::String(_))) => {
                match items.remove(0) {
                    Data::String(value) => Some(value),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn pop_last_integer(&mut self) -> Option<i64> {
        match self {
            Data::List(items) if matches!(items.last(), Some(Data::Integer(_))) => {
                items.pop()?.as_integer()
            }
            _ => None,
        }
    }

    pub fn pop_last_double(&mut self) -> Option<f64> {
        match self {
            Data::List(items) if matches!(items.last(), Some(Data::Double(_))) => {
                items.pop()?.as_double()
            }
            _ => None,
        }
    }

    pub fn pop_last_string(&mut self) -> Option<String> {
        match self {
            Data::List(items) if matches!(items.last(), Some(Data::String(_))) => {
                match items.pop()? {
                    Data::String(value) => Some(value),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn first(&self) -> Option<&Data> {
        match self {
            Data::List(items) => items.first(),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<&Data> {
        match self {
            Data::List(items) => items.last(),
            _ => None,
        }
    }

    /// Number of elements in a list; 0 for non-list values.
    pub fn list_len(&self) -> usize {
        match self {
            Data::List(items) => items.len(),
            _ => 0,
        }
    }

    /// Borrowed snapshot of a list's elements.
    pub fn list_items(&self) -> Option<&[Data]> {
        match self {
            Data::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Render the structure of a value for diagnostics, descending at
    /// most `max_depth` container levels. Map keys are sorted so the
    /// output is stable.
    pub fn format_structure(&self, max_depth: usize) -> String {
        let mut out = String::new();
        self.format_into(&mut out, max_depth);
        out
    }

    fn format_into(&self, out: &mut String, depth: usize) {
        match self {
            Data::Integer(value) => out.push_str(&value.to_string()),
            Data::Double(value) => out.push_str(&value.to_string()),
            Data::String(value) => {
                out.push('"');
                out.push_str(value);
                out.push('"');
            }
            Data::List(items) => {
                if depth == 0 {
                    out.push_str("LIST[...]");
                    return;
                }
                out.push_str("LIST[");
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    item.format_into(out, depth - 1);
                }
                out.push(']');
            }
            Data::Map(entries) => {
                if depth == 0 {
                    out.push_str("MAP{...}");
                    return;
                }
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                out.push_str("MAP{");
                for (index, key) in keys.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    entries[*key].format_into(out, depth - 1);
                }
                out.push('}');
            }
        }
    }
}
