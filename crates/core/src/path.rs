//! Dotted-path handling for map access
//!
//! Paths like `user.address.city` address nested maps. A path is parsed
//! once into segments and the segment list is handed to the value
//! walkers; set operations never create intermediate maps.

/// Split a dotted path into its segments.
///
/// Returns `None` for an empty path or a path with an empty segment
/// (`"a..b"`, `".a"`, `"a."`).
pub fn segments(path: &str) -> Option<Vec<&str>> {
    if path.is_empty() {
        return None;
    }

    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|segment| segment.is_empty()) {
        return None;
    }

    Some(parts)
}
