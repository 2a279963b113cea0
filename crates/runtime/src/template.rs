//! Template engine for `parse` and `build`
//!
//! Templates are literal text with `{identifier}` holes:
//!
//! ```text
//! parse("name={n};age={a}", "name=Alice;age=30")  ->  {n: "Alice", a: "30"}
//! build("name={n};age={a}", {n: "Bob", a: 7})     ->  "name=Bob;age=7"
//! ```
//!
//! `parse` captures matched substrings (always strings) and yields an
//! empty map when the input does not match. `build` renders Integer
//! and Double values through their display form and leaves a hole
//! verbatim when its key is missing or holds a container. A `{` that
//! does not open a well-formed hole is ordinary text.

use agerun_core::Data;

#[derive(Debug, PartialEq)]
enum Segment<'t> {
    Literal(&'t str),
    Hole(&'t str),
}

/// Split a template into literal runs and holes.
fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut literal_start = 0usize;

    // Indexing is byte-based; holes are ASCII identifiers so byte
    // scanning is safe, and literals are carried as verbatim slices.
    let bytes = template.as_bytes();
    let mut pos = 0usize;
    while pos < bytes.len() {
        if bytes[pos] == b'{' {
            if let Some((name, end)) = scan_hole(template, pos) {
                if literal_start < pos {
                    out.push(Segment::Literal(&template[literal_start..pos]));
                }
                out.push(Segment::Hole(name));
                pos = end;
                literal_start = pos;
                continue;
            }
        }
        pos += 1;
    }
    if literal_start < bytes.len() {
        out.push(Segment::Literal(&template[literal_start..]));
    }
    out
}

/// Parse `{ident}` starting at the `{`; returns the identifier and the
/// offset just past the `}`.
fn scan_hole(template: &str, open: usize) -> Option<(&str, usize)> {
    let bytes = template.as_bytes();
    let name_start = open + 1;
    let mut pos = name_start;

    if pos >= bytes.len() {
        return None;
    }
    let first = bytes[pos] as char;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    pos += 1;
    while pos < bytes.len() {
        let ch = bytes[pos] as char;
        if ch.is_ascii_alphanumeric() || ch == '_' {
            pos += 1;
        } else {
            break;
        }
    }
    if bytes.get(pos) == Some(&b'}') {
        Some((&template[name_start..pos], pos + 1))
    } else {
        None
    }
}

/// Match `input` against `template`, returning a map of hole name to
/// matched substring. Any mismatch yields an empty map.
pub fn parse_template(template: &str, input: &str) -> Data {
    let segs = segments(template);
    let mut result = Data::map();
    let mut pos = 0usize;

    let mut iter = segs.iter().peekable();
    while let Some(segment) = iter.next() {
        match segment {
            Segment::Literal(literal) => {
                if input[pos..].starts_with(literal) {
                    pos += literal.len();
                } else {
                    return Data::map();
                }
            }
            Segment::Hole(name) => {
                let captured_end = match iter.peek() {
                    // A hole runs until the next literal begins
                    Some(Segment::Literal(literal)) => match input[pos..].find(literal) {
                        Some(offset) => pos + offset,
                        None => return Data::map(),
                    },
                    // Adjacent holes: the earlier one captures nothing
                    Some(Segment::Hole(_)) => pos,
                    None => input.len(),
                };
                let captured = &input[pos..captured_end];
                if result.set_path(name, Data::from(captured)).is_err() {
                    return Data::map();
                }
                pos = captured_end;
            }
        }
    }

    if pos != input.len() {
        return Data::map();
    }
    result
}

/// Render `template`, substituting each hole from `values` (a map).
/// Missing keys and container values leave the hole text intact.
pub fn build_template(template: &str, values: &Data) -> String {
    let mut out = String::new();
    for segment in segments(template) {
        match segment {
            Segment::Literal(literal) => out.push_str(literal),
            Segment::Hole(name) => {
                let rendered = values.as_map().and_then(|entries| entries.get(name)).and_then(
                    |value| match value {
                        Data::Integer(n) => Some(n.to_string()),
                        Data::Double(d) => Some(d.to_string()),
                        Data::String(s) => Some(s.clone()),
                        Data::List(_) | Data::Map(_) => None,
                    },
                );
                match rendered {
                    Some(text) => out.push_str(&text),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_split() {
        assert_eq!(
            segments("name={n};age={a}"),
            vec![
                Segment::Literal("name="),
                Segment::Hole("n"),
                Segment::Literal(";age="),
                Segment::Hole("a"),
            ]
        );
    }

    #[test]
    fn test_malformed_hole_is_literal_text() {
        assert_eq!(segments("a{1}b"), vec![Segment::Literal("a{1}b")]);
        assert_eq!(segments("open{"), vec![Segment::Literal("open{")]);
        assert_eq!(segments("{x y}"), vec![Segment::Literal("{x y}")]);
    }

    #[test]
    fn test_parse_two_holes() {
        let result = parse_template("name={n};age={a}", "name=Alice;age=30");
        assert_eq!(result.get_path_string("n"), Some("Alice"));
        assert_eq!(result.get_path_string("a"), Some("30"));
        assert_eq!(result.map_len(), 2);
    }

    #[test]
    fn test_parse_trailing_hole_captures_rest() {
        let result = parse_template("cmd:{rest}", "cmd:run fast");
        assert_eq!(result.get_path_string("rest"), Some("run fast"));
    }

    #[test]
    fn test_parse_mismatch_yields_empty_map() {
        let result = parse_template("name={n}", "age=30");
        assert_eq!(result.map_len(), 0);

        // Trailing unmatched input is a mismatch too
        let result = parse_template("v={x};", "v=1;extra");
        assert_eq!(result.map_len(), 0);
    }

    #[test]
    fn test_parse_template_without_holes() {
        let result = parse_template("exact", "exact");
        assert_eq!(result.map_len(), 0);
        assert_eq!(result.data_type(), agerun_core::DataType::Map);
    }

    #[test]
    fn test_parse_empty_capture() {
        let result = parse_template("a={x}b", "ab");
        assert_eq!(result.get_path_string("x"), Some(""));
    }

    #[test]
    fn test_build_substitutes_strings() {
        let mut values = Data::map();
        values.set_path_string("name", "Bob");
        assert_eq!(build_template("Hello {name}!", &values), "Hello Bob!");
    }

    #[test]
    fn test_build_coerces_numbers() {
        let mut values = Data::map();
        values.set_path_integer("n", 42);
        values.set_path_double("r", 2.5);
        assert_eq!(build_template("n={n} r={r}", &values), "n=42 r=2.5");
    }

    #[test]
    fn test_build_leaves_missing_holes_verbatim() {
        let values = Data::map();
        assert_eq!(build_template("Hello {name}!", &values), "Hello {name}!");
    }

    #[test]
    fn test_build_leaves_container_holes_verbatim() {
        let mut values = Data::map();
        values.set_path("inner", Data::map()).unwrap();
        assert_eq!(build_template("v={inner}", &values), "v={inner}");
    }

    #[test]
    fn test_parse_build_round_trip() {
        let template = "name={n};age={a}";
        let parsed = parse_template(template, "name=Alice;age=30");
        let rebuilt = build_template(template, &parsed);
        assert_eq!(rebuilt, "name=Alice;age=30");
    }
}
