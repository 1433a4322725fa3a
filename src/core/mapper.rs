//! Declarative extraction of output fields from an arbitrary response tree.

use indexmap::IndexMap;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(i64),
}

/// Split `places.0.state` or `employees[-1].name` into segments.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let mut segments = Vec::new();

    for part in path.split('.') {
        let (head, mut rest) = match part.find('[') {
            Some(open) => (&part[..open], &part[open..]),
            None => (part, ""),
        };

        if !head.is_empty() {
            segments.push(PathSegment::Key(head.to_string()));
        }

        while let Some(stripped) = rest.strip_prefix('[') {
            let Some(close) = stripped.find(']') else {
                // Unbalanced bracket: keep the remainder as a literal key.
                segments.push(PathSegment::Key(rest.to_string()));
                break;
            };
            let inner = &stripped[..close];
            match inner.parse::<i64>() {
                Ok(index) => segments.push(PathSegment::Index(index)),
                Err(_) => segments.push(PathSegment::Key(inner.to_string())),
            }
            rest = &stripped[close + 1..];
        }
    }

    segments
}

fn array_index(items: &[Value], index: i64) -> Option<&Value> {
    let position = if index < 0 {
        items.len().checked_sub(index.unsigned_abs() as usize)?
    } else {
        index as usize
    };
    items.get(position)
}

fn step<'a>(value: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (value, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string()),
        (Value::Array(items), PathSegment::Index(index)) => array_index(items, *index),
        (Value::Array(items), PathSegment::Key(key)) => {
            array_index(items, key.parse::<i64>().ok()?)
        }
        _ => None,
    }
}

/// Descend `root` one segment at a time. `None` marks an absent value; a JSON
/// `null` at the end of the path is absent too.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in parse_path(path) {
        current = step(current, &segment)?;
    }
    (!current.is_null()).then_some(current)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub fields: IndexMap<String, Value>,
    pub errors: Vec<String>,
    /// Output fields whose path failed, in declaration order.
    pub unresolved: Vec<String>,
}

pub fn missing_field_error(field: &str) -> String {
    format!("Result field '{}' was not found.", field)
}

pub struct FieldMapper<'a> {
    mappings: &'a IndexMap<String, Option<String>>,
    iterate_on: Option<&'a str>,
}

impl<'a> FieldMapper<'a> {
    pub fn new(mappings: &'a IndexMap<String, Option<String>>) -> Self {
        Self {
            mappings,
            iterate_on: None,
        }
    }

    /// Resolve paths against the first element of the sequence found at `path`.
    pub fn iterate_on(mut self, path: Option<&'a str>) -> Self {
        self.iterate_on = path;
        self
    }

    fn record_root<'r>(&self, raw: &'r Value) -> Option<&'r Value> {
        match self.iterate_on {
            Some(path) => match resolve_path(raw, path)? {
                Value::Array(items) => items.first(),
                _ => None,
            },
            None => Some(raw),
        }
    }

    /// Extract every mapped field in declaration order, then fill declared but
    /// unset fields from the raw top level and from `context`.
    pub fn extract(&self, raw: &Value, context: &Map<String, Value>) -> Extraction {
        let mut extraction = Extraction::default();
        let root = self.record_root(raw);

        if root.is_none() {
            tracing::debug!(
                "🔎 Records path {:?} did not resolve to a non-empty sequence",
                self.iterate_on
            );
        }

        for (field, path) in self.mappings {
            let Some(path) = path else {
                continue;
            };

            match root.and_then(|r| resolve_path(r, path)) {
                Some(value) => {
                    extraction.fields.insert(field.clone(), value.clone());
                }
                None => {
                    tracing::debug!("🔎 Field '{}' not found at path '{}'", field, path);
                    extraction.errors.push(missing_field_error(field));
                    extraction.unresolved.push(field.clone());
                }
            }
        }

        let top_level = raw.as_object();
        for field in self.mappings.keys() {
            if extraction.fields.contains_key(field) {
                continue;
            }
            let supplied = top_level
                .and_then(|obj| obj.get(field))
                .filter(|v| !v.is_null())
                .or_else(|| context.get(field));
            if let Some(value) = supplied {
                extraction.fields.insert(field.clone(), value.clone());
            }
        }

        extraction
    }
}
