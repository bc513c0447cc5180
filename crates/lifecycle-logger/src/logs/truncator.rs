//! Byte-budget aware JSON truncation.
//!
//! The formatter hands an oversized context to a [`Truncate`] strategy together with the
//! number of bytes it may occupy. A strategy must either return syntactically valid JSON
//! no longer than that budget, or report [`TruncateError::InvalidBudget`] when the budget
//! cannot hold even the smallest JSON document.
//!
//! # Default Strategy
//!
//! [`JsonTruncator`] shrinks the document in passes until it fits:
//!
//! 1. **Shorten the longest strings** anywhere in the document, keeping a short prefix
//!    followed by [`TRUNCATION_MARKER`]
//! 2. **Drop the largest entries**, descending into the largest children first so that
//!    top-level keys are the last to go
//! 3. **Collapse the root** to an empty container once nothing else can be removed
//!
//! Node sizes are measured once per pass and the bytes saved by every edit are tracked,
//! so a pass costs O(n log n) in the size of the document and the document is
//! re-serialized only to confirm the result.
//!
//! ```text
//! {"a":"xxxxxxxx…(40000)","b":1}   budget 40
//!   → {"a":"xxxxxxxxxxxxxxxxxxxxxxx...","b":1}
//! ```

use std::cmp::Reverse;

use serde_json::{Map, Value};
use thiserror::Error;

/// Smallest valid JSON document the truncator can fall back to: `{}`.
pub const MIN_JSON_SIZE: usize = 2;

/// Suffix appended to shortened strings.
pub const TRUNCATION_MARKER: &str = "...";

/// Bytes kept from a string when it has to be shortened.
const MIN_STRING_PREFIX: usize = 8;

#[derive(Error, Debug)]
pub enum TruncateError {
    /// The budget is negative or too small for any JSON document.
    #[error("Invalid truncation budget {budget}, at least {minimum} bytes are required")]
    InvalidBudget { budget: i64, minimum: usize },
    /// The input is not valid JSON.
    #[error("Cannot truncate malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A truncation strategy.
///
/// Implementations decide what to drop first. The formatter only relies on the contract:
/// valid JSON in, valid JSON of at most `max_bytes` out, or an error.
pub trait Truncate {
    fn truncate(&self, json: &str, max_bytes: i64) -> Result<String, TruncateError>;
}

/// Default strategy: shorten the longest strings, then drop the largest entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTruncator;

impl JsonTruncator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Truncate for JsonTruncator {
    fn truncate(&self, json: &str, max_bytes: i64) -> Result<String, TruncateError> {
        let budget = usize::try_from(max_bytes)
            .ok()
            .filter(|budget| *budget >= MIN_JSON_SIZE)
            .ok_or(TruncateError::InvalidBudget {
                budget: max_bytes,
                minimum: MIN_JSON_SIZE,
            })?;

        let mut value: Value = serde_json::from_str(json)?;
        if json.len() <= budget {
            return Ok(json.to_string());
        }

        // Every pass shrinks the document, so the loop ends once the root is collapsed.
        let mut serialized = serde_json::to_string(&value)?;
        while serialized.len() > budget {
            let excess = serialized.len() - budget;
            if shorten_strings(&mut value, excess) == 0 {
                let sizes = SizeTree::measure(&value);
                if drop_entries(&mut value, &sizes, excess) == 0 {
                    // Empty containers and `""` are within MIN_JSON_SIZE.
                    value = match value {
                        Value::Array(_) => Value::Array(Vec::new()),
                        Value::Object(_) => Value::Object(Map::new()),
                        _ => Value::String(String::new()),
                    };
                }
            }
            serialized = serde_json::to_string(&value)?;
        }
        Ok(serialized)
    }
}

/// Returns the longest prefix of `s` of at most `max_bytes` bytes that ends on a char
/// boundary.
///
/// ```
/// use lifecycle_logger::logs::truncator::truncate_str;
///
/// assert_eq!(truncate_str("hello", 3), "hel");
/// assert_eq!(truncate_str("ab—cd", 3), "ab");
/// ```
#[must_use]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Serialized size of every node, mirroring the shape of a [`Value`].
struct SizeTree {
    size: usize,
    children: Vec<SizeTree>,
}

impl SizeTree {
    fn measure(value: &Value) -> Self {
        let children: Vec<SizeTree> = match value {
            Value::Array(items) => items.iter().map(Self::measure).collect(),
            Value::Object(map) => map.values().map(Self::measure).collect(),
            scalar => {
                return Self {
                    size: serialized_len(scalar),
                    children: Vec::new(),
                }
            }
        };
        let keys: usize = match value {
            Value::Object(map) => map.keys().map(|key| key_overhead(key)).sum(),
            _ => 0,
        };
        let commas = children.len().saturating_sub(1);
        let size = 2 + keys + commas + children.iter().map(|child| child.size).sum::<usize>();
        Self { size, children }
    }
}

fn serialized_len(value: &Value) -> usize {
    serde_json::to_vec(value).map_or(0, |v| v.len())
}

fn string_len(s: &str) -> usize {
    serde_json::to_vec(s).map_or(0, |v| v.len())
}

/// Bytes taken by `"key":` in front of an object value.
fn key_overhead(key: &str) -> usize {
    string_len(key) + 1
}

fn collect_strings<'a>(value: &'a mut Value, out: &mut Vec<&'a mut String>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter_mut().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values_mut().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

/// Shortens strings, longest first, until `excess` bytes are saved or every string is
/// down to its minimal prefix. Returns the bytes saved.
fn shorten_strings(value: &mut Value, excess: usize) -> usize {
    let mut strings = Vec::new();
    collect_strings(value, &mut strings);
    strings.sort_by_key(|s| Reverse(s.len()));

    let mut saved = 0;
    for s in strings {
        if saved >= excess || s.len() <= MIN_STRING_PREFIX + TRUNCATION_MARKER.len() {
            break;
        }
        let before = string_len(s);
        let keep = s
            .len()
            .saturating_sub(excess - saved + TRUNCATION_MARKER.len())
            .max(MIN_STRING_PREFIX);
        let shortened = format!("{}{TRUNCATION_MARKER}", truncate_str(s, keep));
        *s = shortened;
        saved += before.saturating_sub(string_len(s));
    }
    saved
}

fn is_non_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

/// Removes entries of `value` until `need` bytes are saved, visiting the largest children
/// first and emptying nested containers before removing them. Returns the bytes saved.
fn drop_entries(value: &mut Value, sizes: &SizeTree, need: usize) -> usize {
    let (mut children, overheads): (Vec<&mut Value>, Vec<usize>) = match value {
        Value::Array(items) => items.iter_mut().map(|item| (item, 0)).unzip(),
        Value::Object(map) => map
            .iter_mut()
            .map(|(key, item)| (item, key_overhead(key)))
            .unzip(),
        _ => return 0,
    };

    // Largest first; among equals the later entry goes first.
    let mut order: Vec<usize> = (0..children.len()).collect();
    order.sort_by_key(|&index| (Reverse(sizes.children[index].size), Reverse(index)));

    let mut removed = vec![false; children.len()];
    let mut remaining = children.len();
    let mut saved = 0;
    for index in order {
        if saved >= need {
            break;
        }
        let child = &mut *children[index];
        let mut size = sizes.children[index].size;
        if is_non_empty_container(child) {
            saved += drop_entries(child, &sizes.children[index], need - saved);
            if saved >= need {
                break;
            }
            // Emptied.
            size = MIN_JSON_SIZE;
        }
        saved += overheads[index] + size + usize::from(remaining > 1);
        removed[index] = true;
        remaining -= 1;
    }

    if removed.contains(&true) {
        let mut flags = removed.into_iter();
        match value {
            Value::Array(items) => items.retain(|_| !flags.next().unwrap_or(false)),
            Value::Object(map) => {
                *map = std::mem::take(map)
                    .into_iter()
                    .filter(|_| !flags.next().unwrap_or(false))
                    .collect();
            }
            _ => {}
        }
    }
    saved
}
