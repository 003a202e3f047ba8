use serde_json::{Map, Value};

use crate::error::SanitizeError;
use crate::escape::sanitize_string;

/// Default bound on nested arrays/objects accepted by [`sanitize_value`]
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Pending step of the iterative walk
enum Frame<'a> {
    /// Sanitize this node; `depth` counts the containers enclosing it
    Visit(&'a Value, usize),
    /// Collect the last `n` finished values into an array
    Array(usize),
    /// Collect the last `keys.len()` finished values into an object
    Object(Vec<&'a String>),
}

/// Sanitize an arbitrary JSON value with the default depth bound
///
/// See [`sanitize_value_with_depth`] for how string leaves such as dates
/// and times are rewritten.
///
/// # Errors
///
/// Returns [`SanitizeError::DepthExceeded`] if the value nests deeper than
/// [`DEFAULT_MAX_DEPTH`] containers
pub fn sanitize_value(value: &Value) -> Result<Value, SanitizeError> {
    sanitize_value_with_depth(value, DEFAULT_MAX_DEPTH)
}

/// Build a sanitized deep copy of `value`
///
/// Arrays and objects are rebuilt with the same shape and key order, string
/// leaves go through [`sanitize_string`], other scalars are copied as-is.
/// Object keys are kept verbatim. The input is never modified.
///
/// Every string leaf is rewritten, so structured text changes too: a time
/// such as `10:30` arrives as `10&#x3A;30` and an ISO timestamp or URL loses
/// its colons. Fields that must keep their exact form are better read
/// before this pass or validated with the field validators instead.
///
/// The walk uses an explicit stack, so hostile nesting cannot exhaust the
/// call stack; it fails closed once more than `max_depth` containers nest.
///
/// # Errors
///
/// Returns [`SanitizeError::DepthExceeded`] when the bound is crossed
pub fn sanitize_value_with_depth(value: &Value, max_depth: usize) -> Result<Value, SanitizeError> {
    let mut pending = vec![Frame::Visit(value, 0)];
    let mut finished: Vec<Value> = Vec::new();

    while let Some(frame) = pending.pop() {
        match frame {
            Frame::Visit(Value::Array(items), depth) => {
                let depth = enter(depth, max_depth)?;
                pending.push(Frame::Array(items.len()));
                pending.extend(items.iter().rev().map(|item| Frame::Visit(item, depth)));
            }
            Frame::Visit(Value::Object(map), depth) => {
                let depth = enter(depth, max_depth)?;
                pending.push(Frame::Object(map.keys().collect()));
                pending.extend(map.values().rev().map(|item| Frame::Visit(item, depth)));
            }
            Frame::Visit(Value::String(s), _) => finished.push(Value::String(sanitize_string(s))),
            Frame::Visit(scalar, _) => finished.push(scalar.clone()),
            Frame::Array(len) => {
                let items = finished.split_off(finished.len() - len);
                finished.push(Value::Array(items));
            }
            Frame::Object(keys) => {
                let values = finished.split_off(finished.len() - keys.len());
                let map: Map<String, Value> = keys.into_iter().cloned().zip(values).collect();
                finished.push(Value::Object(map));
            }
        }
    }

    Ok(finished.pop().unwrap_or(Value::Null))
}

const fn enter(depth: usize, max_depth: usize) -> Result<usize, SanitizeError> {
    let depth = depth + 1;
    if depth > max_depth {
        return Err(SanitizeError::DepthExceeded { max_depth });
    }
    Ok(depth)
}
