#![forbid(unsafe_code)]

//! Dotted-path expressions and `{{ }}` interpolation.
//!
//! Expressions are property paths such as `person.name` or `items.0`,
//! resolved left to right against a root [`Value`]. Every lookup goes through
//! [`Object::get`](crate::Object::get), so resolving inside a tracking scope
//! subscribes the active watcher to each property on the path.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Non-composite segment | `a.b` where `a` is a scalar or missing | [`ReactiveError::PathResolution`] |
//! | Missing final key | `a.b` where `a` has no `b` | resolves to `Null` |
//! | Empty expression | `""` or `"  "` | [`ReactiveError::EmptyExpression`] |
//! | Unclosed delimiter | `"{{ a"` | left as literal text |
//! | Blank interpolation | `"{{ }}"` | renders as `Null` (empty text), no watcher |

use std::sync::LazyLock;

use regex::Regex;
use smallvec::SmallVec;

use crate::error::ReactiveError;
use crate::value::Value;

static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(.+?)\}\}").unwrap_or_else(|err| panic!("interpolation pattern: {err}"))
});

type Segments<'a> = SmallVec<[&'a str; 4]>;

fn segments(path: &str) -> Result<Segments<'_>, ReactiveError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(ReactiveError::EmptyExpression);
    }
    Ok(path.split('.').map(str::trim).collect())
}

fn resolution_error(path: &str, segment: &str, found: &Value) -> ReactiveError {
    ReactiveError::PathResolution {
        path: path.trim().to_string(),
        segment: segment.to_string(),
        found: found.type_name(),
    }
}

/// Resolve `path` against `root`.
///
/// # Errors
///
/// [`ReactiveError::PathResolution`] when a segment is looked up on a
/// non-composite value; [`ReactiveError::EmptyExpression`] for a blank path.
pub fn get_value(path: &str, root: &Value) -> Result<Value, ReactiveError> {
    let mut current = root.clone();
    for segment in segments(path)? {
        let Value::Object(object) = &current else {
            return Err(resolution_error(path, segment, &current));
        };
        current = object.get(segment).unwrap_or_default();
    }
    Ok(current)
}

/// Assign `value` at `path` inside `root`.
///
/// Intermediate segments must already resolve to objects; the final key is
/// created if missing. Subscribers of the final property are updated before
/// this returns.
///
/// # Errors
///
/// Same as [`get_value`] for the traversal, plus any error raised by the
/// subscribers of the written property.
pub fn set_value(path: &str, root: &Value, value: impl Into<Value>) -> Result<(), ReactiveError> {
    let segments = segments(path)?;
    let Some((last, parents)) = segments.split_last() else {
        return Err(ReactiveError::EmptyExpression);
    };

    let mut container = root.clone();
    for segment in parents {
        let Value::Object(object) = &container else {
            return Err(resolution_error(path, segment, &container));
        };
        container = object.get(segment).unwrap_or_default();
    }

    match &container {
        Value::Object(object) => object.set(last, value),
        other => Err(resolution_error(path, last, other)),
    }
}

/// Whether `template` contains at least one `{{ expr }}` occurrence.
#[must_use]
pub fn has_interpolation(template: &str) -> bool {
    INTERPOLATION.is_match(template)
}

/// The trimmed expressions of every `{{ expr }}` in `template`, in order.
/// Blank interpolations are skipped.
#[must_use]
pub fn interpolation_expressions(template: &str) -> Vec<&str> {
    INTERPOLATION
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|expr| !expr.is_empty())
        .collect()
}

/// Replace every `{{ expr }}` in `template` with the current value of `expr`.
///
/// The whole string is rebuilt on each call.
///
/// # Errors
///
/// The first resolution error of any embedded expression.
pub fn resolve_interpolations(template: &str, root: &Value) -> Result<String, ReactiveError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in INTERPOLATION.captures_iter(template) {
        let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&template[last..whole.start()]);
        if !expr.as_str().trim().is_empty() {
            let value = get_value(expr.as_str(), root)?;
            out.push_str(&value.to_string());
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}
