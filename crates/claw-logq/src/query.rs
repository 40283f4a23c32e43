//! Evaluation of field queries against records.
//!
//! A query's field path is split on `/`. The first segment names one of the
//! record's own fields (`level`, `time`, `msg`, `transaction_id`, `data`); each
//! following segment descends one level into a nested object.

use serde_json::{Map, Value};

use crate::types::{LogRecord, Query, QueryOp};

/// Returns true if `record` satisfies `query`.
///
/// An unresolvable path, an unsupported operator, or a textual operator applied
/// to a non-textual value all reject the record.
#[must_use]
pub fn evaluate(query: &Query, record: &LogRecord) -> bool {
    let fields = record.to_fields();
    resolve(&fields, &query.field).is_some_and(|actual| compare(query.op, actual, &query.value))
}

/// Resolves a slash-separated path inside a field mapping.
#[must_use]
pub fn resolve<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('/');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Applies `op` with `actual` as the record's value and `expected` as the
/// query's value.
#[must_use]
pub fn compare(op: QueryOp, actual: &Value, expected: &Value) -> bool {
    match op {
        QueryOp::Equals => values_equal(actual, expected),
        QueryOp::StartsWith => text_pair(actual, expected).is_some_and(|(a, e)| a.starts_with(e)),
        QueryOp::EndsWith => text_pair(actual, expected).is_some_and(|(a, e)| a.ends_with(e)),
        QueryOp::Contains => text_pair(actual, expected).is_some_and(|(a, e)| a.contains(e)),
        QueryOp::Unsupported => false,
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        // JSON does not distinguish 1 from 1.0.
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64().zip(b.as_f64()).is_some_and(|(a, b)| a == b),
            },
        },
        _ => actual == expected,
    }
}

fn text_pair<'a>(actual: &'a Value, expected: &'a Value) -> Option<(&'a str, &'a str)> {
    Some((actual.as_str()?, expected.as_str()?))
}
