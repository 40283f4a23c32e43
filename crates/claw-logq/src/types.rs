//! Core types for log retrieval.
//!
//! This module provides:
//! - [`LogRecord`] — One JSON line of a log file
//! - [`Query`] / [`QueryOp`] — Field-level predicate over a record
//! - [`RetrievalRequest`] — Time window plus optional filters
//! - [`RetrievalResult`] — Matching records and the truncation flag
//! - [`RetrievalResponse`] — Wire form of a result for HTTP callers

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LogQueryError, Result};

/// Name of the record's level field.
pub const FIELD_LEVEL: &str = "level";
/// Name of the record's timestamp field.
pub const FIELD_TIME: &str = "time";
/// Name of the record's message field.
pub const FIELD_MSG: &str = "msg";
/// Name of the record's correlation id field.
pub const FIELD_TRANSACTION_ID: &str = "transaction_id";
/// Name of the record's free-form nested payload.
pub const FIELD_DATA: &str = "data";

/// A single structured log record, stored as one JSON line.
///
/// Optional fields are omitted from the line entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity as written by the producer (`info`, `warning`, ...).
    pub level: String,
    /// When the record was written (UTC).
    pub time: DateTime<Utc>,
    /// The log message.
    pub msg: String,
    /// Correlation id shared by every record of one logical request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Arbitrary nested payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl LogRecord {
    /// Creates a record without correlation id or payload.
    #[must_use]
    pub fn new(level: impl Into<String>, time: DateTime<Utc>, msg: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            time,
            msg: msg.into(),
            transaction_id: None,
            data: None,
        }
    }

    /// Sets the correlation id.
    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Sets the nested payload.
    #[must_use]
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    /// Normalizes the record into a generic field mapping, keyed by the names
    /// the fields are published under on disk.
    ///
    /// `time` is rendered exactly as it is serialized. Absent optional fields
    /// are absent from the mapping.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(FIELD_LEVEL.to_string(), Value::String(self.level.clone()));
        fields.insert(
            FIELD_TIME.to_string(),
            Value::String(self.time.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        );
        fields.insert(FIELD_MSG.to_string(), Value::String(self.msg.clone()));
        if let Some(ref id) = self.transaction_id {
            fields.insert(FIELD_TRANSACTION_ID.to_string(), Value::String(id.clone()));
        }
        if let Some(ref data) = self.data {
            fields.insert(FIELD_DATA.to_string(), Value::Object(data.clone()));
        }
        fields
    }

    /// Serializes the record as a single line, including the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Comparison applied by a [`Query`] to the resolved field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOp {
    /// Exact equality; values of different types never match.
    #[serde(rename = "eq")]
    Equals,
    /// Textual prefix match.
    #[serde(rename = "sw")]
    StartsWith,
    /// Textual suffix match.
    #[serde(rename = "ew")]
    EndsWith,
    /// Textual substring match.
    #[serde(rename = "co")]
    Contains,
    /// Any operator name this engine does not know. Never matches.
    #[serde(other)]
    Unsupported,
}

impl QueryOp {
    /// Returns the wire name of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "eq",
            Self::StartsWith => "sw",
            Self::EndsWith => "ew",
            Self::Contains => "co",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Field-level predicate: `field` is a slash-separated path such as
/// `data/value/submsg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Operator to apply.
    #[serde(rename = "qtype")]
    pub op: QueryOp,
    /// Slash-separated field path.
    pub field: String,
    /// Value compared against the resolved field.
    pub value: Value,
}

impl Query {
    /// Creates a query.
    #[must_use]
    pub fn new(op: QueryOp, field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Shorthand for an [`QueryOp::Equals`] query.
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(QueryOp::Equals, field, value)
    }

    /// Shorthand for a [`QueryOp::StartsWith`] query.
    #[must_use]
    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(QueryOp::StartsWith, field, value.into())
    }

    /// Shorthand for an [`QueryOp::EndsWith`] query.
    #[must_use]
    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(QueryOp::EndsWith, field, value.into())
    }

    /// Shorthand for a [`QueryOp::Contains`] query.
    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(QueryOp::Contains, field, value.into())
    }
}

/// A retrieval request: a time window with optional correlation id and query.
///
/// A missing `begin_time` reads from the first record, a missing `end_time`
/// through the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    /// Inclusive lower bound.
    #[serde(default)]
    pub begin_time: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Field-level predicate.
    #[serde(default)]
    pub query: Option<Query>,
    /// Only records carrying this correlation id match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

impl RetrievalRequest {
    /// Creates a request for the inclusive window `[begin, end]`.
    #[must_use]
    pub const fn between(begin: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            begin_time: Some(begin),
            end_time: Some(end),
            query: None,
            transaction_id: None,
        }
    }

    /// Restricts the request to one correlation id.
    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Adds a field query.
    #[must_use]
    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Returns the correlation id filter, treating an empty id as no filter.
    #[must_use]
    pub fn transaction_filter(&self) -> Option<&str> {
        self.transaction_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Checks that the window is not inverted.
    ///
    /// # Errors
    ///
    /// Returns [`LogQueryError::InvalidRange`] if `end_time < begin_time`.
    pub fn validate(&self) -> Result<()> {
        if let (Some(begin), Some(end)) = (self.begin_time, self.end_time) {
            if end < begin {
                return Err(LogQueryError::InvalidRange { begin, end });
            }
        }
        Ok(())
    }
}

/// Records matched by one retrieval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    /// Matching records in chronological order.
    pub records: Vec<LogRecord>,
    /// True when the configured maximum was reached, so more matches may exist.
    pub truncated: bool,
}

impl RetrievalResult {
    /// Number of records returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Wire form of a [`RetrievalResult`].
///
/// `stop` is `false` exactly when the result hit the configured maximum and
/// the caller may page further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalResponse {
    /// Number of records in `result`.
    pub result_count: usize,
    /// False when more records may exist past the last one returned.
    pub stop: bool,
    /// The matching records.
    pub result: Vec<LogRecord>,
}

impl From<RetrievalResult> for RetrievalResponse {
    fn from(result: RetrievalResult) -> Self {
        Self {
            result_count: result.records.len(),
            stop: !result.truncated,
            result: result.records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }

    #[test]
    fn log_record_line_omits_absent_fields() {
        let record = LogRecord::new("info", at(1_136_214_245), "hello");
        let line = record.to_line().unwrap_or_default();
        assert_eq!(
            line,
            "{\"level\":\"info\",\"time\":\"2006-01-02T15:04:05Z\",\"msg\":\"hello\"}\n"
        );
    }

    #[test]
    fn log_record_roundtrips_optional_fields() {
        let mut data = Map::new();
        data.insert("value".to_string(), json!({"submsg": "This is the end"}));
        let record = LogRecord::new("info", at(1_136_214_245), "hello")
            .with_transaction_id("tx-1")
            .with_data(data);

        let line = record.to_line().unwrap_or_default();
        let parsed: LogRecord = serde_json::from_str(line.trim()).unwrap_or_else(|_| {
            LogRecord::new("error", at(0), "unparsable")
        });
        assert_eq!(parsed, record);
    }

    #[test]
    fn log_record_parses_foreign_lines() {
        let line = r#"{"level":"warning","msg":"slow","time":"2024-05-01T10:00:00.123Z","transaction_id":"abc","extra":1}"#;
        let parsed = serde_json::from_str::<LogRecord>(line);
        assert!(parsed.is_ok());
        if let Ok(record) = parsed {
            assert_eq!(record.level, "warning");
            assert_eq!(record.transaction_id.as_deref(), Some("abc"));
            assert!(record.data.is_none());
        }
    }

    #[test]
    fn log_record_fields_use_published_names() {
        let record = LogRecord::new("info", at(1_136_214_245), "hello").with_transaction_id("t");
        let fields = record.to_fields();
        assert_eq!(fields.get("level"), Some(&json!("info")));
        assert_eq!(fields.get("time"), Some(&json!("2006-01-02T15:04:05Z")));
        assert_eq!(fields.get("msg"), Some(&json!("hello")));
        assert_eq!(fields.get("transaction_id"), Some(&json!("t")));
        assert!(!fields.contains_key("data"));
    }

    #[test]
    fn query_op_wire_names() {
        let ops: Vec<QueryOp> =
            serde_json::from_str(r#"["eq","sw","ew","co","regex"]"#).unwrap_or_default();
        assert_eq!(
            ops,
            vec![
                QueryOp::Equals,
                QueryOp::StartsWith,
                QueryOp::EndsWith,
                QueryOp::Contains,
                QueryOp::Unsupported,
            ]
        );
        assert_eq!(QueryOp::EndsWith.as_str(), "ew");
    }

    #[test]
    fn retrieval_request_from_wire() {
        let body = r#"{
            "begin_time": "2024-01-01T00:00:00Z",
            "end_time": "2024-01-02T00:00:00Z",
            "query": {"qtype": "sw", "field": "msg", "value": "log 3"},
            "transaction_id": "tx"
        }"#;
        let request = serde_json::from_str::<RetrievalRequest>(body);
        assert!(request.is_ok());
        if let Ok(request) = request {
            assert!(request.begin_time.is_some());
            assert_eq!(request.query, Some(Query::starts_with("msg", "log 3")));
            assert_eq!(request.transaction_filter(), Some("tx"));
        }
    }

    #[test]
    fn retrieval_request_empty_transaction_is_no_filter() {
        let request = RetrievalRequest::between(at(0), at(10)).with_transaction_id("");
        assert_eq!(request.transaction_filter(), None);
    }

    #[test]
    fn retrieval_request_rejects_inverted_window() {
        assert!(RetrievalRequest::between(at(10), at(10)).validate().is_ok());
        assert!(matches!(
            RetrievalRequest::between(at(10), at(5)).validate(),
            Err(LogQueryError::InvalidRange { .. })
        ));
        assert!(RetrievalRequest::default().validate().is_ok());
    }

    #[test]
    fn response_stop_polarity() {
        let full = RetrievalResponse::from(RetrievalResult {
            records: vec![LogRecord::new("info", at(1), "a")],
            truncated: true,
        });
        assert_eq!(full.result_count, 1);
        assert!(!full.stop);

        let partial = RetrievalResponse::from(RetrievalResult::default());
        assert_eq!(partial.result_count, 0);
        assert!(partial.stop);

        let json = serde_json::to_value(&partial).unwrap_or_default();
        assert_eq!(json, json!({"resultCount": 0, "stop": true, "result": []}));
    }
}
