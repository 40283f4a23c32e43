//! HTTP request handlers for the log API.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use claw_logq::{Keys, LogFile, LogQueryEngine, PurgeReport, QueryOp, RetrievalRequest, RetrievalResponse};
use serde::Serialize;
use tracing::{Span, info};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the caller's API secret.
pub const API_SECRET_HEADER: &str = "x-api-secret";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status message.
    pub status: String,
}

/// Handle GET /health.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Handle POST {endpoint}: retrieve records in a time window.
///
/// Credentials are checked before the body is parsed.
pub async fn retrieve_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Json<RetrievalResponse>> {
    let keys = keys_from_headers(&headers);
    let engine = state.engine();
    engine.authorize(&keys)?;

    let request = parse_request(&body)?;
    let result = blocking(engine, move |engine| engine.retrieve(&keys, &request)).await?;

    info!(
        records = result.len(),
        truncated = result.truncated,
        "served log retrieval"
    );
    Ok(Json(result.into()))
}

/// Handle DELETE {endpoint}: rotate and remove every file but the current one.
pub async fn purge_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ServerResult<Json<PurgeReport>> {
    let keys = keys_from_headers(&headers);
    let report = blocking(state.engine(), move |engine| engine.purge(&keys)).await?;

    info!(removed = report.removed.len(), "logs restarted");
    Ok(Json(report))
}

/// Handle GET {endpoint}/files: list the log files in chronological order.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ServerResult<Json<Vec<LogFile>>> {
    let keys = keys_from_headers(&headers);
    let files = blocking(state.engine(), move |engine| engine.list_files(&keys)).await?;
    Ok(Json(files))
}

/// Extracts the key pair from the request headers; a missing header yields
/// an empty value, which no validator should accept.
pub fn keys_from_headers(headers: &HeaderMap) -> Keys {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    Keys::new(header(API_KEY_HEADER), header(API_SECRET_HEADER))
}

fn parse_request(body: &[u8]) -> ServerResult<RetrievalRequest> {
    let request: RetrievalRequest = serde_json::from_slice(body)
        .map_err(|e| ServerError::InvalidRequest(format!("malformed body: {e}")))?;

    if request
        .query
        .as_ref()
        .is_some_and(|query| query.op == QueryOp::Unsupported)
    {
        return Err(ServerError::InvalidRequest(
            "qtype must be one of eq, sw, ew, co".to_string(),
        ));
    }
    request.validate()?;
    Ok(request)
}

/// Runs synchronous engine work off the async workers, inside the caller's
/// span so its events keep the transaction id.
async fn blocking<T, F>(engine: Arc<LogQueryEngine>, work: F) -> ServerResult<T>
where
    T: Send + 'static,
    F: FnOnce(&LogQueryEngine) -> claw_logq::Result<T> + Send + 'static,
{
    let span = Span::current();
    let result = tokio::task::spawn_blocking(move || span.in_scope(|| work(&engine))).await?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn keys_from_headers_reads_both_halves() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("k"));
        headers.insert(API_SECRET_HEADER, HeaderValue::from_static("s"));
        let keys = keys_from_headers(&headers);
        assert_eq!(keys.api_key(), "k");
        assert_eq!(keys.api_secret(), "s");
    }

    #[test]
    fn missing_headers_are_empty() {
        let keys = keys_from_headers(&HeaderMap::new());
        assert_eq!(keys.api_key(), "");
        assert_eq!(keys.api_secret(), "");
    }

    #[test]
    fn parse_request_accepts_wire_form() {
        let body = br#"{
            "begin_time": "2006-01-02T15:04:05Z",
            "end_time": "2006-01-02T16:04:05Z",
            "query": {"qtype": "sw", "field": "msg", "value": "log 3"},
            "transaction_id": "tx"
        }"#;
        let request = parse_request(body).expect("request");
        assert_eq!(request.transaction_id.as_deref(), Some("tx"));
        assert_eq!(request.query.map(|q| q.op), Some(QueryOp::StartsWith));
    }

    #[test]
    fn parse_request_rejects_unsupported_operator() {
        let body = br#"{"query": {"qtype": "regex", "field": "msg", "value": "x"}}"#;
        assert!(matches!(
            parse_request(body),
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn parse_request_rejects_inverted_window() {
        let body = br#"{"begin_time": "2006-01-02T16:00:00Z", "end_time": "2006-01-02T15:00:00Z"}"#;
        assert!(matches!(
            parse_request(body),
            Err(ServerError::InvalidRequest(_))
        ));
    }

    #[test]
    fn parse_request_rejects_malformed_json() {
        assert!(matches!(
            parse_request(b"{not json"),
            Err(ServerError::InvalidRequest(_))
        ));
        assert!(matches!(
            parse_request(br#"{"begin_time": "yesterday"}"#),
            Err(ServerError::InvalidRequest(_))
        ));
    }
}
