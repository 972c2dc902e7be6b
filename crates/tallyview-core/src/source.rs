//! Collections as delivered by the backend.
//!
//! List endpoints answer with a bare array, a `{count, items}` envelope or a
//! `{total_count, entries}` envelope, and some answer 404 when there is
//! nothing to list. All of these normalize to a plain `Vec<Value>` before the
//! view engine sees them; anything unrecognizable becomes an empty list.

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorContext, ErrorLogger};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

/// Envelope keys holding the record list, in lookup order
const ENVELOPE_KEYS: [&str; 2] = ["items", "entries"];

/// Raw result of asking a collaborator for a list
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A decoded response body
    Payload(Value),
    /// The collaborator reported "not found" (HTTP 404)
    NotFound,
}

/// Extract the record list from a response body
pub fn normalize_payload(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows,
        Value::Object(mut map) => {
            for key in ENVELOPE_KEYS {
                if let Some(Value::Array(rows)) = map.remove(key) {
                    log::debug!("unwrapped '{}' envelope with {} rows", key, rows.len());
                    return rows;
                }
            }
            let keys: Vec<&String> = map.keys().collect();
            let context = fallback_context("object").with_data("keys", serde_json::json!(keys));
            DefaultErrorLogger.log_warning("unrecognized collection envelope, treating as empty", &context);
            vec![]
        }
        Value::Null => vec![],
        other => {
            let context = fallback_context(payload_kind(&other));
            DefaultErrorLogger.log_warning("expected a collection, got a scalar; treating as empty", &context);
            vec![]
        }
    }
}

fn payload_kind(payload: &Value) -> &'static str {
    match payload {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn fallback_context(kind: &str) -> ErrorContext {
    ErrorContext::new("normalize_payload".to_string()).with_data("kind", serde_json::json!(kind))
}

/// A 404 is an empty list, not an error
pub fn normalize_outcome(outcome: FetchOutcome) -> Vec<Value> {
    match outcome {
        FetchOutcome::Payload(payload) => normalize_payload(payload),
        FetchOutcome::NotFound => vec![],
    }
}

/// Anything that can produce a list payload
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> String;

    /// Fetch the raw payload
    async fn fetch(&self) -> CoreResult<FetchOutcome>;

    /// Fetch and normalize into records
    async fn load(&self) -> CoreResult<Vec<Value>> {
        let rows = normalize_outcome(self.fetch().await?);
        log::info!("loaded {} records from {}", rows.len(), self.name());
        Ok(rows)
    }
}

/// A JSON file holding a recorded response body
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    missing_as_not_found: bool,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            missing_as_not_found: false,
        }
    }

    /// Treat a missing file like a 404 (empty list) instead of an error
    pub fn missing_ok(mut self, missing_ok: bool) -> Self {
        self.missing_as_not_found = missing_ok;
        self
    }
}

#[async_trait]
impl CollectionSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> CoreResult<FetchOutcome> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.missing_as_not_found {
                    return Ok(FetchOutcome::NotFound);
                }
                return Err(CoreError::SourceNotFound {
                    path: self.name(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(FetchOutcome::Payload(Value::Null));
        }
        Ok(FetchOutcome::Payload(serde_json::from_str(&content)?))
    }
}

/// An in-memory payload, for embedding and tests
#[derive(Debug, Clone)]
pub struct StaticSource {
    outcome: FetchOutcome,
}

impl StaticSource {
    pub fn new(payload: Value) -> Self {
        Self {
            outcome: FetchOutcome::Payload(payload),
        }
    }

    pub fn not_found() -> Self {
        Self {
            outcome: FetchOutcome::NotFound,
        }
    }
}

#[async_trait]
impl CollectionSource for StaticSource {
    fn name(&self) -> String {
        "static".to_string()
    }

    async fn fetch(&self) -> CoreResult<FetchOutcome> {
        Ok(self.outcome.clone())
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tallyview-{}-{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_normalize_bare_array() {
        let rows = normalize_payload(json!([{"id": 1}, {"id": 2}]));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_normalize_envelopes() {
        let rows = normalize_payload(json!({"count": 1, "items": [{"id": "a"}]}));
        assert_eq!(rows, vec![json!({"id": "a"})]);

        let rows = normalize_payload(json!({"total_count": 2, "entries": [{"id": 1}, {"id": 2}]}));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_normalize_malformed_is_empty() {
        assert!(normalize_payload(json!({"items": "nope"})).is_empty());
        assert!(normalize_payload(json!({"detail": "error"})).is_empty());
        assert!(normalize_payload(json!(42)).is_empty());
        assert!(normalize_payload(Value::Null).is_empty());
    }

    #[test]
    fn test_fallback_context_records_payload_kind() {
        assert_eq!(payload_kind(&json!("oops")), "string");
        assert_eq!(payload_kind(&json!(true)), "bool");

        let context = fallback_context(payload_kind(&json!(42)));
        assert_eq!(context.operation, "normalize_payload");
        assert_eq!(context.data["kind"], "number");
    }

    #[test]
    fn test_not_found_is_empty() {
        assert!(normalize_outcome(FetchOutcome::NotFound).is_empty());
    }

    #[tokio::test]
    async fn test_static_source() {
        let rows = StaticSource::new(json!({"count": 1, "items": [{"id": 1}]}))
            .load()
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(StaticSource::not_found().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_source() {
        let path = temp_file("entries.json", r#"{"total_count": 1, "entries": [{"amount": 5}]}"#);
        let rows = FileSource::new(&path).load().await.unwrap();
        assert_eq!(rows, vec![json!({"amount": 5})]);
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_file_source_missing() {
        let path = std::env::temp_dir().join("tallyview-does-not-exist.json");
        let err = FileSource::new(&path).load().await.unwrap_err();
        assert!(matches!(err, CoreError::SourceNotFound { .. }));

        let rows = FileSource::new(&path).missing_ok(true).load().await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_file_source_invalid_json() {
        let path = temp_file("broken.json", "[{\"id\": 1,");
        let err = FileSource::new(&path).load().await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidPayload { .. }));
        std::fs::remove_file(path).unwrap();
    }
}
