//! Record predicates: free-text search, exact field match and combinators.

use crate::accessor;
use serde_json::Value;
use std::fmt;

/// Status values that turn the exact-match filter into a passthrough
pub const DEFAULT_ALL_SENTINELS: [&str; 2] = ["All Status", "all"];

/// A boxed single-record test
pub struct Predicate {
    test: Box<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Predicate {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Box::new(test),
        }
    }

    /// A predicate accepting every record
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    pub fn matches(&self, record: &Value) -> bool {
        (self.test)(record)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

/// Case-insensitive substring search across several fields.
///
/// The resolved values are lower-cased and joined with a single space before
/// the containment test, so a query may span adjacent fields. A blank query
/// matches everything.
pub fn build<S: AsRef<str>>(query: &str, field_paths: &[S]) -> Predicate {
    if query.trim().is_empty() {
        return Predicate::always();
    }

    let needle = query.to_lowercase();
    let paths: Vec<String> = field_paths.iter().map(|p| p.as_ref().to_string()).collect();
    Predicate::new(move |record| {
        let haystack = paths
            .iter()
            .map(|path| accessor::text(record, path).to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        haystack.contains(&needle)
    })
}

/// Exact, case-insensitive match of one field against `value`.
///
/// `"All Status"`, `"all"` and an empty value match every record.
pub fn build_exact(field_path: &str, value: &str) -> Predicate {
    build_exact_with::<&str>(field_path, value, &[])
}

/// Like [`build_exact`], with extra passthrough values.
///
/// `sentinels` adds to [`DEFAULT_ALL_SENTINELS`]; it never replaces them.
pub fn build_exact_with<S: AsRef<str>>(field_path: &str, value: &str, sentinels: &[S]) -> Predicate {
    let wanted = value.trim().to_lowercase();
    let is_sentinel = |s: &str| s.trim().to_lowercase() == wanted;
    if wanted.is_empty()
        || DEFAULT_ALL_SENTINELS.iter().any(|s| is_sentinel(*s))
        || sentinels.iter().any(|s| is_sentinel(s.as_ref()))
    {
        return Predicate::always();
    }

    let path = field_path.to_string();
    let wanted = value.to_lowercase();
    Predicate::new(move |record| accessor::text(record, &path).to_lowercase() == wanted)
}

/// Short-circuiting conjunction; an empty list accepts everything
pub fn and(predicates: Vec<Predicate>) -> Predicate {
    Predicate::new(move |record| predicates.iter().all(|p| p.matches(record)))
}

/// Short-circuiting disjunction; an empty list rejects everything
pub fn or(predicates: Vec<Predicate>) -> Predicate {
    Predicate::new(move |record| predicates.iter().any(|p| p.matches(record)))
}

pub fn not(predicate: Predicate) -> Predicate {
    Predicate::new(move |record| !predicate.matches(record))
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_blank_query_matches_everything() {
        let p = build("   ", &["description"]);
        assert!(p.matches(&json!({})));
        assert!(p.matches(&Value::Null));
        assert!(build("", &["description"]).matches(&json!({"description": "x"})));
    }

    #[test]
    fn test_query_is_case_insensitive() {
        let p = build("RENT", &["description"]);
        assert!(p.matches(&json!({"description": "Office Rent"})));
        assert!(!p.matches(&json!({"description": "Sales Revenue"})));
    }

    #[test]
    fn test_query_searches_every_field() {
        let p = build("acme", &["description", "vendor.name"]);
        assert!(p.matches(&json!({"description": "Invoice", "vendor": {"name": "ACME Ltd"}})));
        assert!(!p.matches(&json!({"description": "Invoice"})));
    }

    #[test]
    fn test_query_spans_joined_fields() {
        let p = build("rent 2024", &["description", "year"]);
        assert!(p.matches(&json!({"description": "Office Rent", "year": 2024})));
    }

    #[test]
    fn test_query_matches_numbers() {
        let p = build("150", &["amount"]);
        assert!(p.matches(&json!({"amount": 1500})));
        assert!(!p.matches(&json!({"amount": 15})));
    }

    #[test]
    fn test_exact_match() {
        let p = build_exact("status", "Completed");
        assert!(p.matches(&json!({"status": "completed"})));
        assert!(!p.matches(&json!({"status": "completed-late"})));
        assert!(!p.matches(&json!({})));
    }

    #[test]
    fn test_exact_sentinels_pass_through() {
        for value in ["All Status", "all", "ALL", "All", ""] {
            let p = build_exact("status", value);
            assert!(p.matches(&json!({"status": "pending"})), "{value}");
            assert!(p.matches(&json!({})), "{value}");
        }
    }

    #[test]
    fn test_exact_custom_sentinels() {
        let p = build_exact_with("type", "All Types", &["All Types"]);
        assert!(p.matches(&json!({"type": "sales"})));

        let p = build_exact_with("type", "sales", &["All Types"]);
        assert!(p.matches(&json!({"type": "Sales"})));
        assert!(!p.matches(&json!({"type": "purchase"})));
    }

    #[test]
    fn test_custom_sentinels_keep_defaults() {
        for value in ["All Status", "all", "Todos"] {
            let p = build_exact_with("status", value, &["Todos"]);
            assert!(p.matches(&json!({"status": "pending"})), "{value}");
        }
    }

    #[test]
    fn test_and_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let counting = Predicate::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        let p = and(vec![Predicate::new(|_| false), counting]);
        assert!(!p.matches(&json!({})));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_combinators() {
        assert!(and(vec![]).matches(&json!({})));
        assert!(!or(vec![]).matches(&json!({})));
    }

    #[test]
    fn test_or_and_not() {
        let p = or(vec![build_exact("status", "paid"), build_exact("status", "draft")]);
        assert!(p.matches(&json!({"status": "draft"})));
        assert!(!p.matches(&json!({"status": "void"})));
        assert!(not(p).matches(&json!({"status": "void"})));
    }
}
