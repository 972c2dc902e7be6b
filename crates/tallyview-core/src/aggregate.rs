//! Sums, facets and grouped totals over a collection.

use crate::accessor;
use crate::predicate::Predicate;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Bucket for records whose group field is missing or empty
pub const UNKNOWN_GROUP: &str = "unknown";

/// Debit and credit totals split by a caller-supplied classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DebitCredit {
    pub debit: f64,
    pub credit: f64,
}

impl DebitCredit {
    pub fn net(&self) -> f64 {
        self.debit - self.credit
    }
}

/// Sum a numeric field; missing and non-numeric values count as 0
pub fn sum(collection: &[Value], field_path: &str) -> f64 {
    collection
        .iter()
        .map(|record| accessor::number(record, field_path))
        .sum()
}

/// Sum a numeric field over the records accepted by `predicate`
pub fn sum_where(collection: &[Value], field_path: &str, predicate: &Predicate) -> f64 {
    collection
        .iter()
        .filter(|record| predicate.matches(record))
        .map(|record| accessor::number(record, field_path))
        .sum()
}

/// Split absolute amounts into debit and credit totals.
///
/// Records accepted by `is_debit` add `|amount|` to the debit side, all others
/// to the credit side. The classification rule belongs to the caller since
/// each screen encodes sign and type differently.
pub fn split_debit_credit(collection: &[Value], amount_path: &str, is_debit: &Predicate) -> DebitCredit {
    collection.iter().fold(DebitCredit::default(), |mut acc, record| {
        let amount = accessor::number(record, amount_path).abs();
        if is_debit.matches(record) {
            acc.debit += amount;
        } else {
            acc.credit += amount;
        }
        acc
    })
}

/// Distinct non-empty values of a field, lower-cased, in first-seen order
pub fn unique_values(collection: &[Value], field_path: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for record in collection {
        let value = accessor::text(record, field_path);
        if value.trim().is_empty() {
            continue;
        }
        let value = value.to_lowercase();
        if seen.insert(value.clone()) {
            values.push(value);
        }
    }
    values
}

fn group_key(record: &Value, group_field_path: &str) -> String {
    let key = accessor::text(record, group_field_path);
    if key.is_empty() {
        UNKNOWN_GROUP.to_string()
    } else {
        key
    }
}

/// Sum `sum_field_path` per distinct string form of `group_field_path`
pub fn group_sum(collection: &[Value], group_field_path: &str, sum_field_path: &str) -> BTreeMap<String, f64> {
    let mut groups = BTreeMap::new();
    for record in collection {
        *groups.entry(group_key(record, group_field_path)).or_insert(0.0) +=
            accessor::number(record, sum_field_path);
    }
    groups
}

/// Record count per distinct string form of `group_field_path`
pub fn count_by(collection: &[Value], group_field_path: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in collection {
        *counts.entry(group_key(record, group_field_path)).or_insert(0) += 1;
    }
    counts
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::build_exact;
    use serde_json::json;

    fn transactions() -> Vec<Value> {
        vec![
            json!({"status": "completed", "amount": 100, "category": "Rent"}),
            json!({"status": "pending", "amount": "50", "category": "Travel"}),
            json!({"status": "Completed", "amount": "n/a", "category": "Rent"}),
            json!({"status": "", "amount": 25.5}),
            json!("not an object"),
        ]
    }

    #[test]
    fn test_sum_coerces_and_ignores_garbage() {
        assert_eq!(sum(&transactions(), "amount"), 175.5);
        assert_eq!(sum(&[], "amount"), 0.0);
        assert_eq!(sum(&transactions(), "missing.path"), 0.0);
    }

    #[test]
    fn test_sum_where() {
        let completed = build_exact("status", "completed");
        assert_eq!(sum_where(&transactions(), "amount", &completed), 100.0);
    }

    #[test]
    fn test_split_debit_credit() {
        let rows = vec![
            json!({"amount": -40, "type": "withdrawal"}),
            json!({"amount": 100, "type": "deposit"}),
            json!({"amount": -10, "type": "withdrawal"}),
        ];
        let is_debit = Predicate::new(|r| crate::accessor::number(r, "amount") < 0.0);
        let totals = split_debit_credit(&rows, "amount", &is_debit);
        assert_eq!(totals.debit, 50.0);
        assert_eq!(totals.credit, 100.0);
        assert_eq!(totals.net(), -50.0);
    }

    #[test]
    fn test_unique_values_first_seen_lowercased() {
        let values = unique_values(&transactions(), "status");
        assert_eq!(values, vec!["completed", "pending"]);
    }

    #[test]
    fn test_unique_values_is_idempotent() {
        let rows = transactions();
        assert_eq!(unique_values(&rows, "category"), unique_values(&rows, "category"));
        assert_eq!(unique_values(&rows, "category"), vec!["rent", "travel"]);
    }

    #[test]
    fn test_group_sum_unknown_bucket() {
        let groups = group_sum(&transactions(), "category", "amount");
        assert_eq!(groups.get("Rent"), Some(&100.0));
        assert_eq!(groups.get("Travel"), Some(&50.0));
        assert_eq!(groups.get(UNKNOWN_GROUP), Some(&25.5));
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_count_by() {
        let counts = count_by(&transactions(), "category");
        assert_eq!(counts.get("Rent"), Some(&2));
        assert_eq!(counts.get(UNKNOWN_GROUP), Some(&2));
    }
}
