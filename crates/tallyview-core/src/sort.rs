//! Optional ordering of visible rows

use crate::accessor;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use tallyview_config::{SortConfig, SortDirection};

/// Sort request: a field path and a direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Parse `field` or `field:asc|desc`
    pub fn parse(spec: &str) -> CoreResult<Self> {
        let (field, direction) = match spec.rsplit_once(':') {
            Some((field, dir)) => {
                let direction = dir.parse::<SortDirection>().map_err(|_| CoreError::InvalidSort {
                    spec: spec.to_string(),
                })?;
                (field, direction)
            }
            None => (spec, SortDirection::Asc),
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(CoreError::InvalidSort {
                spec: spec.to_string(),
            });
        }
        Ok(Self::new(field, direction))
    }
}

impl From<&SortConfig> for SortSpec {
    fn from(config: &SortConfig) -> Self {
        Self::new(config.field.clone(), config.direction)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Compare two resolved values: numerically when both are numeric, otherwise
/// by case-insensitive string form. Numeric values rank before text so the
/// ordering stays total over mixed columns.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (accessor::as_number(a), accessor::as_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => accessor::display_value(a)
            .to_lowercase()
            .cmp(&accessor::display_value(b).to_lowercase()),
    }
}

/// Stable sort by `spec`; rows with a blank sort field always go last
pub fn sort_rows(rows: &mut [Value], spec: &SortSpec) {
    rows.sort_by(|a, b| {
        let left = accessor::get(a, &spec.field).filter(|v| !is_blank(v));
        let right = accessor::get(b, &spec.field).filter(|v| !is_blank(v));
        match (left, right) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(left), Some(right)) => {
                let ordering = compare_values(left, right);
                match spec.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
        }
    });
}

// ==================== Tests ====================
