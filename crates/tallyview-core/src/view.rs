//! View engine: turns a fetched collection plus the screen's filter state
//! into the rows, totals and status facets the screen renders.
//!
//! Every call is a fresh derivation. The input collection is never mutated;
//! without a sort, `visible_rows` keeps the collection's relative order, and
//! aggregates are computed over `visible_rows` only. Status facets are always
//! drawn from the whole collection so the dropdown does not shrink as the
//! user filters.

use crate::aggregate;
use crate::predicate::{self, Predicate, DEFAULT_ALL_SENTINELS};
use crate::sort::{sort_rows, SortSpec};
use crate::time::{build_date_range_on, TimeContext};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tallyview_config::{Config, GroupByConfig};

/// Status value meaning "no status filter"
pub const ALL_STATUS: &str = "All";

/// Per-screen, user-driven filter inputs
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    /// Free-text search box contents
    pub query: String,
    /// Overrides the view's status field when non-empty
    pub status_field_path: String,
    /// Selected status, or a passthrough sentinel
    pub status_value: String,
    /// Requested ordering of visible rows
    pub sort: Option<SortSpec>,
    /// Date window over the view's date field
    pub time: Option<TimeContext>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            status_field_path: String::new(),
            status_value: ALL_STATUS.to_string(),
            sort: None,
            time: None,
        }
    }
}

impl FilterState {
    pub fn new(query: impl Into<String>, status_value: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            status_value: status_value.into(),
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_time(mut self, time: TimeContext) -> Self {
        self.time = Some(time);
        self
    }

    /// Build from loosely-typed UI state.
    ///
    /// Non-string `query`/`statusValue` fields are treated as absent. Both
    /// camelCase and snake_case keys are accepted.
    pub fn from_value(value: &Value) -> Self {
        let field = |camel: &str, snake: &str| {
            value
                .get(camel)
                .or_else(|| value.get(snake))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            query: field("query", "query").unwrap_or_default(),
            status_field_path: field("statusFieldPath", "status_field_path").unwrap_or_default(),
            status_value: field("statusValue", "status_value")
                .unwrap_or_else(|| ALL_STATUS.to_string()),
            sort: field("sort", "sort").and_then(|s| SortSpec::parse(&s).ok()),
            time: field("timeRange", "time_range").and_then(|s| TimeContext::parse(&s).ok()),
        }
    }
}

/// A named sum over a numeric field path
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateField {
    pub key: String,
    pub field_path: String,
}

impl AggregateField {
    pub fn new(key: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field_path: field_path.into(),
        }
    }
}

/// Static description of one list screen
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub search_field_paths: Vec<String>,
    pub status_field_path: String,
    pub date_field_path: String,
    pub aggregates: Vec<AggregateField>,
    pub group_by: Option<GroupByConfig>,
    pub all_sentinels: Vec<String>,
    pub default_sort: Option<SortSpec>,
}

impl Default for ViewSpec {
    fn default() -> Self {
        Self {
            search_field_paths: vec![],
            status_field_path: "status".to_string(),
            date_field_path: "date".to_string(),
            aggregates: vec![],
            group_by: None,
            all_sentinels: DEFAULT_ALL_SENTINELS.iter().map(|s| s.to_string()).collect(),
            default_sort: None,
        }
    }
}

impl ViewSpec {
    pub fn from_config(config: &Config) -> Self {
        let view = &config.view;
        Self {
            search_field_paths: view.search_fields.clone(),
            status_field_path: view.status_field.clone(),
            date_field_path: view.date_field.clone(),
            aggregates: view
                .aggregates
                .iter()
                .map(|a| AggregateField::new(a.key.clone(), a.field.clone()))
                .collect(),
            group_by: view.group_by.clone(),
            all_sentinels: view.all_sentinels.clone(),
            default_sort: view.default_sort.as_ref().map(SortSpec::from),
        }
    }
}

/// Derived view of a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewResult {
    pub visible_rows: Vec<Value>,
    pub total_count: usize,
    pub aggregates: BTreeMap<String, f64>,
    pub facet_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<String, f64>>,
}

/// One page of visible rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a> {
    pub rows: &'a [Value],
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
}

impl ViewResult {
    pub fn total_pages(&self, per_page: usize) -> usize {
        let per_page = per_page.max(1);
        self.total_count.div_ceil(per_page)
    }

    /// Slice out a 1-based page; page 0 is treated as page 1 and pages past
    /// the end are empty.
    pub fn page(&self, page: usize, per_page: usize) -> Page<'_> {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let len = self.visible_rows.len();
        let start = (page - 1).saturating_mul(per_page).min(len);
        let end = start.saturating_add(per_page).min(len);
        Page {
            rows: &self.visible_rows[start..end],
            page,
            per_page,
            total_pages: self.total_pages(per_page),
            total_count: self.total_count,
        }
    }
}

/// Computes [`ViewResult`]s for one [`ViewSpec`]
#[derive(Debug, Clone, Default)]
pub struct ViewEngine {
    spec: ViewSpec,
}

impl ViewEngine {
    pub fn new(spec: ViewSpec) -> Self {
        Self { spec }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ViewSpec::from_config(config))
    }

    pub fn spec(&self) -> &ViewSpec {
        &self.spec
    }

    fn status_field<'a>(&'a self, filter: &'a FilterState) -> &'a str {
        if filter.status_field_path.is_empty() {
            &self.spec.status_field_path
        } else {
            &filter.status_field_path
        }
    }

    fn predicate_on(&self, filter: &FilterState, today: NaiveDate) -> Predicate {
        let mut predicates = vec![
            predicate::build(&filter.query, &self.spec.search_field_paths),
            predicate::build_exact_with(
                self.status_field(filter),
                &filter.status_value,
                &self.spec.all_sentinels,
            ),
        ];
        if let Some(time) = &filter.time {
            predicates.push(build_date_range_on(time, &self.spec.date_field_path, today));
        }
        predicate::and(predicates)
    }

    /// Derive the view relative to the local current date
    pub fn compute(&self, collection: &[Value], filter: &FilterState) -> ViewResult {
        self.compute_on(collection, filter, Local::now().date_naive())
    }

    /// Derive the view; `today` anchors relative time ranges
    pub fn compute_on(&self, collection: &[Value], filter: &FilterState, today: NaiveDate) -> ViewResult {
        let predicate = self.predicate_on(filter, today);
        let mut visible_rows: Vec<Value> = collection
            .iter()
            .filter(|record| predicate.matches(record))
            .cloned()
            .collect();

        if let Some(sort) = filter.sort.as_ref().or(self.spec.default_sort.as_ref()) {
            sort_rows(&mut visible_rows, sort);
        }

        let aggregates = self
            .spec
            .aggregates
            .iter()
            .map(|a| (a.key.clone(), aggregate::sum(&visible_rows, &a.field_path)))
            .collect();

        let groups = self
            .spec
            .group_by
            .as_ref()
            .map(|g| aggregate::group_sum(&visible_rows, &g.group_field, &g.sum_field));

        let facet_values = aggregate::unique_values(collection, self.status_field(filter));

        log::debug!(
            "view computed: {} of {} rows visible, {} facets",
            visible_rows.len(),
            collection.len(),
            facet_values.len()
        );

        ViewResult {
            total_count: visible_rows.len(),
            visible_rows,
            aggregates,
            facet_values,
            groups,
        }
    }
}

/// One-shot view computation without a configured [`ViewSpec`]
pub fn compute_view<S: AsRef<str>>(
    collection: &[Value],
    filter: &FilterState,
    search_field_paths: &[S],
    status_field_path: &str,
    aggregates: &[AggregateField],
) -> ViewResult {
    let engine = ViewEngine::new(ViewSpec {
        search_field_paths: search_field_paths.iter().map(|p| p.as_ref().to_string()).collect(),
        status_field_path: status_field_path.to_string(),
        aggregates: aggregates.to_vec(),
        ..ViewSpec::default()
    });
    engine.compute(collection, filter)
}

// ==================== Tests ====================
