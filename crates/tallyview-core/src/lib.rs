//! Derived view engine for list screens.
//!
//! A list screen fetches an array of loosely-typed JSON records and needs the
//! same derived data every time: rows matching the search box and status
//! dropdown, totals over those rows, the dropdown options, and a CSV export.
//! Everything here is a pure function of its inputs except [`source`], which
//! normalizes what the backend returned.

pub mod accessor;
pub mod aggregate;
pub mod error;
pub mod export;
pub mod predicate;
pub mod sort;
pub mod source;
pub mod time;
pub mod view;

pub use accessor::{get, record_key};
pub use aggregate::{group_sum, split_debit_credit, sum, unique_values, DebitCredit};
pub use error::{CoreError, CoreResult, ErrorSeverity};
pub use export::{to_delimited, CellFormatter, Exporter, CSV_MIME_TYPE};
pub use predicate::{and, build, build_exact, Predicate};
pub use sort::SortSpec;
pub use source::{normalize_outcome, normalize_payload, CollectionSource, FetchOutcome, FileSource, StaticSource};
pub use time::TimeContext;
pub use view::{compute_view, AggregateField, FilterState, Page, ViewEngine, ViewResult, ViewSpec};
