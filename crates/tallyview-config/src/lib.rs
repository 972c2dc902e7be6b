//! Configuration management for tallyview
//!
//! A configuration file describes one list screen: which record fields the
//! search box looks at, which field drives the status dropdown, which numeric
//! fields are totalled, and how the CSV export is laid out.

pub mod error;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub use error::{ConfigError, ConfigResult};

// ==================== Configuration Types ====================

/// A named sum over a numeric field path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Key under which the sum is reported (e.g. "debit")
    pub key: String,
    /// Dotted field path to sum (e.g. "invoice_data.totals.Total_with_Tax")
    pub field: String,
}

/// Grouped sum, e.g. totals per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupByConfig {
    pub group_field: String,
    pub sum_field: String,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Asc
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(format!("Invalid sort direction: {}", s)),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Sort settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// View settings for one list screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Field paths concatenated for free-text search
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,
    /// Field path of the status dropdown
    #[serde(default = "default_status_field")]
    pub status_field: String,
    /// Field path holding the record date, used by time range filtering
    #[serde(default = "default_date_field")]
    pub date_field: String,
    /// Sums reported for the visible rows
    #[serde(default = "default_aggregates")]
    pub aggregates: Vec<AggregateConfig>,
    /// Optional grouped sum
    #[serde(default)]
    pub group_by: Option<GroupByConfig>,
    /// Status values that disable the status filter
    #[serde(default = "default_all_sentinels")]
    pub all_sentinels: Vec<String>,
    /// Sort applied when the caller does not request one
    #[serde(default)]
    pub default_sort: Option<SortConfig>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            search_fields: default_search_fields(),
            status_field: default_status_field(),
            date_field: default_date_field(),
            aggregates: default_aggregates(),
            group_by: None,
            all_sentinels: default_all_sentinels(),
            default_sort: None,
        }
    }
}

fn default_search_fields() -> Vec<String> {
    vec!["description".to_string(), "reference".to_string()]
}

fn default_status_field() -> String {
    "status".to_string()
}

fn default_date_field() -> String {
    "date".to_string()
}

fn default_aggregates() -> Vec<AggregateConfig> {
    vec![
        AggregateConfig {
            key: "debit".to_string(),
            field: "debit".to_string(),
        },
        AggregateConfig {
            key: "credit".to_string(),
            field: "credit".to_string(),
        },
        AggregateConfig {
            key: "total".to_string(),
            field: "amount".to_string(),
        },
    ]
}

fn default_all_sentinels() -> Vec<String> {
    vec!["All Status".to_string(), "all".to_string()]
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records per page for lists
    #[serde(default = "default_records_per_page")]
    pub records_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            records_per_page: default_records_per_page(),
        }
    }
}

fn default_records_per_page() -> usize {
    50
}

/// Time range configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRangeConfig {
    /// Default time range (e.g., "month", "quarter", "year", "all")
    #[serde(default)]
    pub default_range: TimeRange,
    /// Fiscal year start month (1-12)
    #[serde(default = "default_fiscal_start")]
    pub fiscal_year_start: u32,
}

impl Default for TimeRangeConfig {
    fn default() -> Self {
        Self {
            default_range: TimeRange::All,
            fiscal_year_start: default_fiscal_start(),
        }
    }
}

fn default_fiscal_start() -> u32 {
    1
}

/// Time range enumeration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    /// Current month
    Month,
    /// Current quarter
    Quarter,
    /// Current (fiscal) year
    Year,
    /// All time
    All,
    /// Custom range
    Custom,
}

impl Default for TimeRange {
    fn default() -> Self {
        TimeRange::All
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" => Ok(TimeRange::Month),
            "quarter" => Ok(TimeRange::Quarter),
            "year" => Ok(TimeRange::Year),
            "all" => Ok(TimeRange::All),
            "custom" => Ok(TimeRange::Custom),
            _ => Err(format!("Invalid time range: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeRange::Month => write!(f, "month"),
            TimeRange::Quarter => write!(f, "quarter"),
            TimeRange::Year => write!(f, "year"),
            TimeRange::All => write!(f, "all"),
            TimeRange::Custom => write!(f, "custom"),
        }
    }
}

/// How an exported cell is rendered
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellFormat {
    /// Plain string form of the value
    Text,
    /// Number with configured decimals and separators
    Amount,
    /// Date rendered with `export.date_format`
    Date,
}

impl Default for CellFormat {
    fn default() -> Self {
        CellFormat::Text
    }
}

/// One exported column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportColumnConfig {
    pub header: String,
    pub field: String,
    #[serde(default)]
    pub format: CellFormat,
}

/// CSV export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Exported columns in order
    #[serde(default)]
    pub columns: Vec<ExportColumnConfig>,
    /// Append a totals row
    #[serde(default = "default_true")]
    pub include_totals: bool,
    /// Label placed in the first cell of the totals row
    #[serde(default = "default_totals_label")]
    pub totals_label: String,
    /// Download file name prefix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// chrono format string for date cells
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            columns: vec![],
            include_totals: true,
            totals_label: default_totals_label(),
            file_prefix: default_file_prefix(),
            date_format: default_date_format(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_totals_label() -> String {
    "Total".to_string()
}

fn default_file_prefix() -> String {
    "export".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

/// Currency and number formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    /// Symbol printed on amount cells; empty prints bare numbers
    #[serde(default)]
    pub symbol: String,
    /// Number of decimal places
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Thousands separator
    #[serde(default = "default_thousands_sep")]
    pub thousands_separator: String,
    /// Decimal separator
    #[serde(default = "default_decimal_sep")]
    pub decimal_separator: String,
    /// Where `symbol` goes: "before" or "after" the amount
    #[serde(default)]
    pub symbol_position: SymbolPosition,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            decimal_places: default_decimal_places(),
            thousands_separator: default_thousands_sep(),
            decimal_separator: default_decimal_sep(),
            symbol_position: SymbolPosition::Before,
        }
    }
}

fn default_decimal_places() -> u32 {
    2
}

fn default_thousands_sep() -> String {
    ",".to_string()
}

fn default_decimal_sep() -> String {
    ".".to_string()
}

/// Currency symbol position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Before,
    After,
}

impl Default for SymbolPosition {
    fn default() -> Self {
        SymbolPosition::Before
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// View settings
    #[serde(default)]
    pub view: ViewConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Time range settings
    #[serde(default)]
    pub time_range: TimeRangeConfig,
    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
    /// Currency settings
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::IoError(e),
        })?;

        let config = Self::from_yaml_str(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml {
            message: e.to_string(),
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pagination.records_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.records_per_page".to_string(),
                reason: "Records per page must be greater than 0".to_string(),
            });
        }

        if self.time_range.fiscal_year_start < 1 || self.time_range.fiscal_year_start > 12 {
            return Err(ConfigError::InvalidValue {
                field: "time_range.fiscal_year_start".to_string(),
                reason: "Fiscal year start must be between 1 and 12".to_string(),
            });
        }

        if self.currency.decimal_places > 10 {
            return Err(ConfigError::InvalidValue {
                field: "currency.decimal_places".to_string(),
                reason: "Decimal places must be between 0 and 10".to_string(),
            });
        }

        let mut keys = HashSet::new();
        for aggregate in &self.view.aggregates {
            if aggregate.key.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "view.aggregates".to_string(),
                    reason: "Aggregate keys must not be empty".to_string(),
                });
            }
            if !keys.insert(aggregate.key.as_str()) {
                return Err(ConfigError::ValidationError {
                    message: format!("Duplicate aggregate key '{}'", aggregate.key),
                });
            }
        }

        if self.export.columns.iter().any(|c| c.header.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "export.columns".to_string(),
                reason: "Every export column needs a header".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Download file name for an export taken on `date` (YYYY-MM-DD)
    pub fn export_file_name(&self, date: &str) -> PathBuf {
        PathBuf::from(format!("{}_{}.csv", self.export.file_prefix, date))
    }
}

// ==================== Tests ====================
