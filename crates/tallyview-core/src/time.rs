//! Time range filtering over a record date field

use crate::accessor;
use crate::error::{CoreError, CoreResult};
use crate::predicate::Predicate;
use chrono::{Datelike, Local, NaiveDate};
use tallyview_config::TimeRange;
use tallyview_utils::parse_date;

/// Date window for filtering records
#[derive(Debug, Clone, PartialEq)]
pub struct TimeContext {
    /// Current time range
    pub range: TimeRange,
    /// Custom start date (when range is Custom)
    pub custom_start: Option<NaiveDate>,
    /// Custom end date (when range is Custom)
    pub custom_end: Option<NaiveDate>,
    /// First month of the fiscal year, used by `Year`
    pub fiscal_year_start: u32,
}

impl Default for TimeContext {
    fn default() -> Self {
        Self::new(TimeRange::All)
    }
}

impl TimeContext {
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            custom_start: None,
            custom_end: None,
            fiscal_year_start: 1,
        }
    }

    /// Create with custom date range
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            range: TimeRange::Custom,
            custom_start: Some(start),
            custom_end: Some(end),
            fiscal_year_start: 1,
        }
    }

    pub fn with_fiscal_year_start(mut self, month: u32) -> Self {
        self.fiscal_year_start = month.clamp(1, 12);
        self
    }

    /// Parse `month`, `quarter`, `year`, `all` or `START..END`.
    ///
    /// Either side of a custom range may be left open (`2024-01-01..`).
    pub fn parse(spec: &str) -> CoreResult<Self> {
        if let Some((start, end)) = spec.split_once("..") {
            let bound = |raw: &str| -> CoreResult<Option<NaiveDate>> {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(None);
                }
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|e| CoreError::InvalidTimeRange {
                        message: format!("{}: {}", raw, e),
                    })
            };
            return Ok(Self {
                range: TimeRange::Custom,
                custom_start: bound(start)?,
                custom_end: bound(end)?,
                fiscal_year_start: 1,
            });
        }

        let range = spec
            .parse::<TimeRange>()
            .map_err(|message| CoreError::InvalidTimeRange { message })?;
        if range == TimeRange::Custom {
            return Err(CoreError::InvalidTimeRange {
                message: "custom ranges are written as START..END".to_string(),
            });
        }
        Ok(Self::new(range))
    }

    /// Effective `(start, end)` bounds relative to `today`, both inclusive
    pub fn bounds_on(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self.range {
            TimeRange::Month => {
                let start = today.with_day(1);
                (start, start.and_then(|s| next_month(s, 1)).and_then(|d| d.pred_opt()))
            }
            TimeRange::Quarter => {
                let start = NaiveDate::from_ymd_opt(today.year(), (today.month0() / 3) * 3 + 1, 1);
                (start, start.and_then(|s| next_month(s, 3)).and_then(|d| d.pred_opt()))
            }
            TimeRange::Year => {
                let fiscal = self.fiscal_year_start.clamp(1, 12);
                let year = if today.month() >= fiscal {
                    today.year()
                } else {
                    today.year() - 1
                };
                let start = NaiveDate::from_ymd_opt(year, fiscal, 1);
                (start, start.and_then(|s| next_month(s, 12)).and_then(|d| d.pred_opt()))
            }
            TimeRange::All => (None, None),
            TimeRange::Custom => (self.custom_start, self.custom_end),
        }
    }

    /// Get the effective start date based on range
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.bounds_on(Local::now().date_naive()).0
    }

    /// Get the effective end date based on range
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.bounds_on(Local::now().date_naive()).1
    }

    /// Check if a date is within the window as seen on `today`
    pub fn contains_on(&self, date: &NaiveDate, today: NaiveDate) -> bool {
        match self.bounds_on(today) {
            (None, None) => true,
            (Some(s), None) => *date >= s,
            (None, Some(e)) => *date <= e,
            (Some(s), Some(e)) => *date >= s && *date <= e,
        }
    }

    /// Check if a date is within the current time context
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.contains_on(date, Local::now().date_naive())
    }

    /// Get a human-readable description of the time range
    pub fn description(&self) -> String {
        match self.range {
            TimeRange::Month => "Current Month".to_string(),
            TimeRange::Quarter => "Current Quarter".to_string(),
            TimeRange::Year => "Current Year".to_string(),
            TimeRange::All => "All Time".to_string(),
            TimeRange::Custom => match (self.custom_start, self.custom_end) {
                (Some(start), Some(end)) => format!("{} to {}", start, end),
                (Some(start), None) => format!("From {}", start),
                (None, Some(end)) => format!("Until {}", end),
                (None, None) => "Custom Range".to_string(),
            },
        }
    }
}

fn next_month(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(chrono::Months::new(months))
}

/// Keep records whose `date_field_path` falls inside `context` on `today`.
///
/// Records whose date is missing or unparseable are kept, so a bad date never
/// hides a row.
pub fn build_date_range_on(context: &TimeContext, date_field_path: &str, today: NaiveDate) -> Predicate {
    if context.range == TimeRange::All {
        return Predicate::always();
    }
    let context = context.clone();
    let path = date_field_path.to_string();
    Predicate::new(move |record| match parse_date(&accessor::text(record, &path)) {
        Some(date) => context.contains_on(&date, today),
        None => true,
    })
}

/// [`build_date_range_on`] relative to the local current date
pub fn build_date_range(context: &TimeContext, date_field_path: &str) -> Predicate {
    build_date_range_on(context, date_field_path, Local::now().date_naive())
}

// ==================== Tests ====================
