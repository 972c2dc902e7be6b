//! Delimited-text export of a view.
//!
//! [`to_delimited`] writes pre-projected cells; it never resolves field paths
//! itself. [`Exporter`] does the projection from configured columns and
//! assembles the totals row.

use crate::accessor;
use crate::aggregate;
use crate::error::{CoreError, CoreResult};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::Value;
use tallyview_config::{CellFormat, Config, CurrencyConfig, ExportColumnConfig, SymbolPosition};
use tallyview_utils::{format_amount, format_date};

/// MIME type callers attach to the exported payload
pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";

/// Serialize a header row, data rows and an optional totals row.
///
/// Every cell is double-quoted with embedded quotes doubled, rows are joined
/// by `\n` and the output has no trailing newline. Rows may differ in length.
pub fn to_delimited<H, C>(headers: &[H], rows: &[Vec<C>], totals_row: Option<&[H]>) -> CoreResult<String>
where
    H: AsRef<str>,
    C: AsRef<str>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(headers.iter().map(|h| h.as_ref()))?;
    for row in rows {
        writer.write_record(row.iter().map(|c| c.as_ref()))?;
    }
    if let Some(totals) = totals_row {
        writer.write_record(totals.iter().map(|t| t.as_ref()))?;
    }

    let bytes = writer.into_inner().map_err(|e| CoreError::ExportFailed {
        message: e.to_string(),
    })?;
    let mut out = String::from_utf8(bytes).map_err(|e| CoreError::ExportFailed {
        message: e.to_string(),
    })?;
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

/// Cell rendering settings
#[derive(Debug, Clone)]
pub struct CellFormatter {
    pub decimal_places: u32,
    pub thousands_separator: String,
    pub decimal_separator: String,
    pub symbol: String,
    pub symbol_position: SymbolPosition,
    pub date_format: String,
}

impl Default for CellFormatter {
    fn default() -> Self {
        Self::new(&CurrencyConfig::default(), "%Y-%m-%d")
    }
}

impl CellFormatter {
    pub fn new(currency: &CurrencyConfig, date_format: &str) -> Self {
        Self {
            decimal_places: currency.decimal_places,
            thousands_separator: currency.thousands_separator.clone(),
            decimal_separator: currency.decimal_separator.clone(),
            symbol: currency.symbol.clone(),
            symbol_position: currency.symbol_position,
            date_format: date_format.to_string(),
        }
    }

    /// Fixed-decimal amount with the configured symbol; a sign stays in front
    pub fn amount(&self, value: f64) -> String {
        let formatted = format_amount(
            value,
            self.decimal_places,
            &self.thousands_separator,
            &self.decimal_separator,
        );
        if self.symbol.is_empty() {
            return formatted;
        }
        match self.symbol_position {
            SymbolPosition::Before => match formatted.strip_prefix('-') {
                Some(digits) => format!("-{}{}", self.symbol, digits),
                None => format!("{}{}", self.symbol, formatted),
            },
            SymbolPosition::After => format!("{} {}", formatted, self.symbol),
        }
    }

    /// Render one resolved field; missing values render as an empty cell
    pub fn cell(&self, record: &Value, column: &ExportColumnConfig) -> String {
        let Some(value) = accessor::get(record, &column.field) else {
            return String::new();
        };
        match column.format {
            CellFormat::Text => accessor::display_value(value),
            CellFormat::Amount => match accessor::as_number(value) {
                Some(n) => self.amount(n),
                None => accessor::display_value(value),
            },
            CellFormat::Date => format_date(&accessor::display_value(value), &self.date_format),
        }
    }
}

/// Projects visible rows into export cells
#[derive(Debug, Clone)]
pub struct Exporter {
    columns: Vec<ExportColumnConfig>,
    formatter: CellFormatter,
    include_totals: bool,
    totals_label: String,
}

impl Exporter {
    pub fn new(columns: Vec<ExportColumnConfig>, formatter: CellFormatter) -> Self {
        Self {
            columns,
            formatter,
            include_totals: true,
            totals_label: "Total".to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            columns: config.export.columns.clone(),
            formatter: CellFormatter::new(&config.currency, &config.export.date_format),
            include_totals: config.export.include_totals,
            totals_label: config.export.totals_label.clone(),
        }
    }

    pub fn with_totals(mut self, include: bool, label: impl Into<String>) -> Self {
        self.include_totals = include;
        self.totals_label = label.into();
        self
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    /// Rendered cells, one inner vector per record
    pub fn project(&self, rows: &[Value]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|record| self.columns.iter().map(|c| self.formatter.cell(record, c)).collect())
            .collect()
    }

    /// Label in the first cell, sums under amount columns, blanks elsewhere
    pub fn totals(&self, rows: &[Value]) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| match column.format {
                CellFormat::Amount if i > 0 => self.formatter.amount(aggregate::sum(rows, &column.field)),
                _ if i == 0 => self.totals_label.clone(),
                _ => String::new(),
            })
            .collect()
    }

    /// Full CSV payload for `rows`
    pub fn export(&self, rows: &[Value]) -> CoreResult<String> {
        let totals = self.include_totals.then(|| self.totals(rows));
        log::debug!(
            "exporting {} rows x {} columns (totals: {})",
            rows.len(),
            self.columns.len(),
            totals.is_some()
        );
        to_delimited(&self.headers(), &self.project(rows), totals.as_deref())
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;
    use serde_json::json;

    fn read_back(payload: &str) -> Vec<Vec<String>> {
        ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(payload.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    fn column(header: &str, field: &str, format: CellFormat) -> ExportColumnConfig {
        ExportColumnConfig {
            header: header.to_string(),
            field: field.to_string(),
            format,
        }
    }

    #[test]
    fn test_to_delimited_quotes_every_cell() {
        let rows = vec![vec!["A", "10"], vec!["B", "20"]];
        let out = to_delimited(&["Name", "Amt"], &rows, Some(&["Total", "30"][..])).unwrap();
        assert_eq!(out, "\"Name\",\"Amt\"\n\"A\",\"10\"\n\"B\",\"20\"\n\"Total\",\"30\"");
    }

    #[test]
    fn test_to_delimited_without_totals() {
        let rows = vec![vec!["1"]];
        let out = to_delimited(&["N"], &rows, None).unwrap();
        assert_eq!(out, "\"N\"\n\"1\"");
    }

    #[test]
    fn test_to_delimited_escapes_quotes() {
        let rows = vec![vec!["He said \"hi\"".to_string(), "1,5".to_string()]];
        let out = to_delimited(&["Memo", "Value"], &rows, None).unwrap();
        assert_eq!(out, "\"Memo\",\"Value\"\n\"He said \"\"hi\"\"\",\"1,5\"");
    }

    #[test]
    fn test_to_delimited_round_trip() {
        let headers = vec!["Date", "Memo", "Amount"];
        let rows = vec![
            vec!["2024-01-01", "He said \"hi\"", "10"],
            vec!["2024-01-02", "comma, inside", "-3.5"],
            vec!["2024-01-03", "line\nbreak", ""],
        ];
        let totals = vec!["Total", "", "6.5"];
        let out = to_delimited(&headers, &rows, Some(totals.as_slice())).unwrap();

        let mut expected: Vec<Vec<String>> = vec![headers.iter().map(|s| s.to_string()).collect()];
        expected.extend(rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()));
        expected.push(totals.iter().map(|s| s.to_string()).collect());
        assert_eq!(read_back(&out), expected);
    }

    #[test]
    fn test_to_delimited_ragged_totals() {
        let rows = vec![vec!["a", "b", "c"]];
        let out = to_delimited(&["x", "y", "z"], &rows, Some(&["Total"][..])).unwrap();
        assert!(out.ends_with("\n\"Total\""));
    }

    #[test]
    fn test_exporter_projection_and_totals() {
        let exporter = Exporter::new(
            vec![
                column("Date", "date", CellFormat::Date),
                column("Description", "description", CellFormat::Text),
                column("Amount", "amount", CellFormat::Amount),
            ],
            CellFormatter::default(),
        );
        let rows = vec![
            json!({"date": "2024-03-05T08:00:00Z", "description": "Office Rent", "amount": 1200}),
            json!({"date": "2024-03-06", "description": "Coffee", "amount": "4.5"}),
            json!({"description": "No amount"}),
        ];

        let cells = exporter.project(&rows);
        assert_eq!(cells[0], vec!["2024-03-05", "Office Rent", "1,200.00"]);
        assert_eq!(cells[1], vec!["2024-03-06", "Coffee", "4.50"]);
        assert_eq!(cells[2], vec!["", "No amount", ""]);
        assert_eq!(exporter.totals(&rows), vec!["Total", "", "1,204.50"]);

        let payload = exporter.export(&rows).unwrap();
        let lines = read_back(&payload);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], vec!["Date", "Description", "Amount"]);
        assert_eq!(lines[4], vec!["Total", "", "1,204.50"]);
    }

    #[test]
    fn test_exporter_without_totals() {
        let exporter = Exporter::new(
            vec![column("Status", "status", CellFormat::Text)],
            CellFormatter::default(),
        )
        .with_totals(false, "Sum");
        let payload = exporter.export(&[json!({"status": "paid"})]).unwrap();
        assert_eq!(payload, "\"Status\"\n\"paid\"");
    }

    #[test]
    fn test_exporter_from_config() {
        let config = Config::from_yaml_str(Config::generate_default()).unwrap();
        let exporter = Exporter::from_config(&config);
        assert_eq!(exporter.headers()[0], "Date");
        let totals = exporter.totals(&[json!({"debit": 10, "credit": "2.5"})]);
        assert_eq!(totals, vec!["Total", "", "", "10.00", "2.50"]);
    }

    #[test]
    fn test_amount_symbol_position() {
        let mut currency = CurrencyConfig {
            symbol: "$".to_string(),
            ..CurrencyConfig::default()
        };
        let formatter = CellFormatter::new(&currency, "%Y-%m-%d");
        assert_eq!(formatter.amount(1234.5), "$1,234.50");
        assert_eq!(formatter.amount(-7.0), "-$7.00");

        currency.symbol = "EUR".to_string();
        currency.symbol_position = SymbolPosition::After;
        let formatter = CellFormatter::new(&currency, "%Y-%m-%d");
        assert_eq!(formatter.amount(-7.0), "-7.00 EUR");

        let exporter = Exporter::new(vec![column("Amount", "amount", CellFormat::Amount)], formatter);
        let payload = exporter.export(&[json!({"amount": 3})]).unwrap();
        assert_eq!(payload, "\"Amount\"\n\"3.00 EUR\"\n\"Total\"");
    }
}
