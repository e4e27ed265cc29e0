//! Shared types for the report splitter: cell values, raw sheets, datasets,
//! header matches, report metadata and the settings that drive a batch.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// Cell models
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Text form of the value, `None` for an empty cell.
    ///
    /// Integral numbers render without a fractional part so that an account
    /// number stored as `1042.0` reads back as `1042`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            CellValue::Date(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text().unwrap_or_default())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Rows of cells as they sit in the worksheet, without any header
/// interpretation. Row 0 is the first worksheet row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row in the sheet.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Keeps only the first `limit` rows.
    pub fn truncated(mut self, limit: usize) -> Self {
        self.rows.truncate(limit);
        self
    }
}

/// Outcome of header detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch {
    pub row_index: usize,
    /// `false` when the row is the fallback row rather than a keyword hit.
    pub confident: bool,
}

/// A table with unique column names. Every row holds exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Builds a dataset, padding short rows with empty cells and cutting long ones.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Values of one column, top to bottom.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Same columns, only the rows accepted by `keep`.
    pub fn filter_rows<F>(&self, mut keep: F) -> Dataset
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        Dataset {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Rewrites every value of the column at `index`.
    pub fn map_column<F>(mut self, index: usize, mut f: F) -> Dataset
    where
        F: FnMut(&CellValue) -> CellValue,
    {
        if index < self.columns.len() {
            for row in &mut self.rows {
                row[index] = f(&row[index]);
            }
        }
        self
    }

    /// Replaces the column labels, keeping the rows untouched.
    /// Returns the dataset unchanged when the label count does not match.
    pub fn relabel(mut self, columns: Vec<String>) -> Dataset {
        if columns.len() == self.columns.len() {
            self.columns = columns;
        }
        self
    }

    /// Keeps the columns at `indices`, in that order.
    pub fn select_columns(self, indices: &[usize]) -> Dataset {
        let columns = indices
            .iter()
            .filter_map(|&i| self.columns.get(i).cloned())
            .collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| indices.iter().filter_map(|&i| row.get(i).cloned()).collect())
            .collect();
        Dataset { columns, rows }
    }
}

/// Summary cells written on the information sheet of each report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetadata {
    pub category: String,
    pub generated_on: NaiveDate,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

// Settings models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleSettings {
    /// Logical name, also used in log lines.
    pub name: String,
    /// Sheet read from the source workbook.
    pub source_sheet: String,
    /// Sheet written in the template copy.
    pub template_sheet: String,
    /// 1-based row of the template header; data starts on the row beneath.
    #[serde(default = "default_template_header_row")]
    pub template_header_row: u32,
    /// Height (points) applied to the first data row.
    #[serde(default)]
    pub row_height: Option<f64>,
}

impl RoleSettings {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source_sheet: name.clone(),
            template_sheet: name.clone(),
            name,
            template_header_row: default_template_header_row(),
            row_height: None,
        }
    }

    pub fn with_row_height(mut self, height: f64) -> Self {
        self.row_height = Some(height);
        self
    }

    pub fn first_data_row(&self) -> u32 {
        self.template_header_row + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MetadataCells {
    pub category: String,
    pub period_start: String,
    pub period_end: String,
    pub generated_on: String,
}

impl Default for MetadataCells {
    fn default() -> Self {
        Self {
            category: "D5".to_string(),
            period_start: "D7".to_string(),
            period_end: "D8".to_string(),
            generated_on: "D9".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SplitSettings {
    /// Workbook copied for every report.
    pub template_path: PathBuf,
    /// Workbook holding the transactional records.
    pub source_path: PathBuf,
    /// Root folder receiving one sub-folder per category.
    pub output_dir: PathBuf,
    /// Column whose values define the categories.
    pub identifier_column: String,
    /// Keywords that must all appear in a header row.
    pub header_keywords: Vec<String>,
    /// Number of rows scanned for the header.
    pub header_scan_rows: usize,
    /// Header row used when no row matches the keywords.
    pub fallback_header_row: usize,
    pub roles: Vec<RoleSettings>,
    pub information_sheet: String,
    pub metadata_cells: MetadataCells,
    /// Role whose date column yields the reporting period.
    pub date_role: String,
    pub date_column: String,
    /// Text format for every date written into a report.
    pub date_format: String,
    /// Appended to the sanitized category to build the report file name.
    pub report_suffix: String,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("Header_Template.xlsx"),
            source_path: PathBuf::from("source.xlsx"),
            output_dir: PathBuf::from("Split_Categories"),
            identifier_column: "Customer Name".to_string(),
            header_keywords: vec!["customer".to_string(), "name".to_string()],
            header_scan_rows: 25,
            fallback_header_row: 0,
            roles: vec![
                RoleSettings::new("Produce").with_row_height(30.0),
                RoleSettings::new("Broadline"),
            ],
            information_sheet: "Information".to_string(),
            metadata_cells: MetadataCells::default(),
            date_role: "Broadline".to_string(),
            date_column: "Invoice Date".to_string(),
            date_format: "%m/%d/%Y".to_string(),
            report_suffix: "_Report.xlsx".to_string(),
        }
    }
}

impl SplitSettings {
    pub fn role(&self, name: &str) -> Option<&RoleSettings> {
        self.roles.iter().find(|r| r.name == name)
    }
}

fn default_template_header_row() -> u32 {
    1
}
