use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use models::CellValue;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y"];

/// Last serial Excel can display (9999-12-31 23:59:59).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.999_99;

/// Converts a calamine cell into the crate's cell model.
///
/// Excel error cells (`#N/A`, `#REF!`, ...) become empty cells.
pub fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(CellValue::Date)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_datetime_text(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Excel serial date conversion using 1899-12-30 base (common convention).
pub fn excel_serial_to_datetime(v: f64) -> Option<NaiveDateTime> {
    if !v.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&v) {
        return None;
    }
    let days = v.floor() as i64;
    let seconds = ((v - v.floor()) * 86_400.0).round() as i64;
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let offset = Duration::try_days(days)?.checked_add(&Duration::try_seconds(seconds)?)?;
    base.checked_add_signed(offset)
}

/// Parses the date and date-time spellings found in exported sheets.
pub fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Calendar date of a cell, if it holds one. Numbers are not treated as dates.
pub fn parse_date_value(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Date(dt) => Some(dt.date()),
        CellValue::Text(s) => parse_datetime_text(s).map(|dt| dt.date()),
        _ => None,
    }
}
