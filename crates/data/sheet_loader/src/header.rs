use models::{CellValue, HeaderMatch, RawSheet};

use crate::source::SheetSource;
use crate::SheetError;

/// Find the header row of `sheet` within its first `scan_window` rows.
///
/// Returns `Ok(None)` when no row carries every keyword. Read failures are
/// returned as errors; the caller decides on a fallback.
pub fn locate_header<S>(
    source: &mut S,
    sheet: &str,
    keywords: &[String],
    scan_window: usize,
) -> Result<Option<HeaderMatch>, SheetError>
where
    S: SheetSource + ?Sized,
{
    let raw = source.read_rows(sheet, Some(scan_window))?;
    Ok(find_header_row(&raw, keywords))
}

/// First row (top to bottom) whose signature contains all keywords.
pub fn find_header_row(raw: &RawSheet, keywords: &[String]) -> Option<HeaderMatch> {
    let keywords: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();

    raw.rows.iter().enumerate().find_map(|(row_index, row)| {
        let signature = row_signature(row);
        keywords
            .iter()
            .all(|k| signature.contains(k.as_str()))
            .then_some(HeaderMatch {
                row_index,
                confident: true,
            })
    })
}

/// Lowercase, space-joined text of the non-empty cells of a row.
/// Line breaks inside cells count as spaces.
pub fn row_signature(row: &[CellValue]) -> String {
    row.iter()
        .filter_map(CellValue::as_text)
        .map(|s| s.replace(['\r', '\n'], " ").to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
