use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use models::{CellValue, RawSheet};

use crate::cells::cell_value;
use crate::SheetError;

/// Anything that can hand out the raw rows of a named sheet.
pub trait SheetSource {
    /// Reads the sheet without header interpretation, keeping at most `limit`
    /// rows when a limit is given.
    fn read_rows(&mut self, sheet: &str, limit: Option<usize>) -> Result<RawSheet, SheetError>;

    fn sheet_names(&self) -> Vec<String>;
}

/// Source workbook opened through calamine (xlsx, xlsm, xlsb, xls, ods).
pub struct WorkbookSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
    cache: HashMap<String, RawSheet>,
}

impl WorkbookSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SheetError> {
        let path = path.as_ref().to_path_buf();
        let workbook = open_workbook_auto(&path).map_err(|e| SheetError::Open {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path,
            workbook,
            cache: HashMap::new(),
        })
    }
}

impl SheetSource for WorkbookSource {
    fn read_rows(&mut self, sheet: &str, limit: Option<usize>) -> Result<RawSheet, SheetError> {
        if !self.cache.contains_key(sheet) {
            tracing::debug!(path = %self.path.display(), sheet, "reading sheet");
            let range = self
                .workbook
                .worksheet_range(sheet)
                .map_err(|e| SheetError::Read {
                    sheet: sheet.to_string(),
                    reason: e.to_string(),
                })?;
            self.cache.insert(sheet.to_string(), range_to_raw(&range));
        }

        let raw = self.cache.get(sheet).cloned().unwrap_or_default();
        Ok(match limit {
            Some(n) => raw.truncated(n),
            None => raw,
        })
    }

    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }
}

/// Lays a calamine range out on absolute worksheet coordinates.
///
/// calamine trims leading empty rows and columns; they are restored here so
/// row 0 is always the first worksheet row.
pub fn range_to_raw(range: &Range<Data>) -> RawSheet {
    let Some((start_row, start_col)) = range.start() else {
        return RawSheet::default();
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_value));
        rows.push(cells);
    }
    RawSheet::new(rows)
}

/// Sheets held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sheets: Vec<(String, RawSheet)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: impl Into<String>, sheet: RawSheet) -> Self {
        self.sheets.push((name.into(), sheet));
        self
    }
}

impl SheetSource for MemorySource {
    fn read_rows(&mut self, sheet: &str, limit: Option<usize>) -> Result<RawSheet, SheetError> {
        let raw = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet)
            .map(|(_, raw)| raw.clone())
            .ok_or_else(|| SheetError::Read {
                sheet: sheet.to_string(),
                reason: "sheet not found".to_string(),
            })?;
        Ok(match limit {
            Some(n) => raw.truncated(n),
            None => raw,
        })
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_to_raw_restores_offset() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("Customer Name".to_string()));
        range.set_value((3, 2), Data::Float(5.0));

        let raw = range_to_raw(&range);
        assert_eq!(raw.len(), 4);
        assert!(raw.rows[0].is_empty());
        assert_eq!(raw.rows[2][0], CellValue::Empty);
        assert_eq!(raw.rows[2][1], CellValue::from("Customer Name"));
        assert_eq!(raw.rows[3][2], CellValue::Number(5.0));
    }

    #[test]
    fn test_empty_range() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_raw(&range).is_empty());
    }

    #[test]
    fn test_memory_source_limit_and_missing_sheet() {
        let sheet = RawSheet::new(vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]]);
        let mut source = MemorySource::new().with_sheet("Produce", sheet);

        assert_eq!(source.read_rows("Produce", Some(2)).unwrap().len(), 2);
        assert_eq!(source.read_rows("Produce", None).unwrap().len(), 3);
        assert!(matches!(
            source.read_rows("Broadline", None),
            Err(SheetError::Read { .. })
        ));
        assert_eq!(source.sheet_names(), vec!["Produce".to_string()]);
    }
}
