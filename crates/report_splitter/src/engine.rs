//! Spreadsheet editing engine used to fill report workbooks.
//!
//! One engine session serves a whole batch. [`EngineSession`] owns the engine
//! and quits it exactly once: on [`EngineSession::release`], or on drop if the
//! batch unwinds first.

use std::path::{Path, PathBuf};

use models::CellValue;
use umya_spreadsheet::{Cell, Spreadsheet};

use crate::error::EngineError;

/// A workbook opened for structured editing.
pub trait EditableWorkbook {
    fn has_sheet(&self, sheet: &str) -> bool;

    /// Writes one value at an A1-style address.
    fn write_cell(&mut self, sheet: &str, address: &str, value: &CellValue) -> Result<(), EngineError>;

    /// Writes a rectangular block whose top-left cell is (`start_row`, `start_col`), 1-based.
    fn write_block(
        &mut self,
        sheet: &str,
        start_row: u32,
        start_col: u32,
        rows: &[Vec<CellValue>],
    ) -> Result<(), EngineError>;

    fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<(), EngineError>;

    /// Persists the workbook to the path it was opened from.
    fn save_and_close(self) -> Result<(), EngineError>;
}

pub trait SpreadsheetEngine {
    type Workbook: EditableWorkbook;

    fn open(&mut self, path: &Path) -> Result<Self::Workbook, EngineError>;

    /// Releases the engine. Called once per session.
    fn quit(&mut self);
}

pub struct EngineSession<E: SpreadsheetEngine> {
    engine: E,
    released: bool,
}

impl<E: SpreadsheetEngine> EngineSession<E> {
    pub fn start(engine: E) -> Self {
        Self {
            engine,
            released: false,
        }
    }

    pub fn engine(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn release(mut self) {
        self.quit_once();
    }

    fn quit_once(&mut self) {
        if !self.released {
            self.released = true;
            self.engine.quit();
        }
    }
}

impl<E: SpreadsheetEngine> Drop for EngineSession<E> {
    fn drop(&mut self) {
        self.quit_once();
    }
}

/// Runs `f` inside a session and releases the engine afterwards.
pub fn with_session<E, T, F>(engine: E, f: F) -> T
where
    E: SpreadsheetEngine,
    F: FnOnce(&mut EngineSession<E>) -> T,
{
    let mut session = EngineSession::start(engine);
    let out = f(&mut session);
    session.release();
    out
}

/// Engine backed by umya-spreadsheet: reads the whole package, edits in
/// memory and writes it back, preserving the template's styles.
#[derive(Debug, Default)]
pub struct UmyaEngine {
    opened: usize,
}

impl SpreadsheetEngine for UmyaEngine {
    type Workbook = UmyaWorkbook;

    fn open(&mut self, path: &Path) -> Result<UmyaWorkbook, EngineError> {
        let book = umya_spreadsheet::reader::xlsx::read(path).map_err(|e| EngineError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.opened += 1;
        Ok(UmyaWorkbook {
            path: path.to_path_buf(),
            book,
        })
    }

    fn quit(&mut self) {
        tracing::info!("Closing spreadsheet engine ({} workbooks opened)", self.opened);
    }
}

pub struct UmyaWorkbook {
    path: PathBuf,
    book: Spreadsheet,
}

impl UmyaWorkbook {
    fn sheet_mut(&mut self, sheet: &str) -> Result<&mut umya_spreadsheet::Worksheet, EngineError> {
        self.book
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| EngineError::MissingSheet(sheet.to_string()))
    }
}

impl EditableWorkbook for UmyaWorkbook {
    fn has_sheet(&self, sheet: &str) -> bool {
        self.book.get_sheet_by_name(sheet).is_some()
    }

    fn write_cell(&mut self, sheet: &str, address: &str, value: &CellValue) -> Result<(), EngineError> {
        let ws = self.sheet_mut(sheet)?;
        set_cell(ws.get_cell_mut(address), value);
        Ok(())
    }

    fn write_block(
        &mut self,
        sheet: &str,
        start_row: u32,
        start_col: u32,
        rows: &[Vec<CellValue>],
    ) -> Result<(), EngineError> {
        let ws = self.sheet_mut(sheet)?;
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let col = start_col + c as u32;
                let row_num = start_row + r as u32;
                set_cell(ws.get_cell_mut((col, row_num)), value);
            }
        }
        Ok(())
    }

    fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<(), EngineError> {
        let ws = self.sheet_mut(sheet)?;
        ws.get_row_dimension_mut(&row)
            .set_height(height)
            .set_custom_height(true);
        Ok(())
    }

    fn save_and_close(self) -> Result<(), EngineError> {
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path).map_err(|e| EngineError::Save {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

/// Text stays text: dates are never handed to the engine as native dates.
fn set_cell(cell: &mut Cell, value: &CellValue) {
    match value {
        CellValue::Empty => {
            cell.set_value_string("");
        }
        CellValue::Text(s) => {
            cell.set_value_string(s.as_str());
        }
        CellValue::Number(n) => {
            cell.set_value_number(*n);
        }
        CellValue::Bool(b) => {
            cell.set_value_bool(*b);
        }
        CellValue::Date(dt) => {
            cell.set_value_string(dt.format("%Y-%m-%d %H:%M:%S").to_string());
        }
    }
}
