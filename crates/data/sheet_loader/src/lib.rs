//! Reads source sheets whose header row position and column spelling vary
//! from export to export, and turns them into clean [`Dataset`]s.

pub mod cells;
pub mod columns;
pub mod header;
pub mod source;

use std::path::PathBuf;

use models::{CellValue, Dataset, HeaderMatch, RawSheet, SplitSettings};
use thiserror::Error;

pub use columns::{normalize, IdentifierResolution, NormalizedColumns};
pub use header::{find_header_row, locate_header};
pub use source::{MemorySource, SheetSource, WorkbookSource};

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Cannot open workbook {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Cannot read sheet '{sheet}': {reason}")]
    Read { sheet: String, reason: String },
}

/// Knobs of header detection and column normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub keywords: Vec<String>,
    pub scan_rows: usize,
    pub fallback_row: usize,
    pub identifier_column: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::from(&SplitSettings::default())
    }
}

impl From<&SplitSettings> for LoadOptions {
    fn from(settings: &SplitSettings) -> Self {
        Self {
            keywords: settings.header_keywords.clone(),
            scan_rows: settings.header_scan_rows,
            fallback_row: settings.fallback_header_row,
            identifier_column: settings.identifier_column.clone(),
        }
    }
}

/// A sheet after header detection and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSheet {
    pub sheet: String,
    pub header: HeaderMatch,
    pub dataset: Dataset,
    pub identifier: IdentifierResolution,
}

/// Load one sheet: locate the header (falling back when detection misses),
/// build the dataset beneath it and normalize its columns.
///
/// Only a sheet that cannot be read at all is an error.
pub fn load_sheet<S>(source: &mut S, sheet: &str, opts: &LoadOptions) -> Result<LoadedSheet, SheetError>
where
    S: SheetSource + ?Sized,
{
    tracing::info!("Detecting headers for source sheet '{}'...", sheet);

    let located = match locate_header(source, sheet, &opts.keywords, opts.scan_rows) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("Could not scan headers for {}: {}", sheet, e);
            None
        }
    };

    let header = match located {
        Some(m) => {
            tracing::info!("  Found headers at row {}", m.row_index + 1);
            m
        }
        None => {
            tracing::warn!(
                "  Header check failed, using fallback row {}",
                opts.fallback_row + 1
            );
            HeaderMatch {
                row_index: opts.fallback_row,
                confident: false,
            }
        }
    };

    let raw = source.read_rows(sheet, None)?;
    let dataset = dataset_from_raw(&raw, header.row_index);
    let NormalizedColumns {
        dataset,
        identifier,
    } = normalize(dataset, &opts.identifier_column);

    match &identifier {
        IdentifierResolution::Exact => {}
        IdentifierResolution::Renamed { from } => tracing::debug!(
            sheet,
            from = from.as_str(),
            "renamed identifier column to '{}'",
            opts.identifier_column
        ),
        IdentifierResolution::Unresolved => tracing::warn!(
            "  Sheet '{}' has no '{}' column; it contributes no categories",
            sheet,
            opts.identifier_column
        ),
    }
    tracing::debug!(
        sheet,
        rows = dataset.len(),
        columns = dataset.width(),
        "loaded sheet"
    );

    Ok(LoadedSheet {
        sheet: sheet.to_string(),
        header,
        dataset,
        identifier,
    })
}

/// Use row `header_row` as labels and the non-blank rows beneath it as data.
///
/// Blank header cells get placeholder labels; repeated labels are suffixed.
pub fn dataset_from_raw(raw: &RawSheet, header_row: usize) -> Dataset {
    let width = raw.width();
    let header_cells = raw.rows.get(header_row).map(Vec::as_slice).unwrap_or(&[]);

    let labels: Vec<String> = (0..width)
        .map(|i| {
            header_cells
                .get(i)
                .and_then(CellValue::as_text)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| columns::placeholder_label(i))
        })
        .collect();
    let labels = columns::make_unique(labels);

    let rows: Vec<Vec<CellValue>> = raw
        .rows
        .iter()
        .skip(header_row + 1)
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .cloned()
        .collect();

    Dataset::new(labels, rows)
}
