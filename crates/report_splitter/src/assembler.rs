use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use models::{CellValue, Dataset, ReportMetadata, SplitSettings};
use sheet_loader::cells::parse_date_value;

use crate::engine::{EditableWorkbook, SpreadsheetEngine};
use crate::error::{EngineError, Result, SplitError};
use crate::partition::Partitions;

/// Folder (and file stem) for a category: `/` becomes `-`, outer whitespace goes.
pub fn folder_name(category: &str) -> String {
    category.replace('/', "-").trim().to_string()
}

/// [`folder_name`], rejecting names that do not stay one level below the
/// output directory (`.`, `..` and other all-dot names).
pub fn checked_folder_name(category: &str) -> Result<String> {
    let folder = folder_name(category);
    if folder.is_empty() || folder.chars().all(|c| c == '.') {
        return Err(SplitError::UnsafeFolder {
            category: category.to_string(),
            folder,
        });
    }
    Ok(folder)
}

/// `<output_dir>/<folder>/<folder><suffix>`
pub fn report_path(settings: &SplitSettings, category: &str) -> Result<PathBuf> {
    let folder = checked_folder_name(category)?;
    Ok(settings
        .output_dir
        .join(&folder)
        .join(format!("{}{}", folder, settings.report_suffix)))
}

/// Date column of a dataset: the configured name, else the first label mentioning "date".
pub fn find_date_column<'a>(dataset: &'a Dataset, preferred: &str) -> Option<&'a str> {
    dataset
        .columns()
        .iter()
        .find(|c| c.as_str() == preferred)
        .or_else(|| {
            dataset
                .columns()
                .iter()
                .find(|c| c.to_lowercase().contains("date"))
        })
        .map(String::as_str)
}

/// Earliest and latest parseable date of a column. Unparseable cells are ignored.
pub fn date_range(dataset: &Dataset, column: &str) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = dataset.column_values(column)?.filter_map(parse_date_value);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

pub fn derive_metadata(
    settings: &SplitSettings,
    category: &str,
    partitions: &Partitions,
    generated_on: NaiveDate,
) -> ReportMetadata {
    let period = partitions
        .get(&settings.date_role)
        .filter(|d| !d.is_empty())
        .and_then(|d| {
            let column = find_date_column(d, &settings.date_column)?;
            date_range(d, column)
        });

    ReportMetadata {
        category: category.to_string(),
        generated_on,
        period_start: period.map(|(start, _)| start),
        period_end: period.map(|(_, end)| end),
    }
}

/// Block of values ready to write: empty cells become empty strings and
/// dates become fixed-format text.
pub fn prepare_rows(dataset: &Dataset, date_format: &str) -> Vec<Vec<CellValue>> {
    dataset
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| match v {
                    CellValue::Empty => CellValue::Text(String::new()),
                    CellValue::Date(dt) => CellValue::Text(dt.format(date_format).to_string()),
                    other => other.clone(),
                })
                .collect()
        })
        .collect()
}

fn write_metadata<W: EditableWorkbook>(
    wb: &mut W,
    settings: &SplitSettings,
    metadata: &ReportMetadata,
) -> std::result::Result<(), EngineError> {
    let sheet = settings.information_sheet.as_str();
    let cells = &settings.metadata_cells;
    let fmt = settings.date_format.as_str();

    if !wb.has_sheet(sheet) {
        return Err(EngineError::MissingSheet(sheet.to_string()));
    }
    wb.write_cell(sheet, &cells.category, &CellValue::from(metadata.category.as_str()))?;
    wb.write_cell(
        sheet,
        &cells.generated_on,
        &CellValue::Text(metadata.generated_on.format(fmt).to_string()),
    )?;
    if let (Some(start), Some(end)) = (metadata.period_start, metadata.period_end) {
        wb.write_cell(sheet, &cells.period_start, &CellValue::Text(start.format(fmt).to_string()))?;
        wb.write_cell(sheet, &cells.period_end, &CellValue::Text(end.format(fmt).to_string()))?;
    }
    Ok(())
}

/// Build the report of one category from the template.
///
/// The caller has already checked that at least one partition has rows.
/// Metadata problems are logged and do not fail the report; anything else does.
pub fn assemble<E: SpreadsheetEngine>(
    engine: &mut E,
    settings: &SplitSettings,
    category: &str,
    partitions: &Partitions,
    generated_on: NaiveDate,
) -> Result<PathBuf> {
    let target = report_path(settings, category)?;
    if let Some(dir) = target.parent() {
        fs::create_dir_all(dir).map_err(|e| SplitError::io(dir, e))?;
    }

    copy_template(&settings.template_path, &target)?;
    let mut wb = engine.open(&target)?;

    let metadata = derive_metadata(settings, category, partitions, generated_on);
    if let Err(e) = write_metadata(&mut wb, settings, &metadata) {
        tracing::warn!("  Warning (Info Sheet) for {}: {}", category, e);
    }

    for role in &settings.roles {
        let Some(data) = partitions.get(&role.name).filter(|d| !d.is_empty()) else {
            continue;
        };
        if !wb.has_sheet(&role.template_sheet) {
            tracing::debug!(
                role = role.name.as_str(),
                sheet = role.template_sheet.as_str(),
                "template has no sheet for role; skipped"
            );
            continue;
        }

        let rows = prepare_rows(data, &settings.date_format);
        let start_row = role.first_data_row();
        wb.write_block(&role.template_sheet, start_row, 1, &rows)?;
        if let Some(height) = role.row_height {
            wb.set_row_height(&role.template_sheet, start_row, height)?;
        }
        tracing::debug!(
            category,
            role = role.name.as_str(),
            rows = partitions.row_count(&role.name),
            columns = data.width(),
            "wrote partition"
        );
    }

    wb.save_and_close()?;
    Ok(target)
}

/// Plain file copy so the report keeps the template's package byte for byte.
fn copy_template(template: &Path, target: &Path) -> Result<()> {
    fs::copy(template, target).map_err(|e| SplitError::io(template, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{partition, RoleDataset};
    use chrono::NaiveDateTime;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at_midnight(d: NaiveDate) -> NaiveDateTime {
        d.and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn test_folder_name() {
        assert_eq!(folder_name(" Acme/West "), "Acme-West");
        assert_eq!(folder_name("A/B/C"), "A-B-C");
    }

    #[test]
    fn test_report_path() {
        let settings = SplitSettings {
            output_dir: PathBuf::from("out"),
            ..SplitSettings::default()
        };
        assert_eq!(
            report_path(&settings, "Acme/West").unwrap(),
            PathBuf::from("out/Acme-West/Acme-West_Report.xlsx")
        );
    }

    #[test]
    fn test_dot_categories_have_no_folder() {
        for category in [".", "..", " ... ", "/"] {
            let result = checked_folder_name(category);
            if category == "/" {
                assert_eq!(result.unwrap(), "-");
            } else {
                assert!(matches!(result, Err(SplitError::UnsafeFolder { .. })), "{category}");
            }
        }
        let settings = SplitSettings::default();
        assert!(report_path(&settings, "..").is_err());
        assert_eq!(checked_folder_name("A.B").unwrap(), "A.B");
    }

    #[test]
    fn test_date_range_skips_unparseable() {
        let ds = Dataset::new(
            vec!["Invoice Date".to_string()],
            vec![
                vec![CellValue::from("03/15/2025")],
                vec![CellValue::from("garbage")],
                vec![CellValue::Date(at_midnight(ymd(2025, 1, 2)))],
                vec![CellValue::Empty],
                vec![CellValue::from("2025-07-30")],
            ],
        );
        assert_eq!(
            date_range(&ds, "Invoice Date"),
            Some((ymd(2025, 1, 2), ymd(2025, 7, 30)))
        );
    }

    #[test]
    fn test_date_range_none_when_nothing_parses() {
        let ds = Dataset::new(
            vec!["Invoice Date".to_string()],
            vec![vec![CellValue::from("n/a")], vec![CellValue::Number(3.0)]],
        );
        assert_eq!(date_range(&ds, "Invoice Date"), None);
    }

    #[test]
    fn test_find_date_column_prefers_configured_name() {
        let ds = Dataset::empty(vec!["Ship Date".to_string(), "Invoice Date".to_string()]);
        assert_eq!(find_date_column(&ds, "Invoice Date"), Some("Invoice Date"));
        assert_eq!(find_date_column(&ds, "Posting Date"), Some("Ship Date"));
        let ds = Dataset::empty(vec!["Amount".to_string()]);
        assert_eq!(find_date_column(&ds, "Invoice Date"), None);
    }

    #[test]
    fn test_derive_metadata_uses_date_role_only() {
        let settings = SplitSettings::default();
        let produce = RoleDataset::new(
            "Produce",
            Dataset::new(
                vec!["Customer Name".to_string(), "Invoice Date".to_string()],
                vec![vec!["Y".into(), "01/01/2020".into()]],
            ),
        );
        let broadline = RoleDataset::new(
            "Broadline",
            Dataset::new(
                vec!["Customer Name".to_string(), "Invoice Date".to_string()],
                vec![
                    vec!["Y".into(), "02/10/2025".into()],
                    vec!["Y".into(), "02/01/2025".into()],
                    vec!["X".into(), "12/31/2024".into()],
                ],
            ),
        );
        let roles = [produce, broadline];
        let today = ymd(2026, 1, 31);

        let y = derive_metadata(&settings, "Y", &partition("Y", &roles, "Customer Name"), today);
        assert_eq!(y.period_start, Some(ymd(2025, 2, 1)));
        assert_eq!(y.period_end, Some(ymd(2025, 2, 10)));
        assert_eq!(y.generated_on, today);

        // Produce rows never feed the period
        let roles = [roles[0].clone()];
        let y = derive_metadata(&settings, "Y", &partition("Y", &roles, "Customer Name"), today);
        assert_eq!(y.period_start, None);
        assert_eq!(y.period_end, None);
    }

    #[test]
    fn test_prepare_rows_writes_dates_as_text() {
        let ds = Dataset::new(
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![vec![
                CellValue::Date(ymd(2025, 3, 9).and_hms_opt(14, 5, 0).unwrap()),
                CellValue::Empty,
                CellValue::Number(4.5),
            ]],
        );
        let rows = prepare_rows(&ds, "%m/%d/%Y");
        assert_eq!(
            rows,
            vec![vec![
                CellValue::from("03/09/2025"),
                CellValue::from(""),
                CellValue::Number(4.5),
            ]]
        );
        assert!(rows.iter().flatten().all(|v| !matches!(v, CellValue::Date(_))));
    }
}
