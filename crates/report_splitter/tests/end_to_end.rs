use std::path::{Path, PathBuf};

use models::{HeaderMatch, SplitSettings};
use report_splitter::{run, CategoryStatus, SplitError};
use sheet_loader::IdentifierResolution;
use umya_spreadsheet::{NumberingFormat, Spreadsheet};

enum V {
    S(&'static str),
    N(f64),
    /// Excel serial shown with a date number format.
    D(f64),
}

fn put(book: &mut Spreadsheet, sheet: &str, address: &str, value: V) {
    let ws = book.get_sheet_by_name_mut(sheet).unwrap();
    match value {
        V::S(s) => {
            ws.get_cell_mut(address).set_value_string(s);
        }
        V::N(n) => {
            ws.get_cell_mut(address).set_value_number(n);
        }
        V::D(serial) => {
            let cell = ws.get_cell_mut(address);
            cell.set_value_number(serial);
            cell.get_style_mut()
                .get_number_format_mut()
                .set_format_code(NumberingFormat::FORMAT_DATE_XLSX14);
        }
    }
}

fn write_template(path: &Path) {
    let mut book = umya_spreadsheet::new_file();
    for sheet in ["Information", "Produce", "Broadline"] {
        book.new_sheet(sheet).unwrap();
    }
    put(&mut book, "Information", "C5", V::S("Customer"));
    put(&mut book, "Information", "C7", V::S("Period start"));
    put(&mut book, "Information", "C8", V::S("Period end"));
    put(&mut book, "Information", "C9", V::S("Generated"));
    put(&mut book, "Produce", "A1", V::S("Invoice Date"));
    put(&mut book, "Produce", "B1", V::S("Customer Name"));
    put(&mut book, "Produce", "C1", V::S("Qty"));
    put(&mut book, "Broadline", "A1", V::S("Customer Name"));
    put(&mut book, "Broadline", "B1", V::S("Invoice Date"));
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

/// Produce: title rows, header on row 3. Broadline: header on row 1 with
/// "Customer Number" instead of "Customer Name".
fn write_source(path: &Path, with_broadline: bool) {
    let mut book = umya_spreadsheet::new_file();
    book.new_sheet("Produce").unwrap();
    put(&mut book, "Produce", "A1", V::S("Produce purchases 7-1-2025 to 1-31-2026"));
    put(&mut book, "Produce", "A3", V::S("Invoice Date"));
    put(&mut book, "Produce", "B3", V::S("Customer\nName"));
    put(&mut book, "Produce", "C3", V::S("Qty"));
    let rows = [("01/02/2025", "X", 3.0), ("01/03/2025", "Y", 4.0), ("01/04/2025", "X", 5.0)];
    for (i, (date, customer, qty)) in rows.into_iter().enumerate() {
        let r = i + 4;
        put(&mut book, "Produce", &format!("A{r}"), V::S(date));
        put(&mut book, "Produce", &format!("B{r}"), V::S(customer));
        put(&mut book, "Produce", &format!("C{r}"), V::N(qty));
    }

    if with_broadline {
        book.new_sheet("Broadline").unwrap();
        put(&mut book, "Broadline", "A1", V::S("Customer\r\nNumber"));
        put(&mut book, "Broadline", "B1", V::S(" Invoice  Date "));
        put(&mut book, "Broadline", "A2", V::S("Y"));
        put(&mut book, "Broadline", "B2", V::S("2025-08-14"));
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

fn settings_in(dir: &Path) -> SplitSettings {
    SplitSettings {
        template_path: dir.join("Header_Template.xlsx"),
        source_path: dir.join("accounts.xlsx"),
        output_dir: dir.join("Split_Categories"),
        ..SplitSettings::default()
    }
}

fn open_report(path: &PathBuf) -> Spreadsheet {
    umya_spreadsheet::reader::xlsx::read(path).unwrap()
}

fn value(book: &Spreadsheet, sheet: &str, address: &str) -> String {
    book.get_sheet_by_name(sheet).unwrap().get_value(address)
}

#[test]
fn test_produce_and_broadline_split() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    write_template(&settings.template_path);
    write_source(&settings.source_path, true);

    let report = run(&settings).unwrap();
    let categories: Vec<&str> = report.outcomes.iter().map(|o| o.category.as_str()).collect();
    assert_eq!(categories, vec!["X", "Y"]);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 0);

    assert_eq!(
        report.roles[0].header,
        Some(HeaderMatch {
            row_index: 2,
            confident: true
        })
    );
    // "customer number" lacks "name": fallback row, renamed identifier
    assert_eq!(
        report.roles[1].header,
        Some(HeaderMatch {
            row_index: 0,
            confident: false
        })
    );
    assert_eq!(
        report.roles[1].identifier,
        IdentifierResolution::Renamed {
            from: "Customer Number".to_string()
        }
    );

    let x_path = settings.output_dir.join("X").join("X_Report.xlsx");
    let y_path = settings.output_dir.join("Y").join("Y_Report.xlsx");
    match &report.outcomes[0].status {
        CategoryStatus::Written { path, rows } => {
            assert_eq!(path, &x_path);
            assert_eq!(
                rows,
                &vec![("Produce".to_string(), 2), ("Broadline".to_string(), 0)]
            );
        }
        other => panic!("unexpected status {other:?}"),
    }

    let x = open_report(&x_path);
    assert_eq!(value(&x, "Produce", "A1"), "Invoice Date");
    assert_eq!(value(&x, "Produce", "A2"), "01/02/2025");
    assert_eq!(value(&x, "Produce", "B2"), "X");
    assert_eq!(value(&x, "Produce", "A3"), "01/04/2025");
    assert_eq!(value(&x, "Produce", "A4"), "");
    assert_eq!(value(&x, "Broadline", "A2"), "");
    assert_eq!(value(&x, "Information", "D5"), "X");
    assert_eq!(value(&x, "Information", "D7"), "");
    assert_eq!(value(&x, "Information", "C7"), "Period start");

    let y = open_report(&y_path);
    assert_eq!(value(&y, "Produce", "B2"), "Y");
    assert_eq!(value(&y, "Produce", "A3"), "");
    assert_eq!(value(&y, "Broadline", "A2"), "Y");
    assert_eq!(value(&y, "Broadline", "B2"), "2025-08-14");
    assert_eq!(value(&y, "Information", "D5"), "Y");
    assert_eq!(value(&y, "Information", "D7"), "08/14/2025");
    assert_eq!(value(&y, "Information", "D8"), "08/14/2025");
    let today = chrono::Local::now().date_naive().format("%m/%d/%Y").to_string();
    assert_eq!(value(&y, "Information", "D9"), today);
}

#[test]
fn test_missing_source_sheet_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    write_template(&settings.template_path);
    write_source(&settings.source_path, false);

    let report = run(&settings).unwrap();
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.roles[1].header, None);
    assert!(!report.roles[1].is_keyed());
    let y = open_report(&settings.output_dir.join("Y").join("Y_Report.xlsx"));
    assert_eq!(value(&y, "Produce", "B2"), "Y");
    assert_eq!(value(&y, "Information", "D7"), "");
}

#[test]
fn test_missing_source_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    write_template(&settings.template_path);

    let err = run(&settings).unwrap_err();
    assert!(matches!(err, SplitError::FatalInput { .. }));
    assert!(!settings.output_dir.exists());
}

/// Both sheets: three blank rows, header on row 4, nothing in column A, and
/// dates stored as date-formatted serials.
fn write_serial_date_source(path: &Path) {
    let mut book = umya_spreadsheet::new_file();
    for sheet in ["Produce", "Broadline"] {
        book.new_sheet(sheet).unwrap();
        put(&mut book, sheet, "B4", V::S("Customer Name"));
        put(&mut book, sheet, "C4", V::S("Invoice Date"));
    }
    put(&mut book, "Produce", "D4", V::S("Qty"));
    // 45658 = 2025-01-01
    put(&mut book, "Produce", "B5", V::S("X"));
    put(&mut book, "Produce", "C5", V::D(45658.0));
    put(&mut book, "Produce", "D5", V::N(3.0));
    put(&mut book, "Produce", "B6", V::S("Y"));
    put(&mut book, "Produce", "C6", V::D(45659.0));
    put(&mut book, "Produce", "D6", V::N(4.0));

    put(&mut book, "Broadline", "B5", V::S("X"));
    put(&mut book, "Broadline", "C5", V::D(45700.0));
    put(&mut book, "Broadline", "B6", V::S("X"));
    put(&mut book, "Broadline", "C6", V::D(45660.0));
    put(&mut book, "Broadline", "B7", V::S("Y"));
    put(&mut book, "Broadline", "C7", V::D(45659.0));
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

fn write_identifier_first_template(path: &Path) {
    let mut book = umya_spreadsheet::new_file();
    for sheet in ["Information", "Produce", "Broadline"] {
        book.new_sheet(sheet).unwrap();
    }
    put(&mut book, "Produce", "A1", V::S("Customer Name"));
    put(&mut book, "Produce", "B1", V::S("Invoice Date"));
    put(&mut book, "Produce", "C1", V::S("Qty"));
    put(&mut book, "Broadline", "A1", V::S("Customer Name"));
    put(&mut book, "Broadline", "B1", V::S("Invoice Date"));
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

#[test]
fn test_native_date_cells_with_offset_header() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path());
    write_identifier_first_template(&settings.template_path);
    write_serial_date_source(&settings.source_path);

    let report = run(&settings).unwrap();
    assert_eq!(report.succeeded(), 2);
    for load in &report.roles {
        let header = load.header.as_ref().unwrap();
        assert_eq!(header.row_index, 3, "{}", load.role);
        assert!(header.confident);
        assert!(load.is_keyed());
    }

    let x = open_report(&settings.output_dir.join("X").join("X_Report.xlsx"));
    // blank column A is dropped, so the identifier lands in column A
    assert_eq!(value(&x, "Produce", "A2"), "X");
    assert_eq!(value(&x, "Produce", "B2"), "01/01/2025");
    assert_eq!(value(&x, "Produce", "A3"), "");
    assert_eq!(value(&x, "Broadline", "A2"), "X");
    assert_eq!(value(&x, "Broadline", "B2"), "02/12/2025");
    assert_eq!(value(&x, "Broadline", "B3"), "01/03/2025");
    assert_eq!(value(&x, "Information", "D5"), "X");
    assert_eq!(value(&x, "Information", "D7"), "01/03/2025");
    assert_eq!(value(&x, "Information", "D8"), "02/12/2025");

    let y = open_report(&settings.output_dir.join("Y").join("Y_Report.xlsx"));
    assert_eq!(value(&y, "Produce", "B2"), "01/02/2025");
    assert_eq!(value(&y, "Information", "D7"), "01/02/2025");
    assert_eq!(value(&y, "Information", "D8"), "01/02/2025");
}
