use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sheet_loader::header::row_signature;
use sheet_loader::{SheetSource, WorkbookSource};

/// Print the first rows of workbook sheets and the rows that look like headers.
#[derive(Debug, Parser)]
#[command(name = "inspect_workbook", author, version, about = "Peek at sheet layouts before splitting", long_about = None)]
struct Args {
    /// Workbook to inspect (template or source)
    #[arg(default_value = "Header_Template.xlsx")]
    path: PathBuf,

    /// Sheets to show; all sheets when omitted
    #[arg(short = 's', long = "sheet")]
    sheets: Vec<String>,

    /// Rows printed per sheet
    #[arg(short = 'n', long = "rows", default_value_t = 5)]
    rows: usize,
}

const HEADER_HINTS: [&str; 3] = ["source", "date", "customer"];

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(0);

    let mut workbook = WorkbookSource::open(&args.path)
        .with_context(|| format!("Cannot open {}", args.path.display()))?;
    println!("Inspecting {}...", args.path.display());

    let sheets = if args.sheets.is_empty() {
        workbook.sheet_names()
    } else {
        args.sheets.clone()
    };

    for sheet in sheets {
        println!("\n--- Sheet: {} ---", sheet);
        let raw = match workbook.read_rows(&sheet, Some(args.rows)) {
            Ok(r) => r,
            Err(e) => {
                println!("  (cannot read: {e})");
                continue;
            }
        };

        println!("First {} rows (raw):", raw.len());
        for (r_idx, row) in raw.rows.iter().enumerate() {
            let mut cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            // Trim trailing empties for readability
            while matches!(cells.last(), Some(s) if s.trim().is_empty()) {
                cells.pop();
            }
            println!("  row {:>4}: {}", r_idx + 1, cells.join(" | "));
        }

        for (r_idx, row) in raw.rows.iter().enumerate() {
            let signature = row_signature(row);
            if HEADER_HINTS.iter().any(|h| signature.contains(h)) {
                println!("Potential header found at row {}: {}", r_idx + 1, signature);
            }
        }
    }

    Ok(())
}
