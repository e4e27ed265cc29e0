use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sheet_loader::IdentifierResolution;

/// Split a customer workbook into one templated report per customer.
#[derive(Debug, Parser)]
#[command(name = "split_reports", author, version, about = "Split a workbook into per-customer reports", long_about = None)]
struct Args {
    /// Path to a settings JSON file (optional). If omitted, uses built-in defaults
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Template workbook copied for every report
    #[arg(short = 't', long = "template")]
    template: Option<PathBuf>,

    /// Source workbook with the Produce/Broadline sheets
    #[arg(short = 's', long = "source")]
    source: Option<PathBuf>,

    /// Output directory (one sub-folder per customer)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.verbose);

    let mut settings = settings_loader::load_settings_or_default(args.config.as_ref())
        .context("Loading settings")?;
    if let Some(template) = args.template {
        settings.template_path = template;
    }
    if let Some(source) = args.source {
        settings.source_path = source;
    }
    if let Some(output) = args.output {
        settings.output_dir = output;
    }

    let report = report_splitter::run(&settings).context("Report split aborted")?;

    println!("\n📊 Summary:");
    println!("─────────────────────────────────────────");
    for load in &report.roles {
        match &load.header {
            None => println!("✗ {}: sheet '{}' not readable", load.role, load.sheet),
            Some(header) => {
                let found = if header.confident { "found" } else { "fallback" };
                println!(
                    "{} {}: {} rows, header row {} ({})",
                    if load.is_keyed() { "✓" } else { "⚠" },
                    load.role,
                    load.rows,
                    header.row_index + 1,
                    found
                );
                match &load.identifier {
                    IdentifierResolution::Exact => {}
                    IdentifierResolution::Renamed { from } => {
                        println!("    • identifier taken from '{}'", from)
                    }
                    IdentifierResolution::Unresolved => {
                        println!("    • no identifier column; no categories from this sheet")
                    }
                }
            }
        }
    }
    println!("✓ Categories found: {}", report.total());
    println!(
        "✓ Reports attempted: {} ({} skipped with no rows)",
        report.attempted(),
        report.skipped()
    );
    println!("✓ Reports written: {}", report.succeeded());
    if report.failed() > 0 {
        println!("✗ Reports failed: {}", report.failed());
        for (category, error) in report.failures() {
            println!("    • {}: {}", category, error);
        }
    }
    println!("─────────────────────────────────────────");
    println!("✅ Finished! Files are in {}", report.output_dir.display());

    Ok(())
}
