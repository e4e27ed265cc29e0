//! # Settings Loader
//!
//! Loads the [`SplitSettings`] that drive a report-splitting batch from a JSON
//! file. Every field has a default, so a settings file only needs the values
//! that differ from the stock Produce/Broadline layout.
//!
//! ## Usage Examples
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! // Load settings from a specific path
//! let settings = settings_loader::load_settings("config/split.json")?;
//!
//! // Load optional settings (built-in defaults when no path is given)
//! let path = Some(PathBuf::from("settings.json"));
//! let settings = settings_loader::load_settings_or_default(path.as_ref())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use models::SplitSettings;

/// Loads and validates settings from a JSON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<SplitSettings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Reading settings file: {}", path.display()))?;
    let settings: SplitSettings = serde_json::from_str(&raw)
        .with_context(|| format!("Parsing settings JSON in {}", path.display()))?;
    validate_settings(&settings)
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded settings");
    Ok(settings)
}

/// Loads settings from an optional path, using the built-in defaults when no path is provided
pub fn load_settings_or_default(path: Option<&PathBuf>) -> Result<SplitSettings> {
    match path {
        Some(settings_path) => load_settings(settings_path),
        None => {
            let settings = SplitSettings::default();
            validate_settings(&settings)?;
            Ok(settings)
        }
    }
}

/// Rejects settings that would make every category fail the same way.
pub fn validate_settings(settings: &SplitSettings) -> Result<()> {
    if settings.header_keywords.is_empty() {
        bail!("header_keywords must contain at least one keyword");
    }
    if settings.header_keywords.iter().any(|k| k.trim().is_empty()) {
        bail!("header_keywords must not contain blank keywords");
    }
    if settings.header_scan_rows == 0 {
        bail!("header_scan_rows must be at least 1");
    }
    if settings.identifier_column.trim().is_empty() {
        bail!("identifier_column must not be empty");
    }
    if settings.roles.is_empty() {
        bail!("at least one role is required");
    }
    for role in &settings.roles {
        if role.template_header_row == 0 {
            bail!("role '{}': template_header_row is 1-based", role.name);
        }
        if let Some(h) = role.row_height {
            if !(h > 0.0 && h.is_finite()) {
                bail!("role '{}': row_height must be a positive number", role.name);
            }
        }
    }
    if settings.role(&settings.date_role).is_none() {
        bail!("date_role '{}' is not one of the configured roles", settings.date_role);
    }
    let cells = &settings.metadata_cells;
    for (field, address) in [
        ("category", &cells.category),
        ("period_start", &cells.period_start),
        ("period_end", &cells.period_end),
        ("generated_on", &cells.generated_on),
    ] {
        if !is_cell_address(address) {
            bail!("metadata_cells.{field}: '{address}' is not an A1-style cell address");
        }
    }
    Ok(())
}

/// `D5`, `AA12`, ... : column letters followed by a row number ≥ 1.
fn is_cell_address(s: &str) -> bool {
    let letters = s.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    let digits = &s[letters..];
    letters > 0
        && letters <= 3
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}
