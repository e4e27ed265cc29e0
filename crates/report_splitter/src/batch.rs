use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use models::{Dataset, HeaderMatch, SplitSettings};
use sheet_loader::{load_sheet, IdentifierResolution, LoadOptions, LoadedSheet, SheetSource, WorkbookSource};

use crate::assembler::{assemble, checked_folder_name};
use crate::categories::extract_categories;
use crate::engine::{with_session, SpreadsheetEngine, UmyaEngine};
use crate::error::{Result, SplitError};
use crate::partition::{partition, RoleDataset};

#[derive(Debug, Clone, PartialEq)]
pub enum CategoryStatus {
    /// Report written; row counts per role.
    Written {
        path: PathBuf,
        rows: Vec<(String, usize)>,
    },
    /// Every partition was empty; nothing was created.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryOutcome {
    pub category: String,
    pub status: CategoryStatus,
}

/// How one role's source sheet was read.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleLoad {
    pub role: String,
    pub sheet: String,
    /// `None` when the sheet could not be read at all.
    pub header: Option<HeaderMatch>,
    pub identifier: IdentifierResolution,
    pub rows: usize,
}

impl RoleLoad {
    /// Whether the role can contribute categories.
    pub fn is_keyed(&self) -> bool {
        self.header.is_some() && self.identifier.is_resolved()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub output_dir: PathBuf,
    /// Filled by [`run`]; empty when the batch is driven directly.
    pub roles: Vec<RoleLoad>,
    pub outcomes: Vec<CategoryOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Categories that got as far as building a report.
    pub fn attempted(&self) -> usize {
        self.total() - self.skipped()
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, CategoryStatus::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, CategoryStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, CategoryStatus::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            CategoryStatus::Failed(e) => Some((o.category.as_str(), e.as_str())),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&CategoryStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Load every role's source sheet. A sheet that cannot be read is logged and
/// treated as an empty dataset.
pub fn load_roles<S>(source: &mut S, settings: &SplitSettings) -> (Vec<RoleDataset>, Vec<RoleLoad>)
where
    S: SheetSource + ?Sized,
{
    let opts = LoadOptions::from(settings);
    settings
        .roles
        .iter()
        .map(|role| match load_sheet(source, &role.source_sheet, &opts) {
            Ok(LoadedSheet {
                sheet,
                header,
                dataset,
                identifier,
            }) => {
                let load = RoleLoad {
                    role: role.name.clone(),
                    sheet,
                    header: Some(header),
                    identifier,
                    rows: dataset.len(),
                };
                (RoleDataset::new(role.name.as_str(), dataset), load)
            }
            Err(e) => {
                tracing::warn!("Warning: {} (role '{}' contributes no rows)", e, role.name);
                let load = RoleLoad {
                    role: role.name.clone(),
                    sheet: role.source_sheet.clone(),
                    header: None,
                    identifier: IdentifierResolution::Unresolved,
                    rows: 0,
                };
                (RoleDataset::new(role.name.as_str(), Dataset::default()), load)
            }
        })
        .unzip()
}

/// Build one report per category, in the given order, inside a single engine session.
///
/// A failing category is recorded and the batch moves on.
pub fn run_batch<E: SpreadsheetEngine>(
    engine: E,
    settings: &SplitSettings,
    roles: &[RoleDataset],
    categories: &[String],
    generated_on: NaiveDate,
) -> Result<BatchReport> {
    fs::create_dir_all(&settings.output_dir).map_err(|e| SplitError::io(&settings.output_dir, e))?;

    tracing::info!("Starting spreadsheet engine...");
    let outcomes = with_session(engine, |session| {
        let total = categories.len();
        let mut count = 0usize;
        let mut outcomes = Vec::with_capacity(total);
        let mut folders: HashMap<String, &str> = HashMap::new();

        for category in categories {
            let parts = partition(category, roles, &settings.identifier_column);
            if parts.is_all_empty() {
                tracing::debug!(category = category.as_str(), "no rows; skipped");
                outcomes.push(CategoryOutcome {
                    category: category.clone(),
                    status: CategoryStatus::Skipped,
                });
                continue;
            }

            let claimed = checked_folder_name(category).and_then(|folder| match folders.entry(folder) {
                Entry::Occupied(taken) => Err(SplitError::FolderClash {
                    category: category.clone(),
                    folder: taken.key().clone(),
                    owner: taken.get().to_string(),
                }),
                Entry::Vacant(free) => {
                    free.insert(category.as_str());
                    Ok(())
                }
            });

            let written = claimed.and_then(|()| {
                assemble(session.engine(), settings, category, &parts, generated_on)
            });
            let status = match written {
                Ok(path) => {
                    count += 1;
                    if count % 5 == 0 {
                        tracing::info!("  Processed {}/{}: {}", count, total, category);
                    } else {
                        tracing::info!("  Success: {}", category);
                    }
                    CategoryStatus::Written {
                        path,
                        rows: parts.iter().map(|(r, d)| (r.to_string(), d.len())).collect(),
                    }
                }
                Err(e) => {
                    tracing::error!("Failed {}: {}", category, e);
                    CategoryStatus::Failed(e.to_string())
                }
            };
            outcomes.push(CategoryOutcome {
                category: category.clone(),
                status,
            });
        }
        outcomes
    });

    Ok(BatchReport {
        output_dir: settings.output_dir.clone(),
        roles: Vec::new(),
        outcomes,
    })
}

/// Whole pipeline: open inputs, load sheets, extract categories, write reports.
///
/// Fails only when the template or the source workbook cannot be used.
pub fn run(settings: &SplitSettings) -> Result<BatchReport> {
    if !settings.template_path.is_file() {
        return Err(SplitError::FatalInput {
            path: settings.template_path.clone(),
            reason: "template file not found".to_string(),
        });
    }
    let mut source =
        WorkbookSource::open(&settings.source_path).map_err(|e| SplitError::FatalInput {
            path: settings.source_path.clone(),
            reason: e.to_string(),
        })?;

    tracing::info!("[{}] Loading master data...", Local::now().format("%H:%M:%S"));
    let (roles, loads) = load_roles(&mut source, settings);

    let categories = extract_categories(
        roles.iter().map(|r| &r.dataset),
        &settings.identifier_column,
    );
    tracing::info!(
        "Processing {} categories with template {}...",
        categories.len(),
        settings.template_path.display()
    );

    let mut report = run_batch(
        UmyaEngine::default(),
        settings,
        &roles,
        &categories,
        Local::now().date_naive(),
    )?;
    report.roles = loads;
    Ok(report)
}
