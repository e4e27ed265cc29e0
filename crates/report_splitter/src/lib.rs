//! Splits a customer workbook into one report per customer.
//!
//! Source sheets are loaded with [`sheet_loader`], grouped by the identifying
//! column, and each group is written into a copy of a template workbook.

pub mod assembler;
pub mod batch;
pub mod categories;
pub mod engine;
pub mod error;
pub mod partition;

pub use batch::{load_roles, run, run_batch, BatchReport, CategoryOutcome, CategoryStatus, RoleLoad};
pub use categories::extract_categories;
pub use engine::{with_session, EditableWorkbook, EngineSession, SpreadsheetEngine, UmyaEngine};
pub use error::{EngineError, SplitError};
pub use partition::{partition, Partitions, RoleDataset};
