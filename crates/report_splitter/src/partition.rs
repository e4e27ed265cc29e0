use models::{CellValue, Dataset};

use crate::categories::category_key;

/// Dataset loaded for one role.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleDataset {
    pub role: String,
    pub dataset: Dataset,
}

impl RoleDataset {
    pub fn new(role: impl Into<String>, dataset: Dataset) -> Self {
        Self {
            role: role.into(),
            dataset,
        }
    }
}

/// Rows of each role belonging to one category, in role order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions {
    parts: Vec<(String, Dataset)>,
}

impl Partitions {
    pub fn get(&self, role: &str) -> Option<&Dataset> {
        self.parts.iter().find(|(r, _)| r == role).map(|(_, d)| d)
    }

    pub fn row_count(&self, role: &str) -> usize {
        self.get(role).map(Dataset::len).unwrap_or(0)
    }

    pub fn is_all_empty(&self) -> bool {
        self.parts.iter().all(|(_, d)| d.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.parts.iter().map(|(r, d)| (r.as_str(), d))
    }
}

/// Rows of every role whose identifier value equals `category`.
///
/// The identifier cell of each kept row is replaced by the trimmed key.
/// A role whose dataset lacks the identifier column gets an empty partition.
pub fn partition(category: &str, roles: &[RoleDataset], identifier_column: &str) -> Partitions {
    let parts = roles
        .iter()
        .map(|rd| {
            let subset = match rd.dataset.column_index(identifier_column) {
                Some(idx) => rd
                    .dataset
                    .filter_rows(|row| category_key(&row[idx]).as_deref() == Some(category))
                    .map_column(idx, |_| CellValue::from(category)),
                None => Dataset::empty(rd.dataset.columns().to_vec()),
            };
            (rd.role.clone(), subset)
        })
        .collect();
    Partitions { parts }
}
