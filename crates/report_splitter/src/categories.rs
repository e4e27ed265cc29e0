use std::collections::BTreeSet;

use models::{CellValue, Dataset};

/// Strings that stand for a missing value and never become a category.
pub const NULL_SENTINELS: [&str; 3] = ["nan", "NaN", "None"];

/// Group key of a cell: its text, trimmed. Empty and blank cells have no key.
pub fn category_key(value: &CellValue) -> Option<String> {
    let text = value.as_text()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Sorted, de-duplicated categories over every dataset carrying `identifier_column`.
///
/// Sorting is byte-wise and case-sensitive, so the result does not depend on
/// the order of the datasets.
pub fn extract_categories<'a, I>(datasets: I, identifier_column: &str) -> Vec<String>
where
    I: IntoIterator<Item = &'a Dataset>,
{
    let mut set = BTreeSet::new();
    for dataset in datasets {
        let Some(values) = dataset.column_values(identifier_column) else {
            continue;
        };
        set.extend(values.filter_map(category_key));
    }
    set.into_iter()
        .filter(|c| !NULL_SENTINELS.contains(&c.as_str()))
        .collect()
}
