use std::collections::HashSet;
use std::sync::OnceLock;

use models::Dataset;
use regex::Regex;

/// How the identifying column was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierResolution {
    /// A column already had the canonical name.
    Exact,
    /// A customer-ish column was renamed to the canonical name.
    Renamed { from: String },
    /// No candidate; the dataset contributes no categories.
    Unresolved,
}

impl IdentifierResolution {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, IdentifierResolution::Unresolved)
    }
}

/// Matching rules for the identifying column, evaluated in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierRule {
    /// Label equals the canonical name.
    ExactName,
    /// Label mentions "customer" together with one of the qualifiers.
    CustomerWith(&'static [&'static str]),
}

pub const IDENTIFIER_RULES: &[IdentifierRule] = &[
    IdentifierRule::ExactName,
    IdentifierRule::CustomerWith(&["name", "number", "#"]),
];

impl IdentifierRule {
    fn find(&self, columns: &[String], canonical: &str) -> Option<usize> {
        match self {
            IdentifierRule::ExactName => columns.iter().position(|c| c == canonical),
            IdentifierRule::CustomerWith(qualifiers) => columns.iter().position(|c| {
                let low = c.to_lowercase();
                low.contains("customer") && qualifiers.iter().any(|q| low.contains(q))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumns {
    pub dataset: Dataset,
    pub identifier: IdentifierResolution,
}

/// Collapse line breaks and whitespace runs to single spaces and trim.
pub fn canonical_label(raw: &str) -> String {
    raw.replace(['\r', '\n'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Label given to a header cell left blank in the source sheet.
pub fn placeholder_label(column_index: usize) -> String {
    format!("Unnamed: {column_index}")
}

pub fn is_placeholder(label: &str) -> bool {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"^Unnamed: \d+(\.\d+)*$").expect("valid placeholder regex"))
        .is_match(label)
}

/// Suffix repeated labels with `.1`, `.2`, ... so every label is unique.
/// Labels that are already unique come back unchanged.
pub fn make_unique(labels: Vec<String>) -> Vec<String> {
    let originals: HashSet<String> = labels.iter().cloned().collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(labels.len());
    let mut out = Vec::with_capacity(labels.len());

    for label in labels {
        if taken.insert(label.clone()) {
            out.push(label);
            continue;
        }
        let mut k = 1;
        let unique = loop {
            let candidate = format!("{label}.{k}");
            if !taken.contains(&candidate) && !originals.contains(&candidate) {
                break candidate;
            }
            k += 1;
        };
        taken.insert(unique.clone());
        out.push(unique);
    }
    out
}

/// Pick the column that should carry the canonical identifier name.
pub fn resolve_identifier(columns: &[String], canonical: &str) -> Option<(usize, IdentifierRule)> {
    IDENTIFIER_RULES
        .iter()
        .find_map(|rule| rule.find(columns, canonical).map(|idx| (idx, *rule)))
}

/// Canonicalize labels, drop placeholder columns and resolve the identifying column.
///
/// Column order and row values are left untouched.
pub fn normalize(dataset: Dataset, canonical_identifier: &str) -> NormalizedColumns {
    let labels = make_unique(dataset.columns().iter().map(|c| canonical_label(c)).collect());
    let keep: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, label)| !is_placeholder(label))
        .map(|(i, _)| i)
        .collect();

    let mut dataset = dataset.relabel(labels).select_columns(&keep);

    let identifier = match resolve_identifier(dataset.columns(), canonical_identifier) {
        Some((_, IdentifierRule::ExactName)) => IdentifierResolution::Exact,
        Some((idx, IdentifierRule::CustomerWith(_))) => {
            let mut labels = dataset.columns().to_vec();
            let from = std::mem::replace(&mut labels[idx], canonical_identifier.to_string());
            dataset = dataset.relabel(labels);
            IdentifierResolution::Renamed { from }
        }
        None => IdentifierResolution::Unresolved,
    };

    NormalizedColumns {
        dataset,
        identifier,
    }
}
