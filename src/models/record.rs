use serde::{Deserialize, Serialize};

/// One recommendable item loaded from the source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub label: String,
    pub score: Option<f64>,
}

impl Record {
    pub fn new(
        category: Option<&str>,
        tag: Option<&str>,
        label: impl Into<String>,
        score: Option<f64>,
    ) -> Self {
        Self {
            category: category.map(str::to_string),
            tag: tag.map(str::to_string),
            label: label.into(),
            score,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

/// Whether tags are grouped under a category column or stand alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Two-level layout: every tag lookup is scoped to a category
    Categorized,
    /// Single-level layout with no category column
    TagOnly,
}

/// Immutable in-memory table shared by every request for the process lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    kind: TableKind,
    records: Vec<Record>,
}

impl Table {
    pub fn new(kind: TableKind, records: Vec<Record>) -> Self {
        Self { kind, records }
    }

    /// Table served when the source could not be loaded
    pub fn empty(kind: TableKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Coerces a raw score cell into a number.
///
/// Blank, non-numeric and NaN cells become a missing score instead of failing
/// the load.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|score| !score.is_nan())
}
