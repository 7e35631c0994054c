use serde::{Deserialize, Serialize};

use crate::warning::ReconcileWarning;

/// One atomic run of text lifted from a page-based document.
///
/// Coordinates use a top-left origin: `y` grows down the page, `x` is the
/// left edge of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedFragment {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    pub text: String,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

impl PositionedFragment {
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, text: impl Into<String>, page: u32) -> Self {
        Self {
            x,
            y,
            width,
            text: text.into(),
            page,
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width.max(0.0)
    }
}

/// A header + rows grid for one document, page span or section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalTable {
    #[serde(default)]
    pub section: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl LogicalTable {
    #[must_use]
    pub fn new(section: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            section: section.into(),
            headers,
            rows,
        }
    }

    /// The table produced when there is nothing to reconstruct.
    #[must_use]
    pub fn empty(section: impl Into<String>) -> Self {
        Self::new(section, vec!["Content".to_string()], Vec::new())
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Missing,
    Modified,
    Identical,
}

impl RecordStatus {
    /// Output order: missing first, then modified, then identical.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Modified => 1,
            Self::Identical => 2,
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Modified => write!(f, "modified"),
            Self::Identical => write!(f, "identical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparedCell {
    pub header: String,
    /// One slot per input file, in file order.
    pub values: Vec<Option<String>>,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparedRecord {
    pub status: RecordStatus,
    pub key_value: String,
    /// Other key spellings that were fuzzily merged into this record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub present_in: Vec<usize>,
    pub missing_from: Vec<usize>,
    pub cells: Vec<ComparedCell>,
}

impl ComparedRecord {
    #[must_use]
    pub fn cell(&self, header: &str) -> Option<&ComparedCell> {
        self.cells.iter().find(|cell| cell.header == header)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_items: usize,
    pub identical: usize,
    pub modified: usize,
    pub missing: usize,
    pub match_score: u8,
    pub missing_per_file: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub headers: Vec<String>,
    pub records: Vec<ComparedRecord>,
    pub summary: ComparisonSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ReconcileWarning>,
}

/// A reconstructed table together with the degraded paths taken to build it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconstruction {
    pub table: LogicalTable,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ReconcileWarning>,
}
