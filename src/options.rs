use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::normalize::header_key;

const DEFAULT_HEADER_KEYWORDS: &[&str] = &[
    "line", "item", "no", "qty", "quantity", "description", "desc", "part", "price", "unit",
    "total", "amount", "ext", "extended", "each", "uom", "um", "mark", "weight", "wt", "length",
    "size", "material", "grade", "finish", "cost", "number",
];

/// A `Label: value` sub-field pulled out of the description column into a
/// column of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubfieldPattern {
    pub column: String,
    /// Regex matching the label, without the trailing colon.
    pub label: String,
}

impl SubfieldPattern {
    #[must_use]
    pub fn new(column: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            label: label.into(),
        }
    }

    /// Full pattern: the label, a colon, then the value up to the next pipe.
    #[must_use]
    pub fn pattern(&self) -> String {
        format!(r"(?i)\b(?:{})\s*:\s*(?P<value>[^|]*)", self.label)
    }
}

fn default_subfields() -> Vec<SubfieldPattern> {
    vec![
        SubfieldPattern::new("Mark", r"mark(?:\s*(?:no|#))?"),
        SubfieldPattern::new("Punch", r"punch(?:\s*code)?"),
        SubfieldPattern::new("Bend", r"bend(?:\s*dims?)?"),
        SubfieldPattern::new("Finish", r"finish"),
        SubfieldPattern::new("Grade", r"grade"),
    ]
}

/// Thresholds for the spatial reconstructor. Position units are whatever
/// the upstream extractor emits (PDF points in practice).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructOptions {
    pub column_tolerance: f32,
    pub row_tolerance: f32,
    pub header_gap: f32,
    pub header_scan_rows: usize,
    pub min_header_score: usize,
    pub wrapped_header_rows: usize,
    pub wrapped_header_leading: f32,
    pub min_column_support: usize,
    pub repeated_header_overlap: f32,
    pub banner_scan_rows: usize,
    pub banner_max_chars: usize,
    pub line_number_ratio: f32,
    pub header_keywords: Vec<String>,
    pub subfields: Vec<SubfieldPattern>,
    pub section: Option<String>,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            column_tolerance: 8.0,
            row_tolerance: 4.0,
            header_gap: 15.0,
            header_scan_rows: 15,
            min_header_score: 2,
            wrapped_header_rows: 3,
            wrapped_header_leading: 14.0,
            min_column_support: 3,
            repeated_header_overlap: 0.6,
            banner_scan_rows: 5,
            banner_max_chars: 10,
            line_number_ratio: 0.5,
            header_keywords: DEFAULT_HEADER_KEYWORDS
                .iter()
                .map(|keyword| (*keyword).to_string())
                .collect(),
            subfields: default_subfields(),
            section: None,
        }
    }
}

impl ReconstructOptions {
    pub fn validate(&self) -> Result<(), ReconcileError> {
        for (name, value) in [
            ("column_tolerance", self.column_tolerance),
            ("row_tolerance", self.row_tolerance),
            ("header_gap", self.header_gap),
            ("wrapped_header_leading", self.wrapped_header_leading),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ReconcileError::InvalidOption(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("repeated_header_overlap", self.repeated_header_overlap),
            ("line_number_ratio", self.line_number_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ReconcileError::InvalidOption(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }

        if self.min_column_support == 0 {
            return Err(ReconcileError::InvalidOption(
                "min_column_support must be at least 1".to_string(),
            ));
        }

        for subfield in &self.subfields {
            if subfield.column.trim().is_empty() {
                return Err(ReconcileError::InvalidOption(
                    "sub-field column names must be non-empty".to_string(),
                ));
            }
            regex::Regex::new(&subfield.pattern()).map_err(|error| {
                ReconcileError::InvalidOption(format!(
                    "sub-field '{}' has an invalid label pattern: {error}",
                    subfield.column
                ))
            })?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueComparison {
    #[default]
    Trimmed,
    Exact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub similarity_threshold: f64,
    pub fuzzy: bool,
    pub value_comparison: ValueComparison,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            fuzzy: true,
            value_comparison: ValueComparison::Trimmed,
        }
    }
}

impl MatchOptions {
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ReconcileError::InvalidOption(format!(
                "similarity_threshold must be in (0, 1], got {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyColumn {
    Index(usize),
    Name(String),
}

impl KeyColumn {
    /// Resolves to a position in `headers`. Indices are clamped later by the
    /// differ, so only names can fail.
    pub fn resolve(&self, headers: &[String]) -> Result<usize, ReconcileError> {
        match self {
            Self::Index(index) => Ok(*index),
            Self::Name(name) => {
                let wanted = header_key(name);
                headers
                    .iter()
                    .position(|header| header_key(header) == wanted)
                    .ok_or_else(|| ReconcileError::UnknownColumn {
                        name: name.clone(),
                        available: headers.join(", "),
                    })
            }
        }
    }
}

impl FromStr for KeyColumn {
    type Err = String;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err("key column cannot be empty".to_string());
        }

        if trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return trimmed
                .parse()
                .map(Self::Index)
                .map_err(|_| format!("invalid key column index: '{trimmed}'"));
        }

        Ok(Self::Name(trimmed.to_string()))
    }
}
