//! Reconstructs tables from positioned document text and reconciles records
//! across several such tables.
//!
//! Both stages are pure, synchronous transformations: reading documents and
//! rendering results belong to the caller.

mod alias;
mod columns;
mod config;
mod diff;
mod error;
mod header;
mod merge;
mod model;
mod normalize;
mod options;
mod reconstruct;
mod records;
mod rows;
mod similarity;
mod subfields;
mod warning;

pub use config::Config;
pub use diff::{compare_across_files, compare_across_files_with};
pub use error::ReconcileError;
pub use merge::merge_tables;
pub use model::{
    ComparedCell, ComparedRecord, ComparisonResult, ComparisonSummary, LogicalTable,
    PositionedFragment, Reconstruction, RecordStatus,
};
pub use normalize::{normalize_key, normalize_rows, unify_headers};
pub use options::{KeyColumn, MatchOptions, ReconstructOptions, SubfieldPattern, ValueComparison};
pub use reconstruct::{reconstruct_table, reconstruct_table_with};
pub use similarity::similarity;
pub use warning::{ReconcileWarning, WarningCode};
