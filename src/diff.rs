use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};

use crate::alias::KeyAliases;
use crate::merge::merge_tables;
use crate::model::{
    ComparedCell, ComparedRecord, ComparisonResult, ComparisonSummary, LogicalTable, RecordStatus,
};
use crate::normalize::{collapse_whitespace, column_mapping, normalize_key, normalize_rows, unify_headers};
use crate::options::{MatchOptions, ValueComparison};
use crate::similarity::{could_reach, similarity};
use crate::warning::{ReconcileWarning, WarningCode};

/// One file's rows projected onto the unified header layout.
struct FileRows {
    rows: Vec<Vec<String>>,
    /// Whether the file's tables carry each unified column at all.
    carried: Vec<bool>,
    /// Normalized key -> first row holding it.
    keys: IndexMap<String, usize>,
}

fn index_keys(
    file: usize,
    rows: &[Vec<String>],
    key_column: usize,
    warnings: &mut Vec<ReconcileWarning>,
) -> IndexMap<String, usize> {
    let mut keys = IndexMap::new();
    let mut duplicates = 0_usize;
    let mut empty = 0_usize;
    for (index, row) in rows.iter().enumerate() {
        let key = row.get(key_column).map(|value| normalize_key(value)).unwrap_or_default();
        if key.is_empty() {
            empty += 1;
            continue;
        }
        if keys.contains_key(&key) {
            duplicates += 1;
            continue;
        }
        keys.insert(key, index);
    }

    if duplicates > 0 {
        warnings.push(
            ReconcileWarning::new(
                WarningCode::DuplicateKey,
                "duplicate keys within one file; the first occurrence was used",
            )
            .with_file(file)
            .with_count(duplicates),
        );
    }
    if empty > 0 {
        warnings.push(
            ReconcileWarning::new(
                WarningCode::EmptyKeyRowsSkipped,
                "rows with an empty key were left out of matching",
            )
            .with_file(file)
            .with_count(empty),
        );
    }
    keys
}

/// Pairs keys found in a single file with their closest key from another
/// file when the bigram similarity reaches the threshold.
fn rescue_singletons(universe: &IndexSet<String>, aliases: &mut KeyAliases, threshold: f64) {
    let lengths = universe
        .iter()
        .map(|key| key.chars().filter(|ch| !ch.is_whitespace()).count())
        .collect::<Vec<_>>();

    for (index, key) in universe.iter().enumerate() {
        let own_files = aliases.files_of(index).clone();
        if own_files.len() != 1 || aliases.find(index) != index {
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for (candidate, other) in universe.iter().enumerate() {
            if candidate == index
                || !aliases.files_of(candidate).is_disjoint(&own_files)
                || !could_reach(lengths[index], lengths[candidate], threshold)
            {
                continue;
            }
            let score = similarity(key, other);
            if score >= threshold && best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((candidate, score));
            }
        }

        if let Some((candidate, score)) = best
            && aliases.union(index, candidate)
        {
            tracing::debug!(key = %key, alias_of = %universe[candidate], score, "fuzzy key alias");
        }
    }
}

fn values_equal(values: &[&String], comparison: ValueComparison) -> bool {
    let mut normalized = values.iter().map(|value| match comparison {
        ValueComparison::Trimmed => collapse_whitespace(value),
        ValueComparison::Exact => (*value).clone(),
    });
    let Some(first) = normalized.next() else {
        return true;
    };
    normalized.all(|value| value == first)
}

fn summarize(records: &[ComparedRecord], file_count: usize) -> ComparisonSummary {
    let count = |status: RecordStatus| records.iter().filter(|r| r.status == status).count();
    let total_items = records.len();
    let identical = count(RecordStatus::Identical);

    let mut missing_per_file = vec![0; file_count];
    for record in records {
        for file in &record.missing_from {
            if let Some(slot) = missing_per_file.get_mut(*file) {
                *slot += 1;
            }
        }
    }

    let match_score = if total_items == 0 {
        100
    } else {
        let percent = (identical as f64 * 100.0 / total_items as f64).round();
        percent.clamp(0.0, 100.0) as u8
    };

    ComparisonSummary {
        total_items,
        identical,
        modified: count(RecordStatus::Modified),
        missing: count(RecordStatus::Missing),
        match_score,
        missing_per_file,
    }
}

/// Compares tables across files with the default matching options.
#[must_use]
pub fn compare_across_files(tables_per_file: &[Vec<LogicalTable>], key_column: usize) -> ComparisonResult {
    compare_across_files_with(tables_per_file, key_column, &MatchOptions::default())
}

/// Reconciles the tables of every file against one key column.
///
/// Rows are matched on their normalized key, first exactly and then, for
/// keys seen in only one file, by bigram similarity. Every resulting record
/// lists where it is present and which cells differ. `key_column` is
/// clamped to the unified header range.
#[must_use]
pub fn compare_across_files_with(
    tables_per_file: &[Vec<LogicalTable>],
    key_column: usize,
    options: &MatchOptions,
) -> ComparisonResult {
    let file_count = tables_per_file.len();
    let mut warnings = Vec::new();

    let merged = tables_per_file
        .iter()
        .map(|tables| merge_tables(tables))
        .collect::<Vec<_>>();
    let headers = unify_headers(
        &merged
            .iter()
            .map(|(headers, _)| headers.clone())
            .collect::<Vec<_>>(),
    );
    if headers.is_empty() {
        return ComparisonResult {
            headers,
            records: Vec::new(),
            summary: summarize(&[], file_count),
            warnings,
        };
    }
    let key_column = key_column.min(headers.len() - 1);

    let files = merged
        .iter()
        .enumerate()
        .map(|(file, (file_headers, rows))| {
            let rows = normalize_rows(rows, file_headers, &headers);
            let carried = column_mapping(file_headers, &headers)
                .iter()
                .map(Option::is_some)
                .collect();
            let keys = index_keys(file, &rows, key_column, &mut warnings);
            FileRows { rows, carried, keys }
        })
        .collect::<Vec<_>>();

    let mut universe: IndexSet<String> = IndexSet::new();
    for file in &files {
        universe.extend(file.keys.keys().cloned());
    }
    let membership = universe
        .iter()
        .map(|key| {
            files
                .iter()
                .enumerate()
                .filter(|(_, file)| file.keys.contains_key(key))
                .map(|(index, _)| index)
                .collect::<BTreeSet<_>>()
        })
        .collect::<Vec<_>>();

    let mut aliases = KeyAliases::new(membership);
    if options.fuzzy {
        rescue_singletons(&universe, &mut aliases, options.similarity_threshold);
    }

    let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for index in 0..universe.len() {
        groups.entry(aliases.find(index)).or_default().push(index);
    }

    let raw_key = |file: &FileRows, key: &str| {
        file.keys
            .get(key)
            .and_then(|row| file.rows[*row].get(key_column))
            .map(|value| collapse_whitespace(value))
    };

    let mut records = Vec::with_capacity(groups.len());
    for members in groups.values() {
        let rows = files
            .iter()
            .map(|file| {
                members
                    .iter()
                    .find_map(|member| file.keys.get(&universe[*member]))
                    .map(|row| &file.rows[*row])
            })
            .collect::<Vec<_>>();

        let present_in = (0..file_count).filter(|f| rows[*f].is_some()).collect::<Vec<_>>();
        let missing_from = (0..file_count).filter(|f| rows[*f].is_none()).collect::<Vec<_>>();
        let missing = !missing_from.is_empty();

        let spelled = members
            .iter()
            .filter_map(|member| {
                files
                    .iter()
                    .find_map(|file| raw_key(file, &universe[*member]))
            })
            .collect::<Vec<_>>();
        let key_value = spelled.first().cloned().unwrap_or_default();
        let aliases_seen = spelled
            .iter()
            .skip(1)
            .filter(|spelling| **spelling != key_value)
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let cells = headers
            .iter()
            .enumerate()
            .map(|(column, header)| {
                let values = rows
                    .iter()
                    .zip(&files)
                    .map(|(row, file)| {
                        row.filter(|_| file.carried[column])
                            .and_then(|row| row.get(column))
                            .cloned()
                    })
                    .collect::<Vec<_>>();
                let present = values.iter().flatten().collect::<Vec<_>>();
                ComparedCell {
                    header: header.clone(),
                    changed: missing || !values_equal(&present, options.value_comparison),
                    values,
                }
            })
            .collect::<Vec<_>>();

        let status = if missing {
            RecordStatus::Missing
        } else if cells.iter().any(|cell| cell.changed) {
            RecordStatus::Modified
        } else {
            RecordStatus::Identical
        };

        records.push(ComparedRecord {
            status,
            key_value,
            aliases: aliases_seen,
            present_in,
            missing_from,
            cells,
        });
    }

    records.sort_by_key(|record| record.status.rank());
    let summary = summarize(&records, file_count);
    tracing::debug!(
        files = file_count,
        records = summary.total_items,
        identical = summary.identical,
        modified = summary.modified,
        missing = summary.missing,
        "comparison finished"
    );

    ComparisonResult {
        headers,
        records,
        summary,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_across_files, compare_across_files_with};
    use crate::model::{LogicalTable, RecordStatus};
    use crate::options::{MatchOptions, ValueComparison};
    use crate::warning::WarningCode;
    use pretty_assertions::assert_eq;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Vec<LogicalTable> {
        vec![LogicalTable::new(
            "Sheet1",
            headers.iter().map(|h| (*h).to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| (*v).to_string()).collect())
                .collect(),
        )]
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some((*v).to_string())).collect()
    }

    #[test]
    fn flags_modified_quantity() {
        let files = vec![
            table(&["Item", "Qty"], &[&["Bolt", "10"]]),
            table(&["Item", "Qty"], &[&["Bolt", "12"]]),
        ];
        let result = compare_across_files(&files, 0);

        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.status, RecordStatus::Modified);
        assert_eq!(record.key_value, "Bolt");
        let qty = record.cell("Qty").expect("Qty cell");
        assert!(qty.changed);
        assert_eq!(qty.values, some(&["10", "12"]));
        assert!(!record.cell("Item").expect("Item cell").changed);
        assert_eq!(result.summary.match_score, 0);
    }

    #[test]
    fn reports_missing_record_per_file() {
        let files = vec![
            table(&["Item", "Qty"], &[&["Washer", "5"], &["Bolt", "1"]]),
            table(&["Item", "Qty"], &[&["Bolt", "1"]]),
        ];
        let result = compare_across_files(&files, 0);

        assert_eq!(result.records.len(), 2);
        let washer = &result.records[0];
        assert_eq!(washer.status, RecordStatus::Missing);
        assert_eq!(washer.present_in, vec![0]);
        assert_eq!(washer.missing_from, vec![1]);
        assert_eq!(washer.cell("Qty").expect("Qty cell").values, vec![Some("5".to_string()), None]);
        assert!(washer.cells.iter().all(|cell| cell.changed));

        assert_eq!(result.records[1].status, RecordStatus::Identical);
        assert_eq!(result.summary.missing_per_file, vec![0, 1]);
        assert_eq!(result.summary.match_score, 50);
    }

    #[test]
    fn fuzzy_rescue_merges_near_identical_keys() {
        let files = vec![
            table(&["Mark", "Qty"], &[&["Beam-12", "4"]]),
            table(&["Mark", "Qty"], &[&["Beam-1Z", "4"]]),
        ];
        let result = compare_across_files(&files, 0);

        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.present_in, vec![0, 1]);
        assert_eq!(record.key_value, "Beam-12");
        assert_eq!(record.aliases, vec!["Beam-1Z"]);
        assert_eq!(record.status, RecordStatus::Modified);
        assert!(record.cell("Mark").expect("Mark cell").changed);
        assert!(!record.cell("Qty").expect("Qty cell").changed);
    }

    #[test]
    fn fuzzy_rescue_can_be_disabled() {
        let files = vec![
            table(&["Mark"], &[&["Beam-12"]]),
            table(&["Mark"], &[&["Beam-1Z"]]),
        ];
        let options = MatchOptions {
            fuzzy: false,
            ..MatchOptions::default()
        };
        let result = compare_across_files_with(&files, 0, &options);
        assert_eq!(result.summary.missing, 2);
    }

    #[test]
    fn exact_keys_are_case_and_space_insensitive() {
        let files = vec![
            table(&["Part", "Qty"], &[&["HEX  BOLT", "3"]]),
            table(&["part", "QTY"], &[&[" HEX BOLT ", "3 "]]),
        ];
        let result = compare_across_files(&files, 0);
        assert_eq!(result.headers, vec!["Part", "Qty"]);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].status, RecordStatus::Identical);
        assert_eq!(result.summary.match_score, 100);

        let exact = MatchOptions {
            value_comparison: ValueComparison::Exact,
            ..MatchOptions::default()
        };
        let result = compare_across_files_with(&files, 0, &exact);
        assert_eq!(result.records[0].status, RecordStatus::Modified);
    }

    #[test]
    fn whitespace_only_differences_are_not_changes_by_default() {
        let files = vec![
            table(&["Part", "Description"], &[&["HB-12", "Hex  bolt 1/2in"], &["W-12", "Flat washer"]]),
            table(&["Part", "Description"], &[&["HB-12", " Hex bolt 1/2in"], &["W-12", "flat washer"]]),
        ];

        let result = compare_across_files(&files, 0);
        let bolt = result.records.iter().find(|r| r.key_value == "HB-12").expect("bolt record");
        assert_eq!(bolt.status, RecordStatus::Identical);
        let washer = result.records.iter().find(|r| r.key_value == "W-12").expect("washer record");
        assert!(washer.cell("Description").expect("Description cell").changed);

        let exact = MatchOptions {
            value_comparison: ValueComparison::Exact,
            ..MatchOptions::default()
        };
        let result = compare_across_files_with(&files, 0, &exact);
        let bolt = result.records.iter().find(|r| r.key_value == "HB-12").expect("bolt record");
        assert_eq!(bolt.status, RecordStatus::Modified);
        assert_eq!(
            bolt.cell("Description").expect("Description cell").values,
            some(&["Hex  bolt 1/2in", " Hex bolt 1/2in"])
        );
    }

    #[test]
    fn first_duplicate_wins_and_empty_keys_are_skipped() {
        let files = vec![
            table(&["Item", "Qty"], &[&["Bolt", "1"], &["bolt", "9"], &["", "7"]]),
            table(&["Item", "Qty"], &[&["Bolt", "1"]]),
        ];
        let result = compare_across_files(&files, 0);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].status, RecordStatus::Identical);

        let codes = result.warnings.iter().map(|w| w.code).collect::<Vec<_>>();
        assert_eq!(codes, vec![WarningCode::DuplicateKey, WarningCode::EmptyKeyRowsSkipped]);
        assert_eq!(result.warnings[0].file, Some(0));
    }

    #[test]
    fn columns_missing_from_a_file_are_absent_not_changed() {
        let files = vec![
            table(&["Item", "Qty", "Finish"], &[&["Bolt", "1", "Galv"]]),
            table(&["Item", "Qty"], &[&["Bolt", "1"]]),
        ];
        let result = compare_across_files(&files, 0);
        let finish = result.records[0].cell("Finish").expect("Finish cell");
        assert_eq!(finish.values, vec![Some("Galv".to_string()), None]);
        assert!(!finish.changed);
        assert_eq!(result.records[0].status, RecordStatus::Identical);
    }

    #[test]
    fn clamps_key_column_and_sorts_by_status() {
        let files = vec![
            table(&["Item", "Qty"], &[&["Bolt", "1"], &["Nut", "2"], &["Pin", "3"]]),
            table(&["Item", "Qty"], &[&["Bolt", "1"], &["Nut", "2"], &["Pin", "4"]]),
        ];
        // Key on Qty via an out-of-range index.
        let result = compare_across_files(&files, 99);
        let statuses = result.records.iter().map(|r| r.status).collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![
                RecordStatus::Missing,
                RecordStatus::Missing,
                RecordStatus::Identical,
                RecordStatus::Identical
            ]
        );
        assert_eq!(result.summary.total_items, 4);
        assert_eq!(result.summary.match_score, 50);
    }

    #[test]
    fn no_tables_give_perfect_empty_summary() {
        let result = compare_across_files(&[Vec::new(), Vec::new()], 0);
        assert!(result.records.is_empty());
        assert_eq!(result.summary.match_score, 100);
        assert_eq!(result.summary.missing_per_file, vec![0, 0]);
    }

    #[test]
    fn presence_partitions_file_range() {
        let files = vec![
            table(&["Item"], &[&["Bolt"], &["Nut"]]),
            table(&["Item"], &[&["Nut"], &["Pin"]]),
            table(&["Item"], &[&["Pin"], &["Bolt"], &["Washer"]]),
        ];
        let result = compare_across_files(&files, 0);
        for record in &result.records {
            let mut all = record.present_in.clone();
            all.extend(&record.missing_from);
            all.sort_unstable();
            assert_eq!(all, vec![0, 1, 2]);
            assert_eq!(record.status == RecordStatus::Missing, !record.missing_from.is_empty());
        }
    }
}
