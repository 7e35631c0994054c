use crate::columns::{assign_to_columns, discover_columns};
use crate::header::{HeaderProfile, KeywordSet, find_header_row, header_titles};
use crate::model::{LogicalTable, PositionedFragment, Reconstruction};
use crate::options::ReconstructOptions;
use crate::records::{line_number_column, merge_continuations};
use crate::rows::{VisualRow, group_rows, split_pages};
use crate::subfields::extract_subfields;
use crate::warning::{ReconcileWarning, WarningCode};

/// A data row candidate together with where it sat on its page.
struct CandidateRow {
    page: u32,
    index_in_page: usize,
    text: String,
    cells: Vec<String>,
}

fn section_label(options: &ReconstructOptions, first_page: u32, last_page: u32) -> String {
    if let Some(section) = &options.section {
        return section.clone();
    }
    if first_page == last_page {
        format!("Page {first_page}")
    } else {
        format!("Pages {first_page}-{last_page}")
    }
}

fn row_top(row: &VisualRow<'_>) -> f32 {
    row.fragments
        .iter()
        .map(|fragment| fragment.y)
        .fold(f32::INFINITY, f32::min)
}

/// Up to `limit` rows stacked directly above `header_index`, top to bottom,
/// each no further than `leading` from the row below it.
fn wrapped_title_rows<'a>(
    rows: &[VisualRow<'a>],
    header_index: usize,
    limit: usize,
    leading: f32,
) -> Vec<VisualRow<'a>> {
    let mut wrapped = Vec::new();
    let mut below = row_top(&rows[header_index]);
    for row in rows[..header_index].iter().rev().take(limit) {
        let top = row_top(row);
        if below - top > leading {
            break;
        }
        wrapped.push(row.clone());
        below = top;
    }
    wrapped.reverse();
    wrapped
}

/// Drops columns that carry neither a title nor any data and names the
/// untitled survivors `Column N`.
fn prune_columns(titles: Vec<String>, rows: &mut [CandidateRow]) -> Vec<String> {
    let keep = titles
        .iter()
        .enumerate()
        .map(|(column, title)| {
            !title.is_empty()
                || rows
                    .iter()
                    .any(|row| row.cells.get(column).is_some_and(|cell| !cell.is_empty()))
        })
        .collect::<Vec<_>>();

    for row in rows.iter_mut() {
        let cells = std::mem::take(&mut row.cells);
        row.cells = cells
            .into_iter()
            .zip(&keep)
            .filter_map(|(cell, keep)| keep.then_some(cell))
            .collect();
    }

    titles
        .into_iter()
        .zip(&keep)
        .filter_map(|(title, keep)| keep.then_some(title))
        .enumerate()
        .map(|(index, title)| {
            if title.is_empty() {
                format!("Column {}", index + 1)
            } else {
                title
            }
        })
        .collect()
}

/// Reconstructs one logical table from the positioned text of a document
/// using the default thresholds.
#[must_use]
pub fn reconstruct_table(pages: &[Vec<PositionedFragment>]) -> LogicalTable {
    reconstruct_table_with(pages, &ReconstructOptions::default()).table
}

/// Reconstructs one logical table from the positioned text of a document.
///
/// Never fails: empty input yields a table with a single `Content` column,
/// and every other degraded path is reported as a warning.
#[must_use]
pub fn reconstruct_table_with(
    pages: &[Vec<PositionedFragment>],
    options: &ReconstructOptions,
) -> Reconstruction {
    let mut warnings = Vec::new();
    let by_page = split_pages(pages);

    let (Some(&first_page), Some(&last_page)) = (by_page.keys().next(), by_page.keys().next_back())
    else {
        warnings.push(ReconcileWarning::new(
            WarningCode::NoFragments,
            "no positioned text to reconstruct",
        ));
        return Reconstruction {
            table: LogicalTable::empty(section_label(options, 1, 1)),
            warnings,
        };
    };
    let section = section_label(options, first_page, last_page);

    let all_fragments = by_page.values().flatten().copied().collect::<Vec<_>>();
    let columns = discover_columns(
        &all_fragments,
        options.column_tolerance,
        options.min_column_support,
    );
    if columns.is_empty() {
        warnings.push(ReconcileWarning::new(
            WarningCode::NoColumns,
            "no column boundaries could be derived",
        ));
        return Reconstruction {
            table: LogicalTable::empty(section),
            warnings,
        };
    }
    tracing::debug!(columns = columns.len(), pages = by_page.len(), "column boundaries discovered");

    let page_rows = by_page
        .iter()
        .map(|(page, fragments)| (*page, group_rows(fragments, options.row_tolerance)))
        .collect::<Vec<_>>();

    let keywords = KeywordSet::new(&options.header_keywords);
    let first_rows = &page_rows[0].1;
    let header_index = find_header_row(
        first_rows,
        &keywords,
        options.header_scan_rows,
        options.min_header_score,
    )
    .unwrap_or_else(|| {
        warnings.push(
            ReconcileWarning::new(
                WarningCode::HeaderNotDetected,
                "no row looked like a table header; using the first row",
            )
            .with_page(first_page),
        );
        0
    });
    let header_row = &first_rows[header_index];
    let wrapped = wrapped_title_rows(
        first_rows,
        header_index,
        options.wrapped_header_rows,
        options.wrapped_header_leading,
    );
    let titles = header_titles(header_row, &wrapped, &columns, options.header_gap);
    tracing::debug!(header_index, ?titles, "header row identified");

    let band = wrapped.iter().map(VisualRow::text).collect::<Vec<_>>();
    let profile = HeaderProfile::new(
        &header_row.text(),
        &band,
        options.repeated_header_overlap,
        &keywords,
        options.banner_max_chars,
    );

    let mut repeated = 0_usize;
    let mut candidates = Vec::new();
    for (page, rows) in &page_rows {
        let skip = if *page == first_page { header_index + 1 } else { 0 };
        for (index_in_page, row) in rows.iter().enumerate().skip(skip) {
            let text = row.text();
            if profile.is_repeated_header(&text) {
                repeated += 1;
                continue;
            }
            candidates.push(CandidateRow {
                page: *page,
                index_in_page,
                cells: assign_to_columns(&row.fragments, &columns),
                text,
            });
        }
    }
    if repeated > 0 {
        warnings.push(
            ReconcileWarning::new(
                WarningCode::RepeatedHeaderDropped,
                "repeated header bands were dropped",
            )
            .with_count(repeated),
        );
    }

    let headers = prune_columns(titles, &mut candidates);
    if headers.is_empty() {
        return Reconstruction {
            table: LogicalTable::empty(section),
            warnings,
        };
    }

    let probe = candidates
        .iter()
        .map(|row| row.cells.clone())
        .collect::<Vec<_>>();
    let number_column = line_number_column(&headers, &probe, options.line_number_ratio);

    let mut banners = 0_usize;
    let mut data_started_on = first_page;
    let mut rows = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let numbered = number_column
            .and_then(|column| candidate.cells.get(column))
            .is_some_and(|value| {
                let value = value.trim();
                !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
            });
        if numbered {
            data_started_on = candidate.page;
        }
        if candidate.page != data_started_on
            && candidate.index_in_page < options.banner_scan_rows
            && profile.is_banner(&candidate.text)
        {
            tracing::debug!(page = candidate.page, text = %candidate.text, "dropping page banner");
            banners += 1;
            continue;
        }
        rows.push(candidate.cells);
    }
    if banners > 0 {
        warnings.push(
            ReconcileWarning::new(WarningCode::BannerDropped, "page banners were dropped")
                .with_count(banners),
        );
    }

    let mut rows = match number_column {
        Some(column) => {
            let before = rows.len();
            let merged = merge_continuations(rows, column);
            tracing::debug!(before, after = merged.len(), "continuation rows merged");
            merged
        }
        None => {
            warnings.push(ReconcileWarning::new(
                WarningCode::NoLineNumberColumn,
                "no line-number column found; continuation rows were not merged",
            ));
            rows
        }
    };

    let mut headers = headers;
    extract_subfields(&mut headers, &mut rows, &options.subfields);

    Reconstruction {
        table: LogicalTable::new(section, headers, rows),
        warnings,
    }
}
