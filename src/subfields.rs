use regex::Regex;

use crate::normalize::{collapse_whitespace, header_key};
use crate::options::SubfieldPattern;

/// Picks the free-text column: a header mentioning "description", else the
/// column with the longest average text.
pub(crate) fn description_column(headers: &[String], rows: &[Vec<String>]) -> Option<usize> {
    if let Some(index) = headers
        .iter()
        .position(|header| header.to_lowercase().contains("description"))
    {
        return Some(index);
    }
    if rows.is_empty() {
        return None;
    }

    (0..headers.len())
        .map(|column| {
            let total = rows
                .iter()
                .filter_map(|row| row.get(column))
                .map(|value| value.trim().chars().count())
                .sum::<usize>();
            (column, total as f32 / rows.len() as f32)
        })
        .filter(|(_, average)| *average > 0.0)
        .max_by(|(a_col, a), (b_col, b)| a.total_cmp(b).then(b_col.cmp(a_col)))
        .map(|(column, _)| column)
}

/// Tidies a description after sub-fields were cut out of it: empty pipe
/// segments go, whitespace collapses.
fn tidy_segments(value: &str) -> String {
    value
        .split('|')
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Moves `Label: value` sub-fields out of the description column into
/// columns of their own. A column is only added for a pattern that matches
/// at least one row; rows without a match get an empty cell.
///
/// When the table already has a column of that name, values fill its empty
/// cells instead. A value that disagrees with a filled cell stays in the
/// description.
pub(crate) fn extract_subfields(
    headers: &mut Vec<String>,
    rows: &mut [Vec<String>],
    patterns: &[SubfieldPattern],
) -> usize {
    let Some(column) = description_column(headers, rows) else {
        return 0;
    };

    let mut added = 0;
    for pattern in patterns {
        let Ok(regex) = Regex::new(&pattern.pattern()) else {
            tracing::debug!(column = %pattern.column, "skipping sub-field with invalid pattern");
            continue;
        };
        let wanted = header_key(&pattern.column);
        let existing = headers.iter().position(|header| header_key(header) == wanted);
        if existing == Some(column) {
            continue;
        }

        let values = rows
            .iter()
            .map(|row| {
                row.get(column)
                    .and_then(|text| regex.captures(text))
                    .and_then(|captures| captures.name("value"))
                    .map(|value| value.as_str().trim().to_string())
            })
            .collect::<Vec<_>>();
        if values.iter().all(Option::is_none) {
            continue;
        }

        let target = existing.unwrap_or_else(|| {
            headers.push(pattern.column.clone());
            added += 1;
            headers.len() - 1
        });
        for (row, value) in rows.iter_mut().zip(values) {
            if row.len() <= target {
                row.resize(target + 1, String::new());
            }
            let Some(value) = value else {
                continue;
            };
            let cell = &mut row[target];
            if cell.trim().is_empty() {
                *cell = value;
            } else if collapse_whitespace(cell) != collapse_whitespace(&value) {
                continue;
            }
            if let Some(description) = row.get_mut(column) {
                *description = tidy_segments(&regex.replace(description, ""));
            }
        }
    }

    added
}
