const LINE_NUMBER_HEADERS: &[&str] = &["line", "line#", "lineno", "ln", "no", "#", "item#"];

fn is_integer(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.chars().all(|ch| ch.is_ascii_digit())
}

fn is_line_number_header(header: &str) -> bool {
    let compact = header
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '.')
        .collect::<String>()
        .to_lowercase();
    LINE_NUMBER_HEADERS.contains(&compact.as_str())
}

/// Finds the column holding sequential record numbers: a column titled like
/// a line number, otherwise the earliest column whose non-empty values are
/// at least `ratio` pure integers.
pub(crate) fn line_number_column(
    headers: &[String],
    rows: &[Vec<String>],
    ratio: f32,
) -> Option<usize> {
    if let Some(index) = headers.iter().position(|header| is_line_number_header(header)) {
        return Some(index);
    }

    (0..headers.len()).find(|&column| {
        let values = rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|value| !value.trim().is_empty())
            .collect::<Vec<_>>();
        if values.is_empty() {
            return false;
        }
        let integers = values.iter().filter(|value| is_integer(value)).count();
        integers as f32 / values.len() as f32 >= ratio
    })
}

/// Folds continuation rows into the record above them.
///
/// A row opens a new record when `number_column` holds an integer. Any
/// other row appends its non-empty cells to the previous record, pipe
/// separated, leaving the number column alone. Continuations with no
/// record above are kept as rows of their own.
pub(crate) fn merge_continuations(rows: Vec<Vec<String>>, number_column: usize) -> Vec<Vec<String>> {
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut open = false;

    for row in rows {
        let numbered = row.get(number_column).is_some_and(|value| is_integer(value));
        if numbered || !open {
            open |= numbered;
            records.push(row);
            continue;
        }

        let Some(previous) = records.last_mut() else {
            records.push(row);
            continue;
        };
        for (column, value) in row.into_iter().enumerate() {
            let value = value.trim();
            if column == number_column || value.is_empty() {
                continue;
            }
            if let Some(cell) = previous.get_mut(column) {
                if cell.is_empty() {
                    cell.push_str(value);
                } else {
                    cell.push_str(" | ");
                    cell.push_str(value);
                }
            }
        }
    }

    records
}
