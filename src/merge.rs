use crate::model::LogicalTable;
use crate::normalize::pad_rows;

/// Concatenates every table of one file under the header set of the widest
/// table, padding shorter rows with empty strings.
#[must_use]
pub fn merge_tables(tables: &[LogicalTable]) -> (Vec<String>, Vec<Vec<String>>) {
    let Some(widest) = tables
        .iter()
        .reduce(|best, table| if table.width() > best.width() { table } else { best })
    else {
        return (Vec::new(), Vec::new());
    };

    let width = widest.width();
    let rows = tables
        .iter()
        .flat_map(|table| pad_rows(&table.rows, width))
        .collect::<Vec<_>>();

    (widest.headers.clone(), rows)
}
