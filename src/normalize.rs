use std::collections::HashSet;

/// Trims and collapses every run of whitespace to a single space.
pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case/whitespace-insensitive identity of a header name.
pub(crate) fn header_key(header: &str) -> String {
    collapse_whitespace(header).to_lowercase()
}

/// Matching identity of a key value. Same rule as headers: trimmed,
/// lower-cased, internal whitespace collapsed.
#[must_use]
pub fn normalize_key(value: &str) -> String {
    header_key(value)
}

/// Union of all header sets in first-seen order, de-duplicated
/// case/whitespace-insensitively. The first spelling seen wins.
#[must_use]
pub fn unify_headers(header_sets: &[Vec<String>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unified = Vec::new();
    for header in header_sets.iter().flatten() {
        if seen.insert(header_key(header)) {
            unified.push(header.clone());
        }
    }
    unified
}

/// Maps each unified column to the first original column with the same
/// header identity, or `None` when the original table lacks it.
pub(crate) fn column_mapping(original: &[String], unified: &[String]) -> Vec<Option<usize>> {
    let original_keys = original.iter().map(|h| header_key(h)).collect::<Vec<_>>();
    unified
        .iter()
        .map(|header| {
            let key = header_key(header);
            original_keys.iter().position(|candidate| *candidate == key)
        })
        .collect()
}

/// Re-projects rows from their original header layout onto the unified
/// layout. Unmapped unified columns are filled with empty strings.
#[must_use]
pub fn normalize_rows(
    rows: &[Vec<String>],
    original_headers: &[String],
    unified_headers: &[String],
) -> Vec<Vec<String>> {
    let mapping = column_mapping(original_headers, unified_headers);
    rows.iter()
        .map(|row| {
            mapping
                .iter()
                .map(|source| {
                    source
                        .and_then(|index| row.get(index))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

/// Pads or truncates every row to exactly `width` cells.
pub(crate) fn pad_rows(rows: &[Vec<String>], width: usize) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut out = row.clone();
            out.resize(width, String::new());
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{collapse_whitespace, normalize_key, normalize_rows, pad_rows, unify_headers};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(collapse_whitespace("  W8x10 \t  Beam \n"), "W8x10 Beam");
        assert_eq!(normalize_key("  BEAM-12   A "), "beam-12 a");
    }

    #[test]
    fn unifies_headers_in_first_seen_order() {
        let unified = unify_headers(&[
            strings(&["Item", "Qty"]),
            strings(&["item", "Unit  Price", "QTY"]),
            strings(&["Unit Price", "Total"]),
        ]);
        assert_eq!(unified, strings(&["Item", "Qty", "Unit  Price", "Total"]));
    }

    #[test]
    fn unify_is_idempotent_on_its_own_output() {
        let once = unify_headers(&[strings(&["A", "b", "B ", "c"]), strings(&["C", "d"])]);
        let twice = unify_headers(&[once.clone()]);
        assert_eq!(once, twice);
    }

    #[test]
    fn normalizes_rows_onto_unified_layout() {
        let rows = vec![strings(&["5", "Bolt"])];
        let normalized = normalize_rows(
            &rows,
            &strings(&["Qty", "Item"]),
            &strings(&["item", "Price", "qty"]),
        );
        assert_eq!(normalized, vec![strings(&["Bolt", "", "5"])]);
    }

    #[test]
    fn normalize_tolerates_short_rows() {
        let rows = vec![strings(&["Bolt"])];
        let normalized = normalize_rows(&rows, &strings(&["Item", "Qty"]), &strings(&["Qty", "Item"]));
        assert_eq!(normalized, vec![strings(&["", "Bolt"])]);
    }

    #[test]
    fn pads_ragged_rows() {
        let rows = vec![strings(&["a"]), strings(&["b", "c", "d"])];
        let padded = pad_rows(&rows, 2);
        assert_eq!(padded[0], strings(&["a", ""]));
        assert_eq!(padded[1], strings(&["b", "c"]));
    }
}
