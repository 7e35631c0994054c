use std::collections::BTreeMap;

use crate::model::PositionedFragment;

/// Fragments sharing one baseline band on a page, left to right.
#[derive(Debug, Clone)]
pub(crate) struct VisualRow<'a> {
    pub fragments: Vec<&'a PositionedFragment>,
}

impl VisualRow<'_> {
    /// Row text in reading order, single-spaced.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| fragment.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Buckets fragments by page, dropping blank text and non-finite positions.
pub(crate) fn split_pages(pages: &[Vec<PositionedFragment>]) -> BTreeMap<u32, Vec<&PositionedFragment>> {
    let mut by_page: BTreeMap<u32, Vec<&PositionedFragment>> = BTreeMap::new();
    for fragment in pages.iter().flatten() {
        if fragment.text.trim().is_empty() || !fragment.x.is_finite() || !fragment.y.is_finite() {
            continue;
        }
        by_page.entry(fragment.page).or_default().push(fragment);
    }
    by_page
}

/// Rebuilds reading order for one page: sort by `y` then `x`, and start a
/// new row whenever the vertical step exceeds `tolerance`.
pub(crate) fn group_rows<'a>(
    fragments: &[&'a PositionedFragment],
    tolerance: f32,
) -> Vec<VisualRow<'a>> {
    let mut sorted = fragments.to_vec();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<VisualRow<'a>> = Vec::new();
    let mut last_y: Option<f32> = None;
    for fragment in sorted {
        match (rows.last_mut(), last_y) {
            (Some(row), Some(y)) if (fragment.y - y).abs() <= tolerance => {
                row.fragments.push(fragment);
            }
            _ => rows.push(VisualRow {
                fragments: vec![fragment],
            }),
        }
        last_y = Some(fragment.y);
    }

    for row in &mut rows {
        row.fragments.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows
}
