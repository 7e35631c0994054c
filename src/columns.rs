use crate::model::PositionedFragment;

#[derive(Debug, Clone)]
struct Cluster {
    sum: f32,
    count: usize,
}

impl Cluster {
    fn centroid(&self) -> f32 {
        self.sum / self.count as f32
    }
}

/// Clusters the horizontal start positions of all fragments into column
/// boundaries, returned as ascending centroids.
///
/// Clusters supported by fewer than `min_support` positions are discarded;
/// if that leaves nothing, clusters of at least two are kept, and failing
/// that a single column sits at the leftmost position.
pub(crate) fn discover_columns(
    fragments: &[&PositionedFragment],
    tolerance: f32,
    min_support: usize,
) -> Vec<f32> {
    let mut positions = fragments
        .iter()
        .map(|fragment| fragment.x)
        .filter(|x| x.is_finite())
        .collect::<Vec<_>>();
    if positions.is_empty() {
        return Vec::new();
    }
    positions.sort_by(f32::total_cmp);

    let mut clusters: Vec<Cluster> = Vec::new();
    for x in &positions {
        match clusters.last_mut() {
            Some(cluster) if (x - cluster.centroid()).abs() <= tolerance => {
                cluster.sum += x;
                cluster.count += 1;
            }
            _ => clusters.push(Cluster { sum: *x, count: 1 }),
        }
    }

    let keep = |support: usize| {
        clusters
            .iter()
            .filter(|cluster| cluster.count >= support)
            .map(Cluster::centroid)
            .collect::<Vec<_>>()
    };

    let mut columns = keep(min_support);
    if columns.is_empty() {
        columns = keep(2);
    }
    if columns.is_empty() {
        columns.push(positions[0]);
    }
    columns
}

/// Index of the boundary closest to `x`.
pub(crate) fn nearest_column(columns: &[f32], x: f32) -> usize {
    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
        .map_or(0, |(index, _)| index)
}

/// Lays a left-to-right run of fragments out over the column boundaries.
/// Fragments sharing a column are joined with a single space.
pub(crate) fn assign_to_columns(fragments: &[&PositionedFragment], columns: &[f32]) -> Vec<String> {
    let mut cells = vec![String::new(); columns.len()];
    if columns.is_empty() {
        return cells;
    }

    for fragment in fragments {
        let text = fragment.text.trim();
        if text.is_empty() {
            continue;
        }
        let cell = &mut cells[nearest_column(columns, fragment.x)];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(text);
    }
    cells
}
