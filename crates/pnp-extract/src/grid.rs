//! Row clustering and grid inference for card placements

use crate::pdf::Placement;

/// Group placements into rows: a placement joins the current row while its
/// top edge is within `tolerance` points of the row's first placement.
fn cluster_rows(placements: &[Placement], tolerance: f64) -> Vec<Vec<&Placement>> {
    let mut sorted: Vec<&Placement> = placements.iter().collect();
    sorted.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<&Placement>> = Vec::new();
    let mut anchor = f64::NEG_INFINITY;
    for placement in sorted {
        match rows.last_mut() {
            Some(row) if placement.y - anchor <= tolerance => row.push(placement),
            _ => {
                anchor = placement.y;
                rows.push(vec![placement]);
            }
        }
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    rows
}

/// Reading order: rows top to bottom, left to right within a row.
/// The index into the result is a card's logical cell.
pub fn order_placements(placements: Vec<Placement>, tolerance: f64) -> Vec<Placement> {
    cluster_rows(&placements, tolerance)
        .into_iter()
        .flatten()
        .cloned()
        .collect()
}

/// Infer `(columns, rows)`: the longest row and the number of rows
pub fn detect_grid_size(placements: &[Placement], tolerance: f64) -> (usize, usize) {
    let rows = cluster_rows(placements, tolerance);
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    (cols, rows.len())
}
