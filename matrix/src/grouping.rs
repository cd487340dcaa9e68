//! Connected bubble-group discovery over the matrix grid.

use std::collections::HashSet;

use bubble_burst_core::{BubbleId, GridCoord, GridDims};

use crate::Grid;

/// Discovers the maximal group of same-kind, 4-adjacent bubbles reachable
/// from `origin`.
///
/// The fill is iterative: an explicit work stack carries the frontier and a
/// visited set keyed on bubble identity guarantees each bubble is examined at
/// most once, so deep groups cannot exhaust the call stack. The origin seeds
/// the result, which makes the membership guarantee structural: whenever
/// `origin` names a placed bubble, it is the first member of its own group. A
/// lone bubble with no same-kind neighbor yields a group of size one.
///
/// Returns the empty vector iff `origin` is `None`.
pub(crate) fn find_group(grid: &Grid, origin: Option<BubbleId>) -> Vec<BubbleId> {
    let Some(origin_id) = origin else {
        return Vec::new();
    };
    let Some(origin_bubble) = grid.bubble(origin_id) else {
        return Vec::new();
    };
    let Some(origin_cell) = origin_bubble.location() else {
        return Vec::new();
    };
    let kind = origin_bubble.kind();

    let mut members = vec![origin_id];
    let mut visited: HashSet<BubbleId> = HashSet::new();
    let _ = visited.insert(origin_id);

    let mut frontier = vec![origin_cell];
    while let Some(cell) = frontier.pop() {
        for neighbor_cell in neighbors(cell, grid.dims()) {
            let Some(neighbor_id) = grid.bubble_at(neighbor_cell) else {
                continue;
            };
            if visited.contains(&neighbor_id) {
                continue;
            }
            let Some(neighbor) = grid.bubble(neighbor_id) else {
                continue;
            };
            if neighbor.kind() != kind {
                continue;
            }
            let _ = visited.insert(neighbor_id);
            members.push(neighbor_id);
            frontier.push(neighbor_cell);
        }
    }

    members
}

fn neighbors(cell: GridCoord, dims: GridDims) -> impl Iterator<Item = GridCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = cell.row().checked_sub(1) {
        candidates[count] = Some(GridCoord::new(row, cell.column()));
        count += 1;
    }

    if cell.row() + 1 < dims.rows() {
        candidates[count] = Some(GridCoord::new(cell.row() + 1, cell.column()));
        count += 1;
    }

    if let Some(column) = cell.column().checked_sub(1) {
        candidates[count] = Some(GridCoord::new(cell.row(), column));
        count += 1;
    }

    if cell.column() + 1 < dims.columns() {
        candidates[count] = Some(GridCoord::new(cell.row(), cell.column() + 1));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}
