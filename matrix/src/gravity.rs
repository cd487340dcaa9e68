//! Two-phase gravity resolution: vertical collapse, then right compaction.

use bubble_burst_core::{BubbleId, GridCoord};

use crate::Grid;

/// Closes the vertical gaps a burst left behind, one bubble at a time.
///
/// For every touched column the loop finds the lowest empty row that still
/// has an occupied run above it, drops the nearest bubble above the gap into
/// it, and repeats. The iteration is deliberate: closing one gap can expose a
/// lower gap for a bubble further up, which a single bulk shift would miss.
/// A column is settled once its lowest empty row sits above its topmost
/// occupied row, or once it is entirely empty or full.
///
/// Returns only the bubbles whose row actually changed.
pub(crate) fn settle_columns(grid: &mut Grid, columns: &[u32]) -> Vec<BubbleId> {
    let mut moved = Vec::new();
    let row_count = grid.dims().rows();

    for &column in columns {
        loop {
            let occupied = grid.occupied_rows(column);
            if occupied.is_empty() || occupied.len() as u32 == row_count {
                break;
            }

            let bottom_empty = match lowest_empty_row(&occupied, row_count) {
                Some(row) => row,
                None => break,
            };
            let top_occupied = occupied[0];
            if bottom_empty < top_occupied {
                break;
            }

            // The nearest bubble above the gap; it exists because the topmost
            // occupied row lies above `bottom_empty`.
            let Some(&closest_row) = occupied.iter().rev().find(|&&row| row < bottom_empty) else {
                break;
            };
            let Some(bubble_id) = grid.bubble_at(GridCoord::new(closest_row, column)) else {
                break;
            };

            grid.relocate(bubble_id, GridCoord::new(bottom_empty, column));
            moved.push(bubble_id);
        }
    }

    moved
}

/// Packs every partially filled row against the right edge.
///
/// Bubbles are processed from the rightmost column leftward. For a bubble at
/// column `c`, the number of empty cells to its right is
/// `(column_count - 1 - c) - occupied_right`; a positive count moves the
/// bubble right by exactly that many columns. Left-to-right relative order is
/// preserved, and rows that are empty or full are skipped entirely.
///
/// Returns only the bubbles that moved.
pub(crate) fn pack_rows_right(grid: &mut Grid) -> Vec<BubbleId> {
    let mut moved = Vec::new();
    let row_count = grid.dims().rows();
    let column_count = grid.dims().columns();

    for row in 0..row_count {
        let occupied = grid.occupied_columns(row);
        if occupied.is_empty() || occupied.len() as u32 == column_count {
            continue;
        }

        for column in (0..column_count).rev() {
            let Some(bubble_id) = grid.bubble_at(GridCoord::new(row, column)) else {
                continue;
            };

            let occupied_right = grid
                .occupied_columns(row)
                .iter()
                .filter(|&&other| other > column)
                .count() as u32;
            let empty = (column_count - 1 - column) - occupied_right;
            if empty > 0 {
                grid.relocate(bubble_id, GridCoord::new(row, column + empty));
                moved.push(bubble_id);
            }
        }
    }

    moved
}

fn lowest_empty_row(occupied: &[u32], row_count: u32) -> Option<u32> {
    (0..row_count).rev().find(|row| !occupied.contains(row))
}
