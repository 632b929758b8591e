#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that answers whether a mobile unit could walk to the opponent's edge.
//!
//! The search is a snapshot-time estimate: units move and die every frame, so
//! the answer only gates decisions and never commits to a path.

use std::collections::{HashSet, VecDeque};

use siege_core::CellCoord;

/// Breadth-first search from `start` toward any cell in `edge_cells`.
///
/// Neighbours are four-connected. A neighbour is traversable when `in_bounds`
/// accepts it and `is_occupied` rejects it; the start cell itself may be
/// occupied. Returns `true` as soon as the traversal steps onto an edge cell
/// and `false` once every reachable free cell has been visited.
pub fn has_path_to_edge<B, O>(
    start: CellCoord,
    edge_cells: &HashSet<CellCoord>,
    mut in_bounds: B,
    mut is_occupied: O,
) -> bool
where
    B: FnMut(CellCoord) -> bool,
    O: FnMut(CellCoord) -> bool,
{
    let mut frontier = VecDeque::from([start]);
    let mut seen = HashSet::from([start]);

    while let Some(cell) = frontier.pop_front() {
        for neighbor in cell.neighbors() {
            if !in_bounds(neighbor) || is_occupied(neighbor) {
                continue;
            }
            if edge_cells.contains(&neighbor) {
                return true;
            }
            if !seen.insert(neighbor) {
                continue;
            }
            frontier.push_back(neighbor);
        }
    }

    false
}
