//! Path predictor used to project where a mobile unit would walk.

use std::collections::VecDeque;

use siege_core::{CellCoord, Edge, ARENA_SIZE, HALF_ARENA};

/// Dense step-distance grid seeded from a set of exit cells.
///
/// The field covers the arena's bounding square and stores the reverse
/// breadth-first search results that drive path projection. Distances default
/// to `u16::MAX` for unreachable or blocked cells.
#[derive(Clone, Debug, Default)]
pub(crate) struct NavigationField {
    distances: Vec<u16>,
}

impl NavigationField {
    /// Rebuilds the distances using a reverse breadth-first search from `exits`.
    pub(crate) fn rebuild_with<F>(&mut self, exits: &[CellCoord], mut is_blocked: F)
    where
        F: FnMut(CellCoord) -> bool,
    {
        let cell_count = usize::try_from(ARENA_SIZE * ARENA_SIZE).unwrap_or(0);
        if self.distances.len() != cell_count {
            self.distances = vec![u16::MAX; cell_count];
        } else {
            self.distances.fill(u16::MAX);
        }

        let mut queue = VecDeque::new();

        for &exit in exits {
            if is_blocked(exit) {
                continue;
            }

            if let Some(index) = index(exit) {
                if self.distances[index] == 0 {
                    continue;
                }

                self.distances[index] = 0;
                queue.push_back(exit);
            }
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = index(cell) else {
                continue;
            };
            let current_distance = self.distances[current_index];

            if current_distance >= u16::MAX.saturating_sub(1) {
                continue;
            }

            let next_distance = current_distance + 1;

            for neighbor in cell.neighbors() {
                if is_blocked(neighbor) {
                    continue;
                }

                let Some(neighbor_index) = index(neighbor) else {
                    continue;
                };

                if self.distances[neighbor_index] <= next_distance {
                    continue;
                }

                self.distances[neighbor_index] = next_distance;
                queue.push_back(neighbor);
            }
        }
    }

    /// Distance captured for the provided cell, if it lies within the field.
    #[must_use]
    pub(crate) fn distance(&self, cell: CellCoord) -> Option<u16> {
        index(cell).and_then(|offset| self.distances.get(offset).copied())
    }

    /// Follows strictly decreasing distances from `start` down to an exit.
    ///
    /// Returns `None` when `start` cannot reach any exit.
    pub(crate) fn trace_from(&self, start: CellCoord) -> Option<Vec<CellCoord>> {
        let mut current = start;
        let mut current_distance = self.distance(current)?;

        if current_distance == u16::MAX {
            return None;
        }

        let mut path = vec![current];
        while current_distance > 0 {
            let mut next_cell = None;
            let mut best_distance = current_distance;

            for neighbor in current.neighbors() {
                let Some(distance) = self.distance(neighbor) else {
                    continue;
                };

                if distance >= best_distance {
                    continue;
                }

                best_distance = distance;
                next_cell = Some(neighbor);
            }

            current = next_cell?;
            current_distance = best_distance;
            path.push(current);
        }

        Some(path)
    }
}

/// Edge a unit standing on `start` walks toward, decided by its quadrant.
pub(crate) fn target_edge(start: CellCoord) -> Edge {
    let left = start.x() < HALF_ARENA;
    let bottom = start.y() < HALF_ARENA;
    match (left, bottom) {
        (true, true) => Edge::BottomLeft.opposite(),
        (false, true) => Edge::BottomRight.opposite(),
        (true, false) => Edge::TopLeft.opposite(),
        (false, false) => Edge::TopRight.opposite(),
    }
}

/// Picks the reachable cell that makes the most progress toward `edge`.
///
/// Used when the target edge is sealed off: the unit walks as deep as it can,
/// then as far toward the edge's side as it can.
pub(crate) fn deepest_reachable<F>(
    start: CellCoord,
    edge: Edge,
    mut is_blocked: F,
) -> CellCoord
where
    F: FnMut(CellCoord) -> bool,
{
    let mut seen = vec![false; usize::try_from(ARENA_SIZE * ARENA_SIZE).unwrap_or(0)];
    let mut queue = VecDeque::from([start]);
    if let Some(offset) = index(start) {
        seen[offset] = true;
    }

    let mut best = start;
    while let Some(cell) = queue.pop_front() {
        if progress(cell, edge) > progress(best, edge) {
            best = cell;
        }

        for neighbor in cell.neighbors() {
            if is_blocked(neighbor) {
                continue;
            }
            let Some(offset) = index(neighbor) else {
                continue;
            };
            if seen[offset] {
                continue;
            }
            seen[offset] = true;
            queue.push_back(neighbor);
        }
    }

    best
}

fn progress(cell: CellCoord, edge: Edge) -> (u32, u32) {
    let last = ARENA_SIZE - 1;
    match edge {
        Edge::TopRight => (cell.y(), cell.x()),
        Edge::TopLeft => (cell.y(), last - cell.x()),
        Edge::BottomLeft => (last - cell.y(), last - cell.x()),
        Edge::BottomRight => (last - cell.y(), cell.x()),
    }
}

fn index(cell: CellCoord) -> Option<usize> {
    if cell.x() >= ARENA_SIZE || cell.y() >= ARENA_SIZE {
        return None;
    }
    let width = usize::try_from(ARENA_SIZE).ok()?;
    let x = usize::try_from(cell.x()).ok()?;
    let y = usize::try_from(cell.y()).ok()?;
    y.checked_mul(width)?.checked_add(x)
}
