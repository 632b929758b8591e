//! Dense per-cell unit storage used by the arena.

use siege_core::{CellCoord, PlayerSide, UnitSnapshot, ARENA_SIZE};

/// Row-major grid of unit stacks covering the arena's bounding square.
///
/// Mobile units stack freely; callers uphold the one-structure-per-cell rule
/// before inserting stationary units.
#[derive(Clone, Debug)]
pub(crate) struct UnitGrid {
    cells: Vec<Vec<UnitSnapshot>>,
}

impl UnitGrid {
    /// Creates an empty grid.
    pub(crate) fn new() -> Self {
        let capacity = usize::try_from(ARENA_SIZE * ARENA_SIZE).unwrap_or(0);
        Self {
            cells: vec![Vec::new(); capacity],
        }
    }

    /// Units standing on the provided cell; empty when out of range.
    pub(crate) fn units_at(&self, cell: CellCoord) -> &[UnitSnapshot] {
        index(cell)
            .and_then(|index| self.cells.get(index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Appends a unit to the cell's stack, returning `false` when out of range.
    pub(crate) fn insert(&mut self, cell: CellCoord, unit: UnitSnapshot) -> bool {
        match index(cell).and_then(|index| self.cells.get_mut(index)) {
            Some(stack) => {
                stack.push(unit);
                true
            }
            None => false,
        }
    }

    /// Mutable access to the stationary unit standing on the cell, if any.
    pub(crate) fn structure_mut(&mut self, cell: CellCoord) -> Option<&mut UnitSnapshot> {
        index(cell)
            .and_then(|index| self.cells.get_mut(index))
            .and_then(|stack| stack.iter_mut().find(|unit| unit.kind.is_stationary()))
    }

    /// Stationary unit standing on the cell, if any.
    pub(crate) fn structure(&self, cell: CellCoord) -> Option<&UnitSnapshot> {
        self.units_at(cell)
            .iter()
            .find(|unit| unit.kind.is_stationary())
    }

    /// Iterates every occupied cell together with its unit stack.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellCoord, &[UnitSnapshot])> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, stack)| !stack.is_empty())
            .map(|(offset, stack)| (coord(offset), stack.as_slice()))
    }

    /// Counts the stationary units owned by `owner` that satisfy the filter.
    pub(crate) fn count_structures<F>(&self, owner: PlayerSide, mut filter: F) -> usize
    where
        F: FnMut(CellCoord, &UnitSnapshot) -> bool,
    {
        self.iter()
            .flat_map(|(cell, stack)| stack.iter().map(move |unit| (cell, unit)))
            .filter(|(_, unit)| unit.kind.is_stationary() && unit.owner == owner)
            .filter(|(cell, unit)| filter(*cell, *unit))
            .count()
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

fn coord(offset: usize) -> CellCoord {
    let width = ARENA_SIZE as usize;
    CellCoord::new((offset % width) as u32, (offset / width) as u32)
}
