//! Bait walls that lure opponent units toward the defended corners.

use siege_arena::{query, Arena};
use siege_core::{CellCoord, Command, UnitKind};

/// Watched opponent cells and the own walls that answer them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaitPattern {
    /// Opponent cell whose occupancy decides between building and removing.
    pub watch: CellCoord,
    /// Opponent cells that must all be empty before the bait is built.
    pub opening: [CellCoord; 5],
    /// Own cells holding the bait walls.
    pub bait: [CellCoord; 2],
}

/// Left and right bait patterns, mirrored across the arena's vertical axis.
pub const BAIT_PATTERNS: [BaitPattern; 2] = [
    BaitPattern {
        watch: CellCoord::new(1, 15),
        opening: [
            CellCoord::new(1, 14),
            CellCoord::new(2, 15),
            CellCoord::new(2, 16),
            CellCoord::new(3, 16),
            CellCoord::new(3, 17),
        ],
        bait: [CellCoord::new(2, 12), CellCoord::new(3, 12)],
    },
    BaitPattern {
        watch: CellCoord::new(26, 15),
        opening: [
            CellCoord::new(26, 14),
            CellCoord::new(25, 15),
            CellCoord::new(25, 16),
            CellCoord::new(24, 16),
            CellCoord::new(24, 17),
        ],
        bait: [CellCoord::new(24, 12), CellCoord::new(25, 12)],
    },
];

impl BaitPattern {
    /// Intent the pattern asks for given the current occupancy, if any.
    #[must_use]
    pub fn plan(&self, arena: &Arena) -> Option<Command> {
        if query::is_occupied(arena, self.watch) {
            return Some(Command::remove(&self.bait));
        }
        let open = self
            .opening
            .iter()
            .all(|cell| !query::is_occupied(arena, *cell));
        open.then(|| Command::spawn(UnitKind::Wall, &self.bait))
    }
}

/// Bait intents for every pattern, left first.
///
/// The result depends only on opponent-half occupancy, so it is stable for an
/// unchanged snapshot.
#[must_use]
pub fn plan_bait(arena: &Arena) -> Vec<Command> {
    BAIT_PATTERNS
        .iter()
        .filter_map(|pattern| pattern.plan(arena))
        .collect()
}
