#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Local arena model for the siege controller.
//!
//! The arena mirrors one turn's snapshot: unit occupancy, both players'
//! balances and health. Systems mutate it exclusively through [`apply`], which
//! checks placement rules and affordability against the live balances, fulfils
//! as much of each request as it can, and records the accepted actions so the
//! adapter can submit them as one batch at the end of the turn.

mod ledger;
mod navigation;
mod units;

use siege_core::{
    CellCoord, Command, Edge, Event, PlayerSide, ResourceBalance, UnitKind, UnitSnapshot,
    UnitStatsTable,
};
use tracing::trace;

use crate::{ledger::ResourceLedger, navigation::NavigationField, units::UnitGrid};

const DEFAULT_HEALTH: f32 = 30.0;

/// Action accepted by the arena and queued for submission to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmittedAction {
    /// Place or deploy a unit of the provided kind.
    Place(UnitKind),
    /// Upgrade the structure on the cell.
    Upgrade,
    /// Remove the structure on the cell.
    Remove,
}

/// Accepted action together with the cell it targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Submission {
    /// What the engine is asked to do.
    pub action: SubmittedAction,
    /// Where the engine is asked to do it.
    pub cell: CellCoord,
}

/// Represents one turn's arena snapshot plus the actions accepted so far.
#[derive(Clone, Debug)]
pub struct Arena {
    turn: u32,
    stats: UnitStatsTable,
    units: UnitGrid,
    ledger: ResourceLedger,
    ally_health: f32,
    enemy_health: f32,
    build_stack: Vec<Submission>,
    deploy_stack: Vec<Submission>,
}

impl Arena {
    /// Creates an empty arena for the provided turn.
    #[must_use]
    pub fn new(turn: u32, stats: UnitStatsTable) -> Self {
        Self {
            turn,
            stats,
            units: UnitGrid::new(),
            ledger: ResourceLedger::default(),
            ally_health: DEFAULT_HEALTH,
            enemy_health: DEFAULT_HEALTH,
            build_stack: Vec::new(),
            deploy_stack: Vec::new(),
        }
    }

    /// Replaces the balance reported for `side`.
    pub fn set_balance(&mut self, side: PlayerSide, balance: ResourceBalance) {
        self.ledger.set_balance(side, balance);
    }

    /// Replaces the health reported for `side`.
    pub fn set_health(&mut self, side: PlayerSide, health: f32) {
        match side {
            PlayerSide::Ally => self.ally_health = health,
            PlayerSide::Enemy => self.enemy_health = health,
        }
    }

    /// Loads a unit from the snapshot without spending resources.
    ///
    /// Returns `false` when the cell is outside the arena or a second structure
    /// would share the cell.
    pub fn insert_unit(&mut self, cell: CellCoord, unit: UnitSnapshot) -> bool {
        if !query::in_bounds(cell) {
            return false;
        }
        if unit.kind.is_stationary() && self.units.structure(cell).is_some() {
            return false;
        }
        self.units.insert(cell, unit)
    }

    /// Flags the structure on `cell` as upgraded, as reported by the snapshot.
    pub fn mark_upgraded(&mut self, cell: CellCoord) -> bool {
        let Some(unit) = self.units.structure_mut(cell) else {
            return false;
        };
        let stats = self.stats.get(unit.kind);
        unit.upgraded = true;
        unit.max_health = stats.max_health(true);
        true
    }

    /// Flags the structure on `cell` as pending removal, as reported by the snapshot.
    pub fn mark_pending_removal(&mut self, cell: CellCoord) -> bool {
        let Some(unit) = self.units.structure_mut(cell) else {
            return false;
        };
        unit.pending_removal = true;
        true
    }

    fn spawn_cost(&self, kind: UnitKind) -> ResourceBalance {
        let stats = self.stats.get(kind);
        ResourceBalance::new(stats.cost_structure, stats.cost_mobile)
    }

    fn can_spawn(&self, kind: UnitKind, cell: CellCoord) -> bool {
        if !query::in_bounds(cell) {
            return false;
        }
        if !self.ledger.can_afford(PlayerSide::Ally, self.spawn_cost(kind)) {
            return false;
        }

        if kind.is_stationary() {
            cell.in_ally_half() && self.units.units_at(cell).is_empty()
        } else {
            is_ally_edge(cell) && self.units.structure(cell).is_none()
        }
    }

    fn spawn(&mut self, kind: UnitKind, cells: &[CellCoord], count: u32) -> u32 {
        let mut placed = 0;
        for &cell in cells {
            for _ in 0..count {
                if !self.can_spawn(kind, cell) {
                    break;
                }
                let cost = self.spawn_cost(kind);
                if !self.ledger.spend(PlayerSide::Ally, cost) {
                    break;
                }

                let health = self.stats.get(kind).start_health;
                let inserted = self.units.insert(
                    cell,
                    UnitSnapshot {
                        kind,
                        owner: PlayerSide::Ally,
                        health,
                        max_health: health,
                        upgraded: false,
                        pending_removal: false,
                    },
                );
                // `can_spawn` rejected out-of-bounds cells above.
                debug_assert!(inserted, "spawn cell {cell:?} left the grid");
                let submission = Submission {
                    action: SubmittedAction::Place(kind),
                    cell,
                };
                if kind.is_stationary() {
                    self.build_stack.push(submission);
                } else {
                    self.deploy_stack.push(submission);
                }
                placed += 1;
            }
        }
        placed
    }

    fn upgrade(&mut self, cells: &[CellCoord]) -> u32 {
        let mut upgraded = 0;
        for &cell in cells {
            if !cell.in_ally_half() {
                continue;
            }
            let Some(kind) = self
                .units
                .structure(cell)
                .filter(|unit| unit.owner == PlayerSide::Ally && !unit.upgraded)
                .map(|unit| unit.kind)
            else {
                continue;
            };

            let stats = *self.stats.get(kind);
            let cost = ResourceBalance::new(stats.upgrade_cost_structure, 0.0);
            if !self.ledger.spend(PlayerSide::Ally, cost) {
                continue;
            }

            if let Some(unit) = self.units.structure_mut(cell) {
                unit.upgraded = true;
                unit.health += stats.upgraded_health - stats.start_health;
                unit.max_health = stats.upgraded_health;
            }
            self.build_stack.push(Submission {
                action: SubmittedAction::Upgrade,
                cell,
            });
            upgraded += 1;
        }
        upgraded
    }

    fn remove(&mut self, cells: &[CellCoord]) -> u32 {
        let mut removed = 0;
        for &cell in cells {
            if !cell.in_ally_half() {
                continue;
            }
            let Some(unit) = self.units.structure_mut(cell) else {
                continue;
            };
            if unit.owner != PlayerSide::Ally || unit.pending_removal {
                continue;
            }

            unit.pending_removal = true;
            self.build_stack.push(Submission {
                action: SubmittedAction::Remove,
                cell,
            });
            removed += 1;
        }
        removed
    }
}

/// Applies the provided command to the arena, reporting how much was fulfilled.
///
/// Requests that are out of bounds, blocked or unaffordable are skipped
/// silently; the outcome event carries the fulfilled count.
pub fn apply(arena: &mut Arena, command: Command, out_events: &mut Vec<Event>) {
    let event = match command {
        Command::Spawn { kind, cells, count } => {
            let requested = u32::try_from(cells.len())
                .unwrap_or(u32::MAX)
                .saturating_mul(count);
            let placed = arena.spawn(kind, &cells, count);
            Event::Spawned {
                kind,
                requested,
                placed,
            }
        }
        Command::Upgrade { cells } => {
            let requested = u32::try_from(cells.len()).unwrap_or(u32::MAX);
            let upgraded = arena.upgrade(&cells);
            Event::Upgraded {
                requested,
                upgraded,
            }
        }
        Command::Remove { cells } => {
            let requested = u32::try_from(cells.len()).unwrap_or(u32::MAX);
            let removed = arena.remove(&cells);
            Event::Removed { requested, removed }
        }
    };

    trace!(?event, "command applied");
    out_events.push(event);
}

fn is_ally_edge(cell: CellCoord) -> bool {
    [Edge::BottomLeft, Edge::BottomRight]
        .into_iter()
        .any(|edge| query::is_on_edge(cell, edge))
}

/// Query functions that provide read-only access to the arena state.
pub mod query {
    use std::collections::HashSet;

    use super::{navigation, Arena, NavigationField, Submission};
    use siege_core::{
        CellCoord, Edge, PlayerSide, ResourceBalance, UnitKind, UnitSnapshot, UnitStatsTable,
        HALF_ARENA,
    };

    /// Turn number the snapshot belongs to.
    #[must_use]
    pub fn turn(arena: &Arena) -> u32 {
        arena.turn
    }

    /// Stats table used for costs, health and ranges.
    #[must_use]
    pub fn stats(arena: &Arena) -> &UnitStatsTable {
        &arena.stats
    }

    /// Live balance of `side`, reflecting spends accepted so far this turn.
    #[must_use]
    pub fn balance(arena: &Arena, side: PlayerSide) -> ResourceBalance {
        arena.ledger.balance(side)
    }

    /// Health reported for `side` by the snapshot.
    #[must_use]
    pub fn health(arena: &Arena, side: PlayerSide) -> f32 {
        match side {
            PlayerSide::Ally => arena.ally_health,
            PlayerSide::Enemy => arena.enemy_health,
        }
    }

    /// Reports whether the cell lies inside the diamond arena.
    #[must_use]
    pub fn in_bounds(cell: CellCoord) -> bool {
        let (x, y) = (cell.x(), cell.y());
        let row_size = if y < HALF_ARENA {
            y + 1
        } else if y < 2 * HALF_ARENA {
            2 * HALF_ARENA - y
        } else {
            return false;
        };
        let start_x = HALF_ARENA - row_size;
        let end_x = start_x + 2 * row_size - 1;
        (start_x..=end_x).contains(&x)
    }

    /// Enumerates the cells along the provided boundary edge.
    #[must_use]
    pub fn edge_cells(edge: Edge) -> Vec<CellCoord> {
        (0..HALF_ARENA)
            .map(|offset| edge_cell(edge, offset))
            .collect()
    }

    /// Reports whether the cell lies on the provided boundary edge.
    #[must_use]
    pub fn is_on_edge(cell: CellCoord, edge: Edge) -> bool {
        (0..HALF_ARENA).any(|offset| edge_cell(edge, offset) == cell)
    }

    /// Union of the edges the opponent of `side` defends, i.e. where `side` breaches.
    #[must_use]
    pub fn breach_edges(side: PlayerSide) -> HashSet<CellCoord> {
        Edge::ALL
            .into_iter()
            .filter(|edge| edge.owner() != side)
            .flat_map(edge_cells)
            .collect()
    }

    fn edge_cell(edge: Edge, offset: u32) -> CellCoord {
        let last = 2 * HALF_ARENA - 1;
        match edge {
            Edge::TopRight => CellCoord::new(HALF_ARENA + offset, last - offset),
            Edge::TopLeft => CellCoord::new(HALF_ARENA - 1 - offset, last - offset),
            Edge::BottomLeft => CellCoord::new(HALF_ARENA - 1 - offset, offset),
            Edge::BottomRight => CellCoord::new(HALF_ARENA + offset, offset),
        }
    }

    /// Units standing on the provided cell.
    #[must_use]
    pub fn units_at(arena: &Arena, cell: CellCoord) -> &[UnitSnapshot] {
        arena.units.units_at(cell)
    }

    /// Reports whether any unit of either player stands on the cell.
    #[must_use]
    pub fn is_occupied(arena: &Arena, cell: CellCoord) -> bool {
        !arena.units.units_at(cell).is_empty()
    }

    /// Stationary unit standing on the cell, if any.
    #[must_use]
    pub fn structure_at(arena: &Arena, cell: CellCoord) -> Option<&UnitSnapshot> {
        arena.units.structure(cell)
    }

    /// Counts structures owned by `owner` whose cell satisfies the filter.
    #[must_use]
    pub fn count_structures<F>(arena: &Arena, owner: PlayerSide, mut filter: F) -> usize
    where
        F: FnMut(CellCoord) -> bool,
    {
        arena
            .units
            .count_structures(owner, |cell, _| filter(cell))
    }

    /// Cells holding structures that can attack a `defender` unit standing on `cell`.
    #[must_use]
    pub fn attackers_of(arena: &Arena, cell: CellCoord, defender: PlayerSide) -> Vec<CellCoord> {
        let attacker = defender.opponent();
        arena
            .units
            .iter()
            .filter_map(|(position, stack)| {
                let unit = stack.iter().find(|unit| unit.kind.is_stationary())?;
                if unit.owner != attacker {
                    return None;
                }
                let stats = arena.stats.get(unit.kind);
                if stats.damage <= 0.0 {
                    return None;
                }
                (position.euclidean_distance(cell) <= stats.range(unit.upgraded))
                    .then_some(position)
            })
            .collect()
    }

    /// Predicts the path a mobile unit spawned on `start` would walk.
    ///
    /// The unit heads for the edge opposite its quadrant, moving through cells
    /// free of structures. When that edge is sealed off the path ends at the
    /// reachable cell closest to it. The path includes `start`; it is empty
    /// when `start` is out of bounds or holds a structure.
    #[must_use]
    pub fn projected_path(arena: &Arena, start: CellCoord) -> Vec<CellCoord> {
        if !in_bounds(start) || arena.units.structure(start).is_some() {
            return Vec::new();
        }

        let is_blocked =
            |cell: CellCoord| !in_bounds(cell) || arena.units.structure(cell).is_some();
        let edge = navigation::target_edge(start);
        let mut field = NavigationField::default();
        field.rebuild_with(&edge_cells(edge), is_blocked);
        if let Some(path) = field.trace_from(start) {
            return path;
        }

        let endpoint = navigation::deepest_reachable(start, edge, is_blocked);
        field.rebuild_with(&[endpoint], is_blocked);
        field.trace_from(start).unwrap_or_else(|| vec![start])
    }

    /// Structure, upgrade and removal actions accepted this turn, in order.
    #[must_use]
    pub fn build_stack(arena: &Arena) -> &[Submission] {
        &arena.build_stack
    }

    /// Mobile deployments accepted this turn, in order.
    #[must_use]
    pub fn deploy_stack(arena: &Arena) -> &[Submission] {
        &arena.deploy_stack
    }

    /// Mobile-point cost of deploying one unit of `kind`.
    #[must_use]
    pub fn mobile_cost(arena: &Arena, kind: UnitKind) -> f32 {
        arena.stats.get(kind).cost_mobile
    }
}
