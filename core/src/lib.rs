#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the siege controller.
//!
//! This crate defines the message surface that connects the protocol adapter,
//! the local arena model, and the pure decision systems. Systems express every
//! desired mutation as a [`Command`] (a placement intent), the arena executes
//! those commands via its `apply` entry point, and then reports how much of
//! each request it fulfilled through [`Event`] values. Nothing in this crate
//! performs I/O.

use serde::{Deserialize, Serialize};

/// Number of cells along each axis of the square bounding the diamond arena.
pub const ARENA_SIZE: u32 = 28;

/// First row that belongs to the opponent's half of the arena.
pub const HALF_ARENA: u32 = ARENA_SIZE / 2;

/// Identifies which player owns a unit or a resource balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerSide {
    /// The side this controller plays for.
    Ally,
    /// The opposing side.
    Enemy,
}

impl PlayerSide {
    /// Returns the opposing side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Ally => Self::Enemy,
            Self::Enemy => Self::Ally,
        }
    }
}

/// Location of a single arena cell expressed as `x` and `y` coordinates.
///
/// `y` grows from the ally's bottom corner toward the opponent's top corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Vertical coordinate of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Euclidean distance between two cell coordinates.
    #[must_use]
    pub fn euclidean_distance(self, other: CellCoord) -> f32 {
        let dx = self.x.abs_diff(other.x) as f32;
        let dy = self.y.abs_diff(other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Reports whether the cell lies in the ally half of the arena.
    #[must_use]
    pub const fn in_ally_half(&self) -> bool {
        self.y < HALF_ARENA
    }

    /// Four-connected neighbours inside the arena's bounding square.
    ///
    /// Neighbours are yielded up, down, right, left. Diamond bounds are the
    /// arena model's concern; callers filter with its bounds check.
    pub fn neighbors(self) -> impl Iterator<Item = CellCoord> {
        let mut candidates = [None; 4];
        let mut count = 0;

        if self.y + 1 < ARENA_SIZE {
            candidates[count] = Some(CellCoord::new(self.x, self.y + 1));
            count += 1;
        }

        if let Some(y) = self.y.checked_sub(1) {
            candidates[count] = Some(CellCoord::new(self.x, y));
            count += 1;
        }

        if self.x + 1 < ARENA_SIZE {
            candidates[count] = Some(CellCoord::new(self.x + 1, self.y));
            count += 1;
        }

        if let Some(x) = self.x.checked_sub(1) {
            candidates[count] = Some(CellCoord::new(x, self.y));
            count += 1;
        }

        candidates.into_iter().take(count).flatten()
    }
}

/// Every unit type that can appear on the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Cheap blocking structure.
    Wall,
    /// Structure that shields friendly mobile units passing nearby.
    Support,
    /// Structure that attacks opposing mobile units in range.
    Turret,
    /// Fast, fragile mobile unit.
    Scout,
    /// Slow mobile unit with long range against structures.
    Demolisher,
    /// Mobile unit that hunts opposing mobile units.
    Interceptor,
}

impl UnitKind {
    /// All unit kinds in engine index order.
    pub const ALL: [UnitKind; 6] = [
        Self::Wall,
        Self::Support,
        Self::Turret,
        Self::Scout,
        Self::Demolisher,
        Self::Interceptor,
    ];

    /// Reports whether the unit occupies a cell until destroyed or removed.
    #[must_use]
    pub const fn is_stationary(self) -> bool {
        matches!(self, Self::Wall | Self::Support | Self::Turret)
    }

    /// Position of the kind in the engine's unit tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Wall => 0,
            Self::Support => 1,
            Self::Turret => 2,
            Self::Scout => 3,
            Self::Demolisher => 4,
            Self::Interceptor => 5,
        }
    }

    /// Resolves a unit kind from its position in the engine's unit tables.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Wall),
            1 => Some(Self::Support),
            2 => Some(Self::Turret),
            3 => Some(Self::Scout),
            4 => Some(Self::Demolisher),
            5 => Some(Self::Interceptor),
            _ => None,
        }
    }

    /// Two-letter shorthand the engine uses on the wire.
    #[must_use]
    pub const fn shorthand(self) -> &'static str {
        match self {
            Self::Wall => "FF",
            Self::Support => "EF",
            Self::Turret => "DF",
            Self::Scout => "PI",
            Self::Demolisher => "EI",
            Self::Interceptor => "SI",
        }
    }
}

/// Combat and economy parameters for a single unit kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Structure points spent to place the unit.
    pub cost_structure: f32,
    /// Mobile points spent to deploy the unit.
    pub cost_mobile: f32,
    /// Health the unit starts with.
    pub start_health: f32,
    /// Structure points spent to upgrade the unit, if it can be upgraded.
    pub upgrade_cost_structure: f32,
    /// Maximum health after an upgrade.
    pub upgraded_health: f32,
    /// Euclidean attack range in cells.
    pub attack_range: f32,
    /// Euclidean attack range after an upgrade.
    pub upgraded_attack_range: f32,
    /// Damage dealt to mobile units per attack.
    pub damage: f32,
}

impl UnitStats {
    /// Maximum health for the unit given its upgrade state.
    #[must_use]
    pub fn max_health(&self, upgraded: bool) -> f32 {
        if upgraded {
            self.upgraded_health
        } else {
            self.start_health
        }
    }

    /// Attack range for the unit given its upgrade state.
    #[must_use]
    pub fn range(&self, upgraded: bool) -> f32 {
        if upgraded {
            self.upgraded_attack_range
        } else {
            self.attack_range
        }
    }
}

/// Stats for every unit kind, indexed by [`UnitKind::index`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStatsTable {
    entries: [UnitStats; 6],
}

impl UnitStatsTable {
    /// Returns the stats registered for the provided kind.
    #[must_use]
    pub fn get(&self, kind: UnitKind) -> &UnitStats {
        &self.entries[kind.index()]
    }

    /// Replaces the stats registered for the provided kind.
    pub fn set(&mut self, kind: UnitKind, stats: UnitStats) {
        self.entries[kind.index()] = stats;
    }
}

impl Default for UnitStatsTable {
    fn default() -> Self {
        let structure = |cost, health, upgrade_cost, upgraded_health| UnitStats {
            cost_structure: cost,
            cost_mobile: 0.0,
            start_health: health,
            upgrade_cost_structure: upgrade_cost,
            upgraded_health,
            attack_range: 0.0,
            upgraded_attack_range: 0.0,
            damage: 0.0,
        };
        let mobile = |cost, health, range, damage| UnitStats {
            cost_structure: 0.0,
            cost_mobile: cost,
            start_health: health,
            upgrade_cost_structure: 0.0,
            upgraded_health: health,
            attack_range: range,
            upgraded_attack_range: range,
            damage,
        };

        Self {
            entries: [
                structure(1.0, 60.0, 1.0, 120.0),
                structure(4.0, 30.0, 4.0, 30.0),
                UnitStats {
                    attack_range: 2.5,
                    upgraded_attack_range: 3.5,
                    damage: 5.0,
                    ..structure(2.0, 75.0, 4.0, 75.0)
                },
                mobile(1.0, 15.0, 3.5, 2.0),
                mobile(3.0, 5.0, 4.5, 8.0),
                mobile(1.0, 40.0, 4.5, 20.0),
            ],
        }
    }
}

/// Structure and mobile point balances held by a single player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceBalance {
    /// Points spent on stationary placement and upgrades.
    pub structure: f32,
    /// Points spent on mobile deployment.
    pub mobile: f32,
}

impl ResourceBalance {
    /// Creates a balance from explicit pool values.
    #[must_use]
    pub const fn new(structure: f32, mobile: f32) -> Self {
        Self { structure, mobile }
    }
}

/// Read-only descriptor of a unit standing on the arena.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Type of the unit.
    pub kind: UnitKind,
    /// Player that placed the unit.
    pub owner: PlayerSide,
    /// Remaining health.
    pub health: f32,
    /// Health the unit would have at full strength.
    pub max_health: f32,
    /// Indicates whether the unit has been upgraded.
    pub upgraded: bool,
    /// Indicates that a removal was requested and is pending.
    pub pending_removal: bool,
}

/// The four boundary edges of the diamond arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    /// Opponent edge running from the top corner toward the right corner.
    TopRight,
    /// Opponent edge running from the top corner toward the left corner.
    TopLeft,
    /// Ally edge running from the bottom corner toward the left corner.
    BottomLeft,
    /// Ally edge running from the bottom corner toward the right corner.
    BottomRight,
}

impl Edge {
    /// All four edges in engine order.
    pub const ALL: [Edge; 4] = [
        Self::TopRight,
        Self::TopLeft,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// Edge a mobile unit spawned on `self` walks toward.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::TopRight => Self::BottomLeft,
            Self::TopLeft => Self::BottomRight,
            Self::BottomLeft => Self::TopRight,
            Self::BottomRight => Self::TopLeft,
        }
    }

    /// Player whose mobile units spawn from this edge.
    #[must_use]
    pub const fn owner(self) -> PlayerSide {
        match self {
            Self::TopRight | Self::TopLeft => PlayerSide::Enemy,
            Self::BottomLeft | Self::BottomRight => PlayerSide::Ally,
        }
    }
}

/// Placement intents that express every mutation the controller may request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Requests `count` units of `kind` at each of the provided cells.
    Spawn {
        /// Type of unit to place or deploy.
        kind: UnitKind,
        /// Cells targeted by the request, processed in order.
        cells: Vec<CellCoord>,
        /// Units requested per cell; stationary kinds only ever place one.
        count: u32,
    },
    /// Requests an upgrade of the ally structures standing on the cells.
    Upgrade {
        /// Cells targeted by the request, processed in order.
        cells: Vec<CellCoord>,
    },
    /// Requests removal of the ally structures standing on the cells.
    Remove {
        /// Cells targeted by the request, processed in order.
        cells: Vec<CellCoord>,
    },
}

impl Command {
    /// Builds a single-unit spawn request for each provided cell.
    #[must_use]
    pub fn spawn(kind: UnitKind, cells: &[CellCoord]) -> Self {
        Self::spawn_many(kind, cells, 1)
    }

    /// Builds a spawn request asking for `count` units per cell.
    #[must_use]
    pub fn spawn_many(kind: UnitKind, cells: &[CellCoord], count: u32) -> Self {
        Self::Spawn {
            kind,
            cells: cells.to_vec(),
            count,
        }
    }

    /// Builds an upgrade request for the provided cells.
    #[must_use]
    pub fn upgrade(cells: &[CellCoord]) -> Self {
        Self::Upgrade {
            cells: cells.to_vec(),
        }
    }

    /// Builds a removal request for the provided cells.
    #[must_use]
    pub fn remove(cells: &[CellCoord]) -> Self {
        Self::Remove {
            cells: cells.to_vec(),
        }
    }
}

/// Outcomes reported by the arena after processing commands or frames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Reports how many units of a spawn request were actually placed.
    Spawned {
        /// Type of unit that was requested.
        kind: UnitKind,
        /// Total units requested across all cells.
        requested: u32,
        /// Units the arena accepted.
        placed: u32,
    },
    /// Reports how many structures of an upgrade request were upgraded.
    Upgraded {
        /// Cells named by the request.
        requested: u32,
        /// Structures the arena upgraded.
        upgraded: u32,
    },
    /// Reports how many structures of a removal request were marked.
    Removed {
        /// Cells named by the request.
        requested: u32,
        /// Structures the arena marked for removal.
        removed: u32,
    },
    /// Announces that a mobile unit reached a player's edge.
    Breach {
        /// Cell where the breach happened.
        cell: CellCoord,
        /// Player whose edge was breached.
        breached: PlayerSide,
    },
}

impl Event {
    /// Number of operations the arena fulfilled for a mutation outcome.
    #[must_use]
    pub const fn fulfilled(&self) -> u32 {
        match self {
            Self::Spawned { placed, .. } => *placed,
            Self::Upgraded { upgraded, .. } => *upgraded,
            Self::Removed { removed, .. } => *removed,
            Self::Breach { .. } => 0,
        }
    }
}
