//! Spawn-location scoring and the ordered offense rules.

use siege_arena::{query, Arena};
use siege_core::{CellCoord, PlayerSide, UnitKind};

use crate::Tuning;

/// Projected damage a mobile unit would take when spawned on `cell`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnEstimate {
    /// Summed damage along the projected path.
    pub damage: f32,
    /// Candidate spawn cell the estimate belongs to.
    pub cell: CellCoord,
}

/// Picks the candidate with the smallest damage reported by `damage_of`.
///
/// Ties keep the earliest candidate; an empty list yields `None`.
pub fn least_damage_by<D>(candidates: &[CellCoord], mut damage_of: D) -> Option<SpawnEstimate>
where
    D: FnMut(CellCoord) -> f32,
{
    let mut best: Option<SpawnEstimate> = None;
    for &cell in candidates {
        let damage = damage_of(cell);
        if best.map_or(true, |current| damage < current.damage) {
            best = Some(SpawnEstimate { damage, cell });
        }
    }
    best
}

/// Scores candidates against the arena's projected paths and opponent turrets.
///
/// Every path cell contributes the number of opponent structures able to hit
/// it times the base turret damage. Candidates outside the arena or under a
/// structure are skipped, since nothing can spawn there.
#[must_use]
pub fn least_damage(arena: &Arena, candidates: &[CellCoord]) -> Option<SpawnEstimate> {
    let open: Vec<CellCoord> = candidates
        .iter()
        .copied()
        .filter(|cell| query::in_bounds(*cell) && query::structure_at(arena, *cell).is_none())
        .collect();
    let turret_damage = query::stats(arena).get(UnitKind::Turret).damage;
    least_damage_by(&open, |start| {
        query::projected_path(arena, start)
            .into_iter()
            .map(|cell| query::attackers_of(arena, cell, PlayerSide::Ally).len() as f32)
            .sum::<f32>()
            * turret_damage
    })
}

/// Facts the offense rules are matched against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffenseSignals {
    /// Cheapest spawn candidate, when any candidate exists.
    pub estimate: Option<SpawnEstimate>,
    /// Opponent structures on row 14 between x 20 and 27.
    pub dense_front: usize,
    /// Number of opponent health entries recorded so far.
    pub history_len: usize,
    /// Whether the opponent's health has been flat over the stall window.
    pub stalled: bool,
}

/// Offense rules, matched in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OffenseRule {
    /// The cheapest lane is nearly undefended: open with scouts.
    ScoutOpening,
    /// The opponent walled its right flank: answer with demolishers.
    DenseFront,
    /// The opponent's health stopped moving: escalate with demolishers.
    StallEscalation,
}

/// Rule evaluation order.
pub const OFFENSE_RULES: [OffenseRule; 3] = [
    OffenseRule::ScoutOpening,
    OffenseRule::DenseFront,
    OffenseRule::StallEscalation,
];

impl OffenseRule {
    /// Reports whether the rule claims the turn's offense.
    #[must_use]
    pub fn matches(self, signals: &OffenseSignals, tuning: &Tuning) -> bool {
        match self {
            Self::ScoutOpening => signals
                .estimate
                .is_some_and(|estimate| estimate.damage < tuning.scout_opening_damage),
            Self::DenseFront => signals.dense_front >= tuning.dense_front_threshold,
            Self::StallEscalation => {
                signals.history_len >= tuning.stall_min_history && signals.stalled
            }
        }
    }
}

/// First rule whose predicate holds, if any.
#[must_use]
pub fn select_rule(signals: &OffenseSignals, tuning: &Tuning) -> Option<OffenseRule> {
    OFFENSE_RULES
        .into_iter()
        .find(|rule| rule.matches(signals, tuning))
}
