#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn controller that turns one arena snapshot into an ordered intent batch.
//!
//! The controller runs a fixed sequence of stages: emergency check, bait
//! maintenance, the defensive layout with surplus spending, the reachability
//! gate, the interceptor safety valve, the opening rush, rule-based offense and
//! the fallback scout wave. Every intent is appended to the caller's command
//! buffer and applied to the arena immediately, so later stages see the spends
//! of earlier ones. Any stage may end the turn early.

mod bait;
mod blueprint;
mod offense;
mod tuning;

pub use bait::{plan_bait, BaitPattern, BAIT_PATTERNS};
pub use blueprint::{
    BlueprintStep, LayoutAction, SurplusStep, DEFENSE_BLUEPRINT, REACTIVE_CELLS, SURPLUS_PLAN,
};
pub use offense::{
    least_damage, least_damage_by, select_rule, OffenseRule, OffenseSignals, SpawnEstimate,
    OFFENSE_RULES,
};
pub use tuning::Tuning;

use siege_arena::{apply, query, Arena};
use siege_core::{CellCoord, Command, Event, PlayerSide, UnitKind, HALF_ARENA};
use siege_system_reachability::has_path_to_edge;
use siege_system_tracker::Tracker;
use tracing::{debug, info};

/// Cells scored by the least-damage estimate, in tie-breaking order.
pub const SPAWN_CANDIDATES: [CellCoord; 3] = [
    CellCoord::new(5, 8),
    CellCoord::new(4, 9),
    CellCoord::new(14, 0),
];

/// Cell the reachability gate searches from.
pub const GATE_START: CellCoord = CellCoord::new(14, 13);

const SIDE_LANE: CellCoord = CellCoord::new(5, 8);
const MAIN_LANE: CellCoord = CellCoord::new(4, 9);
const FRONT_INTERCEPTOR: CellCoord = CellCoord::new(16, 2);
const REAR_INTERCEPTOR: CellCoord = CellCoord::new(17, 3);
const EMERGENCY_SUPPORT: CellCoord = CellCoord::new(15, 4);

const FLOOD: u32 = 1000;
const OPENING_SCOUTS: u32 = 4;
const VANGUARD_SCOUTS: u32 = 5;
const FALLBACK_SCOUTS: u32 = 10;
const STALL_DEMOLISHERS: u32 = 100;

const EMERGENCY_ROWS: std::ops::RangeInclusive<u32> = HALF_ARENA..=HALF_ARENA + 3;
const DENSE_FRONT_COLUMNS: std::ops::RangeInclusive<u32> = 20..=27;

/// How a turn's decision sequence ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The opponent's front was thin; the emergency batch was sent.
    Emergency,
    /// An opening turn; the scout rush ended the sequence.
    OpeningRush,
    /// The front is dense but mobile points are short; offense waits.
    HoldingForDemolishers,
    /// The opponent stalled; the demolisher escalation ended the sequence.
    StallEscalation,
    /// Every stage ran through to the fallback offense.
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    EndTurn,
}

struct TurnContext<'a> {
    arena: &'a mut Arena,
    out: &'a mut Vec<Command>,
    events: Vec<Event>,
}

impl TurnContext<'_> {
    fn issue(&mut self, command: Command) {
        self.out.push(command.clone());
        apply(self.arena, command, &mut self.events);
    }

    fn spawn(&mut self, kind: UnitKind, cell: CellCoord, count: u32) {
        self.issue(Command::spawn_many(kind, &[cell], count));
    }

    fn turn(&self) -> u32 {
        query::turn(self.arena)
    }

    fn structure_points(&self) -> f32 {
        query::balance(self.arena, PlayerSide::Ally).structure
    }

    fn mobile_points(&self) -> f32 {
        query::balance(self.arena, PlayerSide::Ally).mobile
    }

    fn opponent_mobile_points(&self) -> f32 {
        query::balance(self.arena, PlayerSide::Enemy).mobile
    }

    /// True when the live balance covers `units` deployments of `kind` plus `extra`.
    fn affords_mobile(&self, kind: UnitKind, units: f32, extra: f32) -> bool {
        self.mobile_points() >= units * query::mobile_cost(self.arena, kind) + extra
    }
}

/// Decides the intents for one turn.
#[derive(Clone, Debug, Default)]
pub struct TurnController {
    tuning: Tuning,
}

impl TurnController {
    /// Creates a controller using the provided thresholds.
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        Self { tuning }
    }

    /// Runs the decision sequence against `arena`, appending intents to `out`.
    ///
    /// Intents are applied to `arena` as they are issued, so its build and
    /// deploy stacks hold the accepted actions afterwards. `tracker` is read
    /// as of the end of the previous turn, except for the opponent's mobile
    /// high-water mark which the driver refreshes before calling.
    pub fn handle(
        &self,
        arena: &mut Arena,
        tracker: &Tracker,
        out: &mut Vec<Command>,
    ) -> TurnOutcome {
        let first = out.len();
        let mut ctx = TurnContext {
            arena,
            out,
            events: Vec::new(),
        };
        let outcome = self.decide(&mut ctx, tracker);

        info!(
            turn = ctx.turn(),
            ?outcome,
            intents = ctx.out.len() - first,
            fulfilled = ctx.events.iter().map(Event::fulfilled).sum::<u32>(),
            built = query::build_stack(ctx.arena).len(),
            deployed = query::deploy_stack(ctx.arena).len(),
            structure_left = ctx.structure_points(),
            mobile_left = ctx.mobile_points(),
            "turn decided"
        );
        outcome
    }

    fn decide(&self, ctx: &mut TurnContext<'_>, tracker: &Tracker) -> TurnOutcome {
        let turn = ctx.turn();

        if self.emergency_defense(ctx) == Flow::EndTurn {
            return TurnOutcome::Emergency;
        }

        if turn >= self.tuning.bait_min_turn {
            for command in plan_bait(ctx.arena) {
                debug!(?command, "bait maintained");
                ctx.issue(command);
            }
        }

        self.reactive_defense(ctx);
        static_defense(ctx);
        self.spend_surplus(ctx);

        let reachable = is_reachable(ctx.arena);
        let tolerance = self.interceptor_tolerance(ctx, tracker);
        debug!(reachable, tolerance, "reachability gate evaluated");

        if reachable && ctx.opponent_mobile_points() >= tolerance {
            debug!("safety valve interceptor deployed");
            ctx.spawn(UnitKind::Interceptor, REAR_INTERCEPTOR, 1);
        }

        if turn <= self.tuning.opening_last_turn {
            if reachable {
                ctx.spawn(UnitKind::Scout, SIDE_LANE, OPENING_SCOUTS);
                ctx.spawn(UnitKind::Scout, MAIN_LANE, FLOOD);
            }
            return TurnOutcome::OpeningRush;
        }

        let signals = OffenseSignals {
            estimate: least_damage(ctx.arena, &SPAWN_CANDIDATES),
            dense_front: dense_front(ctx.arena),
            history_len: tracker.history().len(),
            stalled: tracker.is_stalled(self.tuning.stall_window),
        };
        if let Some(rule) = select_rule(&signals, &self.tuning) {
            debug!(?rule, ?signals, "offense rule selected");
            if let Some(outcome) =
                self.run_rule(rule, ctx, tracker, &signals, reachable, tolerance)
            {
                return outcome;
            }
        }

        self.fallback_offense(ctx);
        TurnOutcome::Completed
    }

    fn emergency_defense(&self, ctx: &mut TurnContext<'_>) -> Flow {
        if ctx.turn() < self.tuning.emergency_min_turn {
            return Flow::Continue;
        }
        let front = query::count_structures(ctx.arena, PlayerSide::Enemy, |cell| {
            EMERGENCY_ROWS.contains(&cell.y())
        });
        if front > self.tuning.emergency_front_threshold {
            return Flow::Continue;
        }

        debug!(front, "opponent front is thin");
        ctx.spawn(UnitKind::Support, EMERGENCY_SUPPORT, 1);
        ctx.spawn(UnitKind::Interceptor, FRONT_INTERCEPTOR, 1);
        ctx.spawn(UnitKind::Scout, MAIN_LANE, FLOOD);
        Flow::EndTurn
    }

    fn reactive_defense(&self, ctx: &mut TurnContext<'_>) {
        ctx.issue(Command::spawn(UnitKind::Wall, REACTIVE_CELLS));
        if ctx.turn() > self.tuning.reactive_upgrade_after_turn {
            ctx.issue(Command::upgrade(REACTIVE_CELLS));
        }

        let worn: Vec<CellCoord> = REACTIVE_CELLS
            .iter()
            .copied()
            .filter(|cell| {
                query::structure_at(ctx.arena, *cell).is_some_and(|unit| {
                    unit.owner == PlayerSide::Ally
                        && unit.health <= self.tuning.damaged_health_ratio * unit.max_health
                })
            })
            .collect();
        if !worn.is_empty() {
            debug!(?worn, "recycling worn structures");
            ctx.issue(Command::remove(&worn));
        }
    }

    fn spend_surplus(&self, ctx: &mut TurnContext<'_>) {
        for step in SURPLUS_PLAN {
            for &cell in step.cells {
                if ctx.structure_points() < self.tuning.surplus_floor {
                    break;
                }
                ctx.issue(step.command_for(cell));
            }
        }
    }

    fn interceptor_tolerance(&self, ctx: &TurnContext<'_>, tracker: &Tracker) -> f32 {
        let tolerance = self.tuning.interceptor_tolerance;
        let own_health = query::health(ctx.arena, PlayerSide::Ally);
        if tracker.took_damage_this_turn(own_health) {
            tolerance.min(tracker.high_water_mark() - self.tuning.high_water_margin)
        } else {
            tolerance
        }
    }

    fn run_rule(
        &self,
        rule: OffenseRule,
        ctx: &mut TurnContext<'_>,
        tracker: &Tracker,
        signals: &OffenseSignals,
        reachable: bool,
        tolerance: f32,
    ) -> Option<TurnOutcome> {
        let line = self.tuning.demolisher_line as f32;
        match rule {
            OffenseRule::ScoutOpening => {
                let reserve = self.tuning.scout_wave_reserve;
                if let Some(best) = signals.estimate {
                    if reachable && ctx.affords_mobile(UnitKind::Scout, reserve, 0.0) {
                        ctx.spawn(UnitKind::Scout, best.cell, VANGUARD_SCOUTS);
                        ctx.spawn(UnitKind::Scout, MAIN_LANE, FLOOD);
                    }
                }
                None
            }
            OffenseRule::DenseFront => {
                if !ctx.affords_mobile(UnitKind::Demolisher, line, 1.0) {
                    return Some(TurnOutcome::HoldingForDemolishers);
                }
                if reachable {
                    ctx.spawn(UnitKind::Interceptor, FRONT_INTERCEPTOR, 1);
                } else {
                    ctx.spawn(UnitKind::Demolisher, MAIN_LANE, self.tuning.demolisher_line);
                    ctx.spawn(UnitKind::Scout, MAIN_LANE, FLOOD);
                }
                None
            }
            OffenseRule::StallEscalation => {
                if ctx.affords_mobile(UnitKind::Demolisher, line, 1.0) {
                    if reachable {
                        ctx.spawn(UnitKind::Interceptor, FRONT_INTERCEPTOR, 1);
                    }
                    ctx.spawn(UnitKind::Demolisher, MAIN_LANE, STALL_DEMOLISHERS);
                }

                let deep_stall = tracker.history().len() >= self.tuning.deep_stall_min_history
                    && tracker.is_stalled(self.tuning.deep_stall_window);
                if deep_stall && reachable && ctx.opponent_mobile_points() >= tolerance {
                    ctx.spawn(UnitKind::Interceptor, REAR_INTERCEPTOR, 1);
                }
                Some(TurnOutcome::StallEscalation)
            }
        }
    }

    fn fallback_offense(&self, ctx: &mut TurnContext<'_>) {
        if ctx.affords_mobile(UnitKind::Scout, self.tuning.scout_wave_reserve, 0.0) {
            ctx.spawn(UnitKind::Scout, SIDE_LANE, FALLBACK_SCOUTS);
            ctx.spawn(UnitKind::Scout, MAIN_LANE, FLOOD);
        }
    }
}

fn static_defense(ctx: &mut TurnContext<'_>) {
    let turn = ctx.turn();
    for step in DEFENSE_BLUEPRINT.iter().filter(|step| step.active_on(turn)) {
        ctx.issue(step.command());
    }
}

/// Reports whether a unit on [`GATE_START`] could walk to the opponent's edges.
#[must_use]
pub fn is_reachable(arena: &Arena) -> bool {
    let edges = query::breach_edges(PlayerSide::Ally);
    has_path_to_edge(GATE_START, &edges, query::in_bounds, |cell| {
        query::is_occupied(arena, cell)
    })
}

/// Opponent structures on the first opponent row, right of x 19.
#[must_use]
pub fn dense_front(arena: &Arena) -> usize {
    query::count_structures(arena, PlayerSide::Enemy, |cell| {
        cell.y() == HALF_ARENA && DENSE_FRONT_COLUMNS.contains(&cell.x())
    })
}
