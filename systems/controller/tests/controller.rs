use siege_arena::{query, Arena, SubmittedAction};
use siege_core::{
    CellCoord, Command, PlayerSide, ResourceBalance, UnitKind, UnitSnapshot, UnitStatsTable,
};
use siege_system_controller::{
    least_damage, plan_bait, TurnController, TurnOutcome, Tuning, BAIT_PATTERNS,
    DEFENSE_BLUEPRINT, REACTIVE_CELLS, SPAWN_CANDIDATES, SURPLUS_PLAN,
};
use siege_system_tracker::Tracker;

fn structure(kind: UnitKind, owner: PlayerSide) -> UnitSnapshot {
    let health = UnitStatsTable::default().get(kind).start_health;
    UnitSnapshot {
        kind,
        owner,
        health,
        max_health: health,
        upgraded: false,
        pending_removal: false,
    }
}

fn arena(turn: u32, structure_points: f32, mobile_points: f32, opponent_mobile: f32) -> Arena {
    let mut arena = Arena::new(turn, UnitStatsTable::default());
    arena.set_balance(
        PlayerSide::Ally,
        ResourceBalance::new(structure_points, mobile_points),
    );
    arena.set_balance(PlayerSide::Enemy, ResourceBalance::new(0.0, opponent_mobile));
    arena
}

fn place_enemy(arena: &mut Arena, kind: UnitKind, cells: impl IntoIterator<Item = CellCoord>) {
    for cell in cells {
        assert!(arena.insert_unit(cell, structure(kind, PlayerSide::Enemy)));
    }
}

/// Enemy structures far enough back to keep the front from counting as thin.
fn sparse_back_line(arena: &mut Arena) {
    place_enemy(
        arena,
        UnitKind::Wall,
        [10, 11, 16, 17].map(|x| CellCoord::new(x, 17)),
    );
}

/// Enemy turrets sealing the opponent half, optionally leaving one column of row 15 open.
fn turret_screen(arena: &mut Arena, gap: Option<u32>) {
    let row = (1..=26)
        .filter(|x| Some(*x) != gap)
        .map(|x| CellCoord::new(x, 15));
    let corners = [CellCoord::new(0, 14), CellCoord::new(27, 14)];
    place_enemy(arena, UnitKind::Turret, row.chain(corners));
}

/// Opponent health that dropped twice, then stayed at 22 for `flat_turns` turns.
fn stalled_for(flat_turns: usize) -> Tracker {
    let mut tracker = Tracker::default();
    for health in [28.0, 26.0] {
        tracker.record_turn(health, 30.0, 0.0);
    }
    for _ in 0..flat_turns {
        tracker.record_turn(22.0, 30.0, 0.0);
    }
    tracker
}

fn stalled_tracker() -> Tracker {
    stalled_for(8)
}

fn deployed(arena: &Arena, kind: UnitKind) -> usize {
    query::deploy_stack(arena)
        .iter()
        .filter(|submission| submission.action == SubmittedAction::Place(kind))
        .count()
}

fn spawns_of(out: &[Command], kind: UnitKind) -> Vec<&Command> {
    out.iter()
        .filter(|command| matches!(command, Command::Spawn { kind: k, .. } if *k == kind))
        .collect()
}

#[test]
fn thin_front_sends_the_emergency_batch() {
    let mut arena = arena(2, 10.0, 5.0, 0.0);
    place_enemy(
        &mut arena,
        UnitKind::Wall,
        [
            CellCoord::new(10, 14),
            CellCoord::new(11, 15),
            CellCoord::new(12, 17),
        ],
    );
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert_eq!(outcome, TurnOutcome::Emergency);
    assert_eq!(
        out,
        vec![
            Command::spawn(UnitKind::Support, &[CellCoord::new(15, 4)]),
            Command::spawn(UnitKind::Interceptor, &[CellCoord::new(16, 2)]),
            Command::spawn_many(UnitKind::Scout, &[CellCoord::new(4, 9)], 1000),
        ]
    );
    assert_eq!(deployed(&arena, UnitKind::Interceptor), 1);
    assert_eq!(deployed(&arena, UnitKind::Scout), 4);
}

#[test]
fn emergency_gate_can_be_lowered_to_the_first_turn() {
    let tuning = Tuning {
        emergency_min_turn: 0,
        ..Tuning::default()
    };
    let mut arena = arena(0, 10.0, 5.0, 0.0);
    place_enemy(
        &mut arena,
        UnitKind::Wall,
        [
            CellCoord::new(10, 14),
            CellCoord::new(11, 15),
            CellCoord::new(12, 17),
        ],
    );
    let mut out = Vec::new();

    let outcome = TurnController::new(tuning).handle(&mut arena, &Tracker::default(), &mut out);

    assert_eq!(outcome, TurnOutcome::Emergency);
    assert_eq!(out.len(), 3);
    assert_eq!(
        out[2],
        Command::spawn_many(UnitKind::Scout, &[CellCoord::new(4, 9)], 1000)
    );
    assert!(query::structure_at(&arena, CellCoord::new(15, 4))
        .is_some_and(|unit| unit.kind == UnitKind::Support));
    assert_eq!(deployed(&arena, UnitKind::Interceptor), 1);
    assert_eq!(deployed(&arena, UnitKind::Scout), 4);
}

#[test]
fn four_front_structures_skip_the_emergency() {
    let mut arena = arena(2, 0.0, 0.0, 0.0);
    sparse_back_line(&mut arena);
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert_ne!(outcome, TurnOutcome::Emergency);
    assert!(!out.contains(&Command::spawn(UnitKind::Support, &[CellCoord::new(15, 4)])));
}

#[test]
fn opening_turn_rushes_with_scouts() {
    let mut arena = arena(0, 40.0, 5.0, 0.0);
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert_eq!(outcome, TurnOutcome::OpeningRush);
    assert_eq!(
        &out[out.len() - 2..],
        &[
            Command::spawn_many(UnitKind::Scout, &[CellCoord::new(5, 8)], 4),
            Command::spawn_many(UnitKind::Scout, &[CellCoord::new(4, 9)], 1000),
        ]
    );
    assert_eq!(deployed(&arena, UnitKind::Scout), 5);
    assert!(query::structure_at(&arena, CellCoord::new(0, 13)).is_some());
}

#[test]
fn sealed_opening_turn_keeps_the_scouts_home() {
    let mut arena = arena(1, 0.0, 5.0, 0.0);
    place_enemy(&mut arena, UnitKind::Wall, (0..28).map(|x| CellCoord::new(x, 14)));
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert_eq!(outcome, TurnOutcome::OpeningRush);
    assert!(spawns_of(&out, UnitKind::Scout).is_empty());
}

#[test]
fn stall_with_open_path_sends_interceptor_and_demolishers() {
    let mut arena = arena(10, 0.0, 30.0, 0.0);
    turret_screen(&mut arena, Some(13));
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &stalled_tracker(), &mut out);

    assert_eq!(outcome, TurnOutcome::StallEscalation);
    assert!(out.contains(&Command::spawn(
        UnitKind::Interceptor,
        &[CellCoord::new(16, 2)]
    )));
    assert!(out.contains(&Command::spawn_many(
        UnitKind::Demolisher,
        &[CellCoord::new(4, 9)],
        100
    )));
    assert_eq!(deployed(&arena, UnitKind::Interceptor), 1);
    assert_eq!(deployed(&arena, UnitKind::Demolisher), 9);
    assert!(spawns_of(&out, UnitKind::Scout).is_empty());
}

#[test]
fn deep_stall_adds_a_rear_interceptor() {
    let rear = Command::spawn(UnitKind::Interceptor, &[CellCoord::new(17, 3)]);
    for (flat_turns, rear_requests) in [(8, 1), (18, 2)] {
        let tracker = stalled_for(flat_turns);
        let mut arena = arena(10, 0.0, 30.0, 16.0);
        turret_screen(&mut arena, Some(13));
        let mut out = Vec::new();

        let outcome = TurnController::default().handle(&mut arena, &tracker, &mut out);

        assert_eq!(outcome, TurnOutcome::StallEscalation);
        let requests = out.iter().filter(|command| **command == rear).count();
        assert_eq!(requests, rear_requests, "history of {}", tracker.history().len());
        assert_eq!(deployed(&arena, UnitKind::Interceptor), 1 + rear_requests);
        assert_eq!(deployed(&arena, UnitKind::Demolisher), 9);
    }
}

#[test]
fn stall_with_sealed_path_sends_only_demolishers() {
    let mut arena = arena(10, 0.0, 30.0, 0.0);
    turret_screen(&mut arena, None);
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &stalled_tracker(), &mut out);

    assert_eq!(outcome, TurnOutcome::StallEscalation);
    assert!(spawns_of(&out, UnitKind::Interceptor).is_empty());
    assert_eq!(deployed(&arena, UnitKind::Demolisher), 10);
}

#[test]
fn stall_without_mobile_points_still_ends_the_turn() {
    let mut arena = arena(10, 0.0, 21.0, 0.0);
    turret_screen(&mut arena, Some(13));
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &stalled_tracker(), &mut out);

    assert_eq!(outcome, TurnOutcome::StallEscalation);
    assert!(spawns_of(&out, UnitKind::Demolisher).is_empty());
    assert!(spawns_of(&out, UnitKind::Scout).is_empty());
}

#[test]
fn dense_front_with_open_path_sends_an_interceptor_then_falls_back() {
    let mut arena = arena(5, 0.0, 30.0, 0.0);
    place_enemy(&mut arena, UnitKind::Wall, (20..=26).map(|x| CellCoord::new(x, 14)));
    turret_screen(&mut arena, Some(13));
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert!(out.contains(&Command::spawn(
        UnitKind::Interceptor,
        &[CellCoord::new(16, 2)]
    )));
    assert!(out.contains(&Command::spawn_many(
        UnitKind::Scout,
        &[CellCoord::new(5, 8)],
        10
    )));
    assert_eq!(deployed(&arena, UnitKind::Scout), 29);
}

#[test]
fn dense_front_without_enough_points_holds_the_offense() {
    let mut arena = arena(5, 0.0, 20.0, 0.0);
    place_enemy(&mut arena, UnitKind::Wall, (20..=26).map(|x| CellCoord::new(x, 14)));
    turret_screen(&mut arena, Some(13));
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert_eq!(outcome, TurnOutcome::HoldingForDemolishers);
    assert!(query::deploy_stack(&arena).is_empty());
}

#[test]
fn clean_lane_without_a_path_falls_back_to_the_scout_wave() {
    let mut arena = arena(5, 0.0, 16.0, 0.0);
    place_enemy(&mut arena, UnitKind::Wall, (0..28).map(|x| CellCoord::new(x, 14)));
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(
        spawns_of(&out, UnitKind::Scout),
        vec![
            &Command::spawn_many(UnitKind::Scout, &[CellCoord::new(5, 8)], 10),
            &Command::spawn_many(UnitKind::Scout, &[CellCoord::new(4, 9)], 1000),
        ]
    );
}

#[test]
fn clean_lane_with_a_path_sends_the_vanguard_to_the_best_cell() {
    let mut arena = arena(5, 0.0, 16.0, 0.0);
    sparse_back_line(&mut arena);
    let mut out = Vec::new();

    let outcome = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(
        spawns_of(&out, UnitKind::Scout),
        vec![
            &Command::spawn_many(UnitKind::Scout, &[CellCoord::new(5, 8)], 5),
            &Command::spawn_many(UnitKind::Scout, &[CellCoord::new(4, 9)], 1000),
        ]
    );
    assert_eq!(deployed(&arena, UnitKind::Scout), 16);
}

#[test]
fn taking_damage_tightens_the_interceptor_tolerance() {
    let rear = Command::spawn(UnitKind::Interceptor, &[CellCoord::new(17, 3)]);
    let mut tracker = Tracker::default();
    tracker.observe_opponent_mobile(6.0);

    let mut calm = arena(5, 0.0, 1.0, 6.0);
    sparse_back_line(&mut calm);
    let mut out = Vec::new();
    let _ = TurnController::default().handle(&mut calm, &tracker, &mut out);
    assert!(!out.contains(&rear));

    let mut hit = arena(5, 0.0, 1.0, 6.0);
    sparse_back_line(&mut hit);
    hit.set_health(PlayerSide::Ally, 25.0);
    let mut out = Vec::new();
    let _ = TurnController::default().handle(&mut hit, &tracker, &mut out);
    assert!(out.contains(&rear));
    assert_eq!(deployed(&hit, UnitKind::Interceptor), 1);
}

#[test]
fn worn_reactive_walls_are_recycled() {
    let mut arena = arena(5, 0.0, 0.0, 0.0);
    sparse_back_line(&mut arena);
    let corner = CellCoord::new(0, 13);
    assert!(arena.insert_unit(
        corner,
        UnitSnapshot {
            health: 30.0,
            ..structure(UnitKind::Wall, PlayerSide::Ally)
        }
    ));
    let mut out = Vec::new();

    let _ = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert!(out.contains(&Command::remove(&[corner])));
    assert!(query::build_stack(&arena).iter().any(|submission| {
        submission.action == SubmittedAction::Remove && submission.cell == corner
    }));
}

#[test]
fn reactive_walls_are_upgraded_only_after_turn_five() {
    let upgrade = Command::upgrade(REACTIVE_CELLS);
    for (turn, expected) in [(5, false), (6, true)] {
        let mut arena = arena(turn, 100.0, 0.0, 0.0);
        sparse_back_line(&mut arena);
        let mut out = Vec::new();

        let _ = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

        assert_eq!(out.contains(&upgrade), expected, "turn {turn}");
        if expected {
            for cell in REACTIVE_CELLS {
                assert!(query::structure_at(&arena, *cell).is_some_and(|unit| unit.upgraded));
            }
        }
    }
}

#[test]
fn surplus_fills_the_support_rows_when_points_allow() {
    let mut arena = arena(7, 1000.0, 0.0, 0.0);
    sparse_back_line(&mut arena);
    let mut out = Vec::new();

    let _ = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    for step in SURPLUS_PLAN {
        for cell in step.cells {
            let unit = query::structure_at(&arena, *cell).expect("surplus cell built");
            assert!(unit.upgraded, "{cell:?} should be upgraded");
        }
    }
    assert!(query::structure_at(&arena, CellCoord::new(19, 10))
        .is_some_and(|unit| unit.kind == UnitKind::Turret && unit.upgraded));
}

#[test]
fn surplus_is_skipped_below_the_floor() {
    let mut arena = arena(7, 10.0, 0.0, 0.0);
    sparse_back_line(&mut arena);
    let mut out = Vec::new();

    let _ = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);

    assert!(!out.contains(&SURPLUS_PLAN[0].command_for(CellCoord::new(9, 7))));
}

#[test]
fn late_turret_appears_only_after_turn_six() {
    let late = Command::spawn(UnitKind::Turret, &[CellCoord::new(19, 10)]);
    for (turn, expected) in [(6, false), (7, true)] {
        let mut arena = arena(turn, 0.0, 0.0, 0.0);
        sparse_back_line(&mut arena);
        let mut out = Vec::new();
        let _ = TurnController::default().handle(&mut arena, &Tracker::default(), &mut out);
        assert_eq!(out.contains(&late), expected, "turn {turn}");
    }
}

#[test]
fn bait_maintenance_is_idempotent() {
    let mut arena = arena(3, 10.0, 0.0, 0.0);
    place_enemy(&mut arena, UnitKind::Wall, [CellCoord::new(26, 15)]);

    let first = plan_bait(&arena);
    let second = plan_bait(&arena);

    assert_eq!(first, second);
    assert_eq!(
        first,
        vec![
            Command::spawn(
                UnitKind::Wall,
                &[CellCoord::new(2, 12), CellCoord::new(3, 12)]
            ),
            Command::remove(&[CellCoord::new(24, 12), CellCoord::new(25, 12)]),
        ]
    );
}

#[test]
fn bait_is_not_built_while_the_opening_is_cluttered() {
    let mut arena = arena(3, 10.0, 0.0, 0.0);
    place_enemy(&mut arena, UnitKind::Wall, [CellCoord::new(2, 16)]);

    let planned = plan_bait(&arena);

    assert_eq!(
        planned,
        vec![Command::spawn(
            UnitKind::Wall,
            &[CellCoord::new(24, 12), CellCoord::new(25, 12)]
        )]
    );
}

#[test]
fn least_damage_on_an_open_arena_picks_the_first_candidate() {
    let arena = arena(4, 0.0, 0.0, 0.0);
    let estimate = least_damage(&arena, &SPAWN_CANDIDATES).expect("candidates given");
    assert_eq!(estimate.cell, CellCoord::new(5, 8));
    assert!(estimate.damage.abs() < f32::EPSILON);
}

#[test]
fn least_damage_counts_turrets_along_the_path() {
    let mut arena = arena(4, 0.0, 0.0, 0.0);
    turret_screen(&mut arena, Some(13));

    let estimate = least_damage(&arena, &SPAWN_CANDIDATES).expect("candidates given");

    assert!(estimate.damage >= 25.0);
    assert!(SPAWN_CANDIDATES.contains(&estimate.cell));
}

#[test]
fn least_damage_never_picks_a_blocked_candidate() {
    let mut arena = arena(4, 0.0, 0.0, 0.0);
    let blocked = CellCoord::new(5, 8);
    assert!(arena.insert_unit(blocked, structure(UnitKind::Wall, PlayerSide::Ally)));

    let estimate = least_damage(&arena, &SPAWN_CANDIDATES).expect("open candidates remain");
    assert_eq!(estimate.cell, CellCoord::new(4, 9));

    assert_eq!(least_damage(&arena, &[blocked]), None);
}

#[test]
fn layout_cells_are_in_bounds_and_in_the_ally_half() {
    let blueprint = DEFENSE_BLUEPRINT.iter().flat_map(|step| step.cells.iter());
    let surplus = SURPLUS_PLAN.iter().flat_map(|step| step.cells.iter());
    let bait: Vec<CellCoord> = BAIT_PATTERNS.iter().flat_map(|pattern| pattern.bait).collect();

    for cell in blueprint.chain(surplus).chain(REACTIVE_CELLS).chain(&bait) {
        assert!(query::in_bounds(*cell), "{cell:?} out of bounds");
        assert!(cell.in_ally_half(), "{cell:?} outside the ally half");
    }
}

#[test]
fn bait_watches_only_opponent_cells() {
    for pattern in BAIT_PATTERNS {
        for cell in pattern.opening.iter().chain([&pattern.watch]) {
            assert!(query::in_bounds(*cell));
            assert!(!cell.in_ally_half());
        }
    }
}
