//! Engine line protocol: game configuration, frames and turn submissions.

use serde::Deserialize;
use serde_json::Value;
use siege_arena::{query, Arena, Submission, SubmittedAction};
use siege_core::{
    CellCoord, Event, PlayerSide, ResourceBalance, UnitKind, UnitSnapshot, UnitStatsTable,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Unit groups per player: six kinds, then pending removals, then upgrades.
const UNIT_GROUPS: usize = 8;
const REMOVAL_GROUP: usize = 6;
const UPGRADE_GROUP: usize = 7;

/// Errors raised while decoding engine messages.
#[derive(Debug, Error)]
pub(crate) enum ProtocolError {
    /// The line was not valid JSON of the expected shape.
    #[error("malformed engine message: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration does not describe every unit kind.
    #[error("game configuration describes {found} unit types, expected at least {expected}")]
    MissingUnitTypes { found: usize, expected: usize },
    /// The frame carries no phase.
    #[error("frame has no turn information")]
    MissingTurnInfo,
    /// The frame phase is not one the engine documents.
    #[error("unknown frame phase {0}")]
    UnknownPhase(i64),
    /// A player's unit list does not hold one group per unit type.
    #[error("player unit list has {0} groups, expected 8")]
    UnitGroups(usize),
    /// A player's stats row is too short.
    #[error("player stats have {0} entries, expected at least 3")]
    PlayerStats(usize),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    unit_information: Vec<RawUnitInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawUnitInfo {
    cost1: Option<f32>,
    cost2: Option<f32>,
    start_health: Option<f32>,
    attack_range: Option<f32>,
    attack_damage_walker: Option<f32>,
    upgrade: Option<RawUpgrade>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawUpgrade {
    cost1: Option<f32>,
    start_health: Option<f32>,
    attack_range: Option<f32>,
}

/// Reads the unit stats announced by the engine's first message.
///
/// Fields the engine omits keep their built-in defaults.
pub(crate) fn parse_config(line: &str) -> Result<UnitStatsTable, ProtocolError> {
    let config: RawConfig = serde_json::from_str(line)?;
    if config.unit_information.len() < UnitKind::ALL.len() {
        return Err(ProtocolError::MissingUnitTypes {
            found: config.unit_information.len(),
            expected: UnitKind::ALL.len(),
        });
    }

    let mut table = UnitStatsTable::default();
    for (kind, info) in UnitKind::ALL.into_iter().zip(&config.unit_information) {
        let mut stats = *table.get(kind);
        stats.cost_structure = info.cost1.unwrap_or(stats.cost_structure);
        stats.cost_mobile = info.cost2.unwrap_or(stats.cost_mobile);
        stats.start_health = info.start_health.unwrap_or(stats.start_health);
        stats.attack_range = info.attack_range.unwrap_or(stats.attack_range);
        stats.damage = info.attack_damage_walker.unwrap_or(stats.damage);
        match &info.upgrade {
            Some(upgrade) => {
                stats.upgrade_cost_structure =
                    upgrade.cost1.unwrap_or(stats.upgrade_cost_structure);
                stats.upgraded_health = upgrade.start_health.unwrap_or(stats.start_health);
                stats.upgraded_attack_range = upgrade.attack_range.unwrap_or(stats.attack_range);
            }
            None => {
                stats.upgraded_health = stats.start_health;
                stats.upgraded_attack_range = stats.attack_range;
            }
        }
        table.set(kind, stats);
    }
    Ok(table)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFrame {
    turn_info: Vec<i64>,
    #[serde(default)]
    p1_stats: Vec<f32>,
    #[serde(default)]
    p2_stats: Vec<f32>,
    #[serde(default)]
    p1_units: Vec<Vec<RawUnit>>,
    #[serde(default)]
    p2_units: Vec<Vec<RawUnit>>,
    #[serde(default)]
    events: RawEvents,
}

#[derive(Debug, Deserialize)]
struct RawUnit(u32, u32, f32, Value);

#[derive(Debug, Default, Deserialize)]
struct RawEvents {
    #[serde(default)]
    breach: Vec<RawBreach>,
}

#[derive(Debug, Deserialize)]
struct RawBreach([u32; 2], f32, u8, Value, u8);

/// Decoded engine frame.
#[derive(Debug)]
pub(crate) enum Frame {
    /// Start of a turn: decide and submit.
    Turn(Arena),
    /// Mid-turn action frame carrying breach events.
    Action(Vec<Event>),
    /// The match is over.
    GameOver,
}

/// Decodes one frame line using the stats from the configuration.
pub(crate) fn parse_frame(line: &str, stats: &UnitStatsTable) -> Result<Frame, ProtocolError> {
    let frame: RawFrame = serde_json::from_str(line)?;
    let phase = *frame
        .turn_info
        .first()
        .ok_or(ProtocolError::MissingTurnInfo)?;

    match phase {
        0 => {
            let turn = frame
                .turn_info
                .get(1)
                .and_then(|turn| u32::try_from(*turn).ok())
                .unwrap_or_default();
            let mut arena = Arena::new(turn, stats.clone());
            load_player(&mut arena, PlayerSide::Ally, &frame.p1_stats, &frame.p1_units)?;
            load_player(&mut arena, PlayerSide::Enemy, &frame.p2_stats, &frame.p2_units)?;
            Ok(Frame::Turn(arena))
        }
        1 => Ok(Frame::Action(
            frame
                .events
                .breach
                .iter()
                .map(|RawBreach([x, y], damage, unit_type, id, player)| {
                    let cell = CellCoord::new(*x, *y);
                    debug!(?cell, damage, unit_type, %id, player, "breach reported");
                    Event::Breach {
                        cell,
                        breached: if *player == 1 {
                            PlayerSide::Enemy
                        } else {
                            PlayerSide::Ally
                        },
                    }
                })
                .collect(),
        )),
        2 => Ok(Frame::GameOver),
        other => Err(ProtocolError::UnknownPhase(other)),
    }
}

fn load_player(
    arena: &mut Arena,
    side: PlayerSide,
    stats: &[f32],
    groups: &[Vec<RawUnit>],
) -> Result<(), ProtocolError> {
    let [health, structure, mobile, ..] = *stats else {
        return Err(ProtocolError::PlayerStats(stats.len()));
    };
    if groups.len() != UNIT_GROUPS {
        return Err(ProtocolError::UnitGroups(groups.len()));
    }
    arena.set_health(side, health);
    arena.set_balance(side, ResourceBalance::new(structure, mobile));

    for (index, group) in groups.iter().enumerate() {
        for RawUnit(x, y, unit_health, id) in group {
            let cell = CellCoord::new(*x, *y);
            let loaded = match (index, UnitKind::from_index(index)) {
                (_, Some(kind)) => {
                    let max_health = query::stats(arena).get(kind).max_health(false);
                    arena.insert_unit(
                        cell,
                        UnitSnapshot {
                            kind,
                            owner: side,
                            health: *unit_health,
                            max_health,
                            upgraded: false,
                            pending_removal: false,
                        },
                    )
                }
                (REMOVAL_GROUP, None) => arena.mark_pending_removal(cell),
                (UPGRADE_GROUP, None) => arena.mark_upgraded(cell),
                (_, None) => false,
            };
            if !loaded {
                warn!(?side, group = index, ?cell, %id, "ignored unit the arena rejected");
            }
        }
    }
    Ok(())
}

fn action_token(action: SubmittedAction) -> &'static str {
    match action {
        SubmittedAction::Place(kind) => kind.shorthand(),
        SubmittedAction::Upgrade => "UP",
        SubmittedAction::Remove => "RM",
    }
}

/// Renders a stack as the engine's `[[type, x, y], ...]` line.
pub(crate) fn encode_stack(stack: &[Submission]) -> Result<String, ProtocolError> {
    let entries: Vec<(&str, u32, u32)> = stack
        .iter()
        .map(|submission| {
            (
                action_token(submission.action),
                submission.cell.x(),
                submission.cell.y(),
            )
        })
        .collect();
    Ok(serde_json::to_string(&entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{"unitInformation":[
        {"shorthand":"FF","cost1":1.0,"startHealth":60,"upgrade":{"cost1":1.0,"startHealth":120}},
        {"shorthand":"EF","cost1":4.0,"startHealth":30,"upgrade":{"cost1":4.0}},
        {"shorthand":"DF","cost1":3.0,"startHealth":75,"attackRange":2.5,"attackDamageWalker":6,
         "upgrade":{"cost1":4.0,"attackRange":3.5}},
        {"shorthand":"PI","cost2":1.0,"startHealth":15,"attackRange":3.5,"attackDamageWalker":2},
        {"shorthand":"EI","cost2":3.0,"startHealth":5,"attackRange":4.5,"attackDamageWalker":8},
        {"shorthand":"SI","cost2":1.0,"startHealth":40,"attackRange":4.5,"attackDamageWalker":20},
        {"shorthand":"RM"},
        {"shorthand":"UP"}
    ]}"#;

    fn turn_frame(p1_units: &str, p2_units: &str) -> String {
        format!(
            r#"{{"turnInfo":[0,4,-1,0],"p1Stats":[27.0,12.5,8.0,1200],"p2Stats":[24.0,3.0,11.0,900],"p1Units":{p1_units},"p2Units":{p2_units},"events":{{}}}}"#
        )
    }

    const NO_UNITS: &str = "[[],[],[],[],[],[],[],[]]";

    #[test]
    fn config_overrides_default_stats() {
        let table = parse_config(CONFIG).expect("config parses");

        let turret = table.get(UnitKind::Turret);
        assert!((turret.cost_structure - 3.0).abs() < f32::EPSILON);
        assert!((turret.damage - 6.0).abs() < f32::EPSILON);
        assert!((turret.upgraded_attack_range - 3.5).abs() < f32::EPSILON);
        assert!((table.get(UnitKind::Wall).upgraded_health - 120.0).abs() < f32::EPSILON);
        assert!((table.get(UnitKind::Support).upgraded_health - 30.0).abs() < f32::EPSILON);
        assert!((table.get(UnitKind::Demolisher).cost_mobile - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn short_config_is_rejected() {
        let error = parse_config(r#"{"unitInformation":[{"cost1":1.0}]}"#)
            .expect_err("too few unit types");
        assert!(matches!(
            error,
            ProtocolError::MissingUnitTypes { found: 1, .. }
        ));
    }

    #[test]
    fn turn_frame_builds_the_arena() {
        let stats = parse_config(CONFIG).expect("config parses");
        let p1 = r#"[[[0,13,60.0,"1"]],[],[[20,9,75.0,"2"]],[],[],[],[[0,13,60.0,"1"]],[[20,9,75.0,"2"]]]"#;
        let p2 = r#"[[[1,15,60.0,"3"]],[],[],[[13,27,15.0,"4"]],[],[],[],[]]"#;

        let Frame::Turn(arena) = parse_frame(&turn_frame(p1, p2), &stats).expect("frame parses")
        else {
            panic!("expected a turn frame");
        };

        assert_eq!(query::turn(&arena), 4);
        assert!((query::health(&arena, PlayerSide::Enemy) - 24.0).abs() < f32::EPSILON);
        assert!((query::balance(&arena, PlayerSide::Ally).structure - 12.5).abs() < f32::EPSILON);
        assert!((query::balance(&arena, PlayerSide::Enemy).mobile - 11.0).abs() < f32::EPSILON);

        let wall = query::structure_at(&arena, CellCoord::new(0, 13)).expect("wall loaded");
        assert!(wall.pending_removal);
        let turret = query::structure_at(&arena, CellCoord::new(20, 9)).expect("turret loaded");
        assert!(turret.upgraded);
        assert_eq!(
            query::units_at(&arena, CellCoord::new(13, 27))[0].kind,
            UnitKind::Scout
        );
        assert_eq!(
            query::structure_at(&arena, CellCoord::new(1, 15)).map(|unit| unit.owner),
            Some(PlayerSide::Enemy)
        );
    }

    #[test]
    fn action_frame_reports_breaches_by_victim() {
        let stats = UnitStatsTable::default();
        let line = r#"{"turnInfo":[1,4,12,0],"events":{"breach":[[[13,0],1,3,"7",2],[[14,27],1,3,"8",1]]}}"#;

        let Frame::Action(events) = parse_frame(line, &stats).expect("frame parses") else {
            panic!("expected an action frame");
        };

        assert_eq!(
            events,
            vec![
                Event::Breach {
                    cell: CellCoord::new(13, 0),
                    breached: PlayerSide::Ally,
                },
                Event::Breach {
                    cell: CellCoord::new(14, 27),
                    breached: PlayerSide::Enemy,
                },
            ]
        );
    }

    #[test]
    fn malformed_frames_are_reported() {
        let stats = UnitStatsTable::default();
        assert!(matches!(
            parse_frame("{\"turnInfo\":[]}", &stats),
            Err(ProtocolError::MissingTurnInfo)
        ));
        assert!(matches!(
            parse_frame("{\"turnInfo\":[5]}", &stats),
            Err(ProtocolError::UnknownPhase(5))
        ));
        assert!(matches!(
            parse_frame("not json", &stats),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            parse_frame(&turn_frame("[[]]", NO_UNITS), &stats),
            Err(ProtocolError::UnitGroups(1))
        ));
        assert!(matches!(
            parse_frame("{\"turnInfo\":[2]}", &stats),
            Ok(Frame::GameOver)
        ));
    }

    #[test]
    fn stacks_use_engine_tokens() {
        let stack = [
            Submission {
                action: SubmittedAction::Place(UnitKind::Wall),
                cell: CellCoord::new(0, 13),
            },
            Submission {
                action: SubmittedAction::Upgrade,
                cell: CellCoord::new(0, 13),
            },
            Submission {
                action: SubmittedAction::Remove,
                cell: CellCoord::new(3, 12),
            },
        ];

        assert_eq!(
            encode_stack(&stack).expect("stack encodes"),
            r#"[["FF",0,13],["UP",0,13],["RM",3,12]]"#
        );
        assert_eq!(encode_stack(&[]).expect("empty stack encodes"), "[]");
    }
}
