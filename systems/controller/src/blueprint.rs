//! Declarative defensive layout and surplus spending order.

use siege_core::{CellCoord, Command, UnitKind};

/// Action a layout record asks the arena to perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutAction {
    /// Place one structure of the kind on every cell.
    Spawn(UnitKind),
    /// Upgrade the structure on every cell.
    Upgrade,
}

/// One record of the static defensive blueprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlueprintStep {
    /// What to do with the cells.
    pub action: LayoutAction,
    /// Cells the record targets, in order.
    pub cells: &'static [CellCoord],
    /// The record is skipped unless the turn is strictly greater than this.
    pub after_turn: Option<u32>,
}

impl BlueprintStep {
    /// Reports whether the record is active on `turn`.
    #[must_use]
    pub fn active_on(&self, turn: u32) -> bool {
        self.after_turn.map_or(true, |gate| turn > gate)
    }

    /// Intent the record produces.
    #[must_use]
    pub fn command(&self) -> Command {
        layout_command(self.action, self.cells)
    }
}

/// One run of surplus spending: each cell is a separate, floor-checked action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurplusStep {
    /// What to do with each cell.
    pub action: LayoutAction,
    /// Cells visited in order while the balance allows.
    pub cells: &'static [CellCoord],
}

impl SurplusStep {
    /// Intent for a single cell of the run.
    #[must_use]
    pub fn command_for(&self, cell: CellCoord) -> Command {
        layout_command(self.action, &[cell])
    }
}

fn layout_command(action: LayoutAction, cells: &[CellCoord]) -> Command {
    match action {
        LayoutAction::Spawn(kind) => Command::spawn(kind, cells),
        LayoutAction::Upgrade => Command::upgrade(cells),
    }
}

const fn cell(x: u32, y: u32) -> CellCoord {
    CellCoord::new(x, y)
}

const fn spawn(kind: UnitKind, cells: &'static [CellCoord]) -> BlueprintStep {
    BlueprintStep {
        action: LayoutAction::Spawn(kind),
        cells,
        after_turn: None,
    }
}

const fn upgrade(cells: &'static [CellCoord]) -> BlueprintStep {
    BlueprintStep {
        action: LayoutAction::Upgrade,
        cells,
        after_turn: None,
    }
}

/// Corner and flank cells that are always rebuilt and recycled when worn.
pub const REACTIVE_CELLS: &[CellCoord] = &[
    cell(27, 13),
    cell(0, 13),
    cell(1, 12),
    cell(2, 11),
    cell(3, 11),
    cell(4, 11),
    cell(26, 12),
    cell(25, 11),
    cell(24, 11),
    cell(23, 12),
];

const TURRET_CLUSTER: &[CellCoord] = &[
    cell(23, 11),
    cell(23, 10),
    cell(23, 9),
    cell(20, 9),
    cell(19, 8),
    cell(22, 8),
    cell(21, 7),
    cell(19, 9),
    cell(18, 7),
];

const LEFT_FLANK: &[CellCoord] = &[cell(5, 10), cell(5, 11), cell(23, 12), cell(6, 10)];

const LATE_TURRET: &[CellCoord] = &[cell(19, 10)];

/// Static defensive layout, evaluated in order every turn.
pub const DEFENSE_BLUEPRINT: &[BlueprintStep] = &[
    spawn(UnitKind::Wall, &[cell(0, 13), cell(1, 12), cell(27, 13)]),
    spawn(
        UnitKind::Wall,
        &[cell(2, 11), cell(3, 11), cell(4, 11), cell(5, 11)],
    ),
    spawn(UnitKind::Wall, &[cell(26, 12), cell(23, 12)]),
    spawn(UnitKind::Wall, &[cell(6, 10), cell(7, 9), cell(8, 8)]),
    spawn(
        UnitKind::Wall,
        &[
            cell(9, 8),
            cell(10, 8),
            cell(11, 8),
            cell(12, 8),
            cell(13, 8),
            cell(14, 8),
            cell(15, 8),
            cell(16, 8),
            cell(17, 8),
        ],
    ),
    spawn(UnitKind::Wall, &[cell(18, 8), cell(20, 10)]),
    spawn(
        UnitKind::Wall,
        &[
            cell(0, 13),
            cell(1, 12),
            cell(27, 13),
            cell(22, 11),
            cell(22, 10),
        ],
    ),
    spawn(UnitKind::Turret, TURRET_CLUSTER),
    spawn(UnitKind::Support, &[cell(4, 10)]),
    spawn(UnitKind::Support, &[cell(5, 10)]),
    spawn(UnitKind::Turret, &[cell(20, 6), cell(19, 5)]),
    BlueprintStep {
        action: LayoutAction::Spawn(UnitKind::Turret),
        cells: LATE_TURRET,
        after_turn: Some(6),
    },
    BlueprintStep {
        action: LayoutAction::Upgrade,
        cells: LATE_TURRET,
        after_turn: Some(6),
    },
    spawn(UnitKind::Wall, &[cell(20, 11)]),
    upgrade(&[
        cell(20, 9),
        cell(23, 11),
        cell(0, 13),
        cell(27, 13),
        cell(1, 12),
    ]),
    spawn(UnitKind::Support, &[cell(6, 9)]),
    upgrade(LEFT_FLANK),
    upgrade(TURRET_CLUSTER),
    upgrade(&[
        cell(5, 10),
        cell(5, 11),
        cell(23, 12),
        cell(6, 10),
        cell(2, 11),
        cell(3, 11),
        cell(4, 11),
        cell(5, 11),
    ]),
    upgrade(&[cell(20, 11)]),
    upgrade(&[cell(22, 11)]),
    upgrade(&[cell(22, 10)]),
    upgrade(&[cell(4, 10)]),
    upgrade(&[cell(20, 10)]),
    spawn(
        UnitKind::Turret,
        &[cell(19, 8), cell(19, 5), cell(18, 7), cell(18, 4)],
    ),
    spawn(UnitKind::Wall, &[cell(22, 9)]),
    spawn(UnitKind::Turret, &[cell(19, 11)]),
    spawn(UnitKind::Turret, &[cell(17, 6)]),
    spawn(UnitKind::Support, &[cell(7, 8)]),
    spawn(UnitKind::Support, &[cell(8, 7)]),
];

const SUPPORT_ROW_7: &[CellCoord] = &[
    cell(9, 7),
    cell(10, 7),
    cell(11, 7),
    cell(12, 7),
    cell(13, 7),
    cell(14, 7),
    cell(15, 7),
    cell(16, 7),
];

const SUPPORT_ROW_4: &[CellCoord] = &[
    cell(10, 4),
    cell(11, 4),
    cell(12, 4),
    cell(13, 4),
    cell(14, 4),
    cell(15, 4),
];

/// Order in which structure points above the surplus floor are spent.
pub const SURPLUS_PLAN: &[SurplusStep] = &[
    SurplusStep {
        action: LayoutAction::Spawn(UnitKind::Support),
        cells: SUPPORT_ROW_7,
    },
    SurplusStep {
        action: LayoutAction::Upgrade,
        cells: &[
            cell(23, 12),
            cell(20, 11),
            cell(19, 8),
            cell(23, 10),
            cell(18, 7),
        ],
    },
    SurplusStep {
        action: LayoutAction::Upgrade,
        cells: SUPPORT_ROW_7,
    },
    SurplusStep {
        action: LayoutAction::Upgrade,
        cells: &[cell(21, 7)],
    },
    SurplusStep {
        action: LayoutAction::Spawn(UnitKind::Support),
        cells: SUPPORT_ROW_4,
    },
    SurplusStep {
        action: LayoutAction::Upgrade,
        cells: SUPPORT_ROW_4,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_turret_waits_until_after_turn_six() {
        let gated: Vec<&BlueprintStep> = DEFENSE_BLUEPRINT
            .iter()
            .filter(|step| step.after_turn.is_some())
            .collect();

        assert_eq!(gated.len(), 2);
        assert!(gated.iter().all(|step| !step.active_on(6)));
        assert!(gated.iter().all(|step| step.active_on(7)));
        assert_eq!(
            gated[0].command(),
            Command::spawn(UnitKind::Turret, &[cell(19, 10)])
        );
    }

    #[test]
    fn surplus_steps_issue_single_cell_intents() {
        let step = SURPLUS_PLAN[0];
        assert_eq!(
            step.command_for(cell(9, 7)),
            Command::spawn(UnitKind::Support, &[cell(9, 7)])
        );
        assert_eq!(SURPLUS_PLAN[3].command_for(cell(21, 7)), Command::upgrade(&[cell(21, 7)]));
    }
}
