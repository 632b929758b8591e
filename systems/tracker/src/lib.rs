#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Cross-turn threat and trend bookkeeping for the siege controller.
//!
//! The tracker is the only state that survives between turns. The driver
//! updates it at fixed points: [`Tracker::observe_opponent_mobile`] before the
//! controller decides, [`Tracker::record_breach`] while action frames stream
//! in, and [`Tracker::record_turn`] once the turn's batch has been submitted.
//! Decisions therefore always read the history as it stood before the current
//! turn.

use siege_core::CellCoord;

/// Health every player starts the match with.
pub const STARTING_HEALTH: f32 = 30.0;

/// Opponent health history, own last-known health and the opponent's MP peak.
#[derive(Clone, Debug)]
pub struct Tracker {
    history: Vec<f32>,
    last_self_health: f32,
    high_water_mark: f32,
    breaches: Vec<CellCoord>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(STARTING_HEALTH, STARTING_HEALTH)
    }
}

impl Tracker {
    /// Creates a tracker seeded with both players' starting health.
    #[must_use]
    pub fn new(opponent_starting_health: f32, self_starting_health: f32) -> Self {
        Self {
            history: vec![opponent_starting_health],
            last_self_health: self_starting_health,
            high_water_mark: 0.0,
            breaches: Vec::new(),
        }
    }

    /// Raises the high-water mark to the opponent's current mobile balance.
    pub fn observe_opponent_mobile(&mut self, opponent_mobile: f32) {
        self.high_water_mark = self.high_water_mark.max(opponent_mobile);
    }

    /// Records the end-of-turn state: one history entry per call.
    pub fn record_turn(&mut self, opponent_health: f32, self_health: f32, opponent_mobile: f32) {
        self.history.push(opponent_health);
        self.observe_opponent_mobile(opponent_mobile);
        self.last_self_health = self_health;
    }

    /// Remembers a cell where the opponent breached this side.
    pub fn record_breach(&mut self, cell: CellCoord) {
        if !self.breaches.contains(&cell) {
            self.breaches.push(cell);
        }
    }

    /// True when the last `window` history entries are all equal.
    ///
    /// Histories shorter than `window` never count as stalled.
    #[must_use]
    pub fn is_stalled(&self, window: usize) -> bool {
        if window == 0 || self.history.len() < window {
            return false;
        }
        let suffix = &self.history[self.history.len() - window..];
        suffix
            .iter()
            .all(|health| health.to_bits() == suffix[0].to_bits())
    }

    /// True when `current_self_health` dropped below the last recorded value.
    #[must_use]
    pub fn took_damage_this_turn(&self, current_self_health: f32) -> bool {
        current_self_health < self.last_self_health
    }

    /// Opponent health after every completed turn, seed first.
    #[must_use]
    pub fn history(&self) -> &[f32] {
        &self.history
    }

    /// Highest mobile balance the opponent has held so far.
    #[must_use]
    pub fn high_water_mark(&self) -> f32 {
        self.high_water_mark
    }

    /// Cells where the opponent breached, deduplicated in first-seen order.
    #[must_use]
    pub fn breaches(&self) -> &[CellCoord] {
        &self.breaches
    }
}
