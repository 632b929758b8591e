use serde::Deserialize;

/// Thresholds steering every stage of the turn controller.
///
/// Missing keys in an override file fall back to the defaults below.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    /// First turn on which a thin opponent front triggers the emergency batch.
    pub emergency_min_turn: u32,
    /// Opponent structures in rows 14..=17 at or below which the front counts as thin.
    pub emergency_front_threshold: usize,
    /// First turn on which the bait walls are maintained.
    pub bait_min_turn: u32,
    /// Reactive walls are upgraded on turns strictly after this one.
    pub reactive_upgrade_after_turn: u32,
    /// Structures at or below this fraction of their max health are recycled.
    pub damaged_health_ratio: f32,
    /// Structure points that must remain before another surplus action runs.
    pub surplus_floor: f32,
    /// Opponent mobile points that warrant a defensive interceptor.
    pub interceptor_tolerance: f32,
    /// Subtracted from the high-water mark when this side has been hit.
    pub high_water_margin: f32,
    /// Last turn that uses the opening scout rush.
    pub opening_last_turn: u32,
    /// Projected damage below which the scout opening fires.
    pub scout_opening_damage: f32,
    /// Scout costs of mobile points required before sending a scout wave.
    pub scout_wave_reserve: f32,
    /// Opponent structures on the right of row 14 that make the front dense.
    pub dense_front_threshold: usize,
    /// Demolishers in one line; its cost plus one gates the demolisher rules.
    pub demolisher_line: u32,
    /// History length from which the stall rule is considered.
    pub stall_min_history: usize,
    /// Trailing history entries that must be equal for a stall.
    pub stall_window: usize,
    /// History length from which the deep stall interceptor is considered.
    pub deep_stall_min_history: usize,
    /// Trailing history entries that must be equal for a deep stall.
    pub deep_stall_window: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            emergency_min_turn: 2,
            emergency_front_threshold: 3,
            bait_min_turn: 3,
            reactive_upgrade_after_turn: 5,
            damaged_health_ratio: 0.6,
            surplus_floor: 16.0,
            interceptor_tolerance: 16.0,
            high_water_margin: 0.99,
            opening_last_turn: 1,
            scout_opening_damage: 25.0,
            scout_wave_reserve: 16.0,
            dense_front_threshold: 7,
            demolisher_line: 7,
            stall_min_history: 10,
            stall_window: 7,
            deep_stall_min_history: 20,
            deep_stall_window: 17,
        }
    }
}
