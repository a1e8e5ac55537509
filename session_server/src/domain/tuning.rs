// Gameplay tuning for players moving through the shared world.
// Keep this separate from runtime/server configuration (queue sizes, intervals, ports).

#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Largest accepted displacement for a single move message, in world units.
    pub max_move_step: f64,

    /// Maximum distance at which two players may interact, in world units.
    pub interaction_radius: f64,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_move_step: 50.0,
            interaction_radius: 150.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StaminaTuning {
    pub max: f64,

    /// Stamina spent per second while sprinting.
    pub drain_per_second: f64,

    /// Stamina recovered per second while not sprinting.
    pub regen_per_second: f64,

    /// Sprinting is re-enabled once stamina climbs back to this level.
    pub sprint_threshold: f64,
}

impl Default for StaminaTuning {
    fn default() -> Self {
        Self {
            max: 100.0,
            drain_per_second: 15.0,
            regen_per_second: 40.0,
            sprint_threshold: 30.0,
        }
    }
}
