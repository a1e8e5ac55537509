// Domain-level player entity and its public snapshot view.

use super::tuning::StaminaTuning;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar distance; Z is ignored for proximity checks.
    pub fn distance_to(&self, other: &Position) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    pub fn distance_squared_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Sprint budget for a player, advanced on every accepted move.
#[derive(Debug, Clone)]
pub struct Stamina {
    pub current: f64,
    pub can_sprint: bool,
    pub is_running: bool,
    last_update: Instant,
    tuning: StaminaTuning,
}

/// Read-only copy of the stamina fields other players may see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaminaInfo {
    pub current: f64,
    pub max: f64,
    pub can_sprint: bool,
}

impl Stamina {
    pub fn new(tuning: StaminaTuning, now: Instant) -> Self {
        Self {
            current: tuning.max,
            can_sprint: true,
            is_running: false,
            last_update: now,
            tuning,
        }
    }

    pub fn max(&self) -> f64 {
        self.tuning.max
    }

    pub fn info(&self) -> StaminaInfo {
        StaminaInfo {
            current: self.current,
            max: self.tuning.max,
            can_sprint: self.can_sprint,
        }
    }

    /// Advances the budget by the wall time elapsed since the previous update.
    pub fn update(&mut self, sprinting: bool, now: Instant) {
        let dt = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        if sprinting && self.can_sprint && self.current > 0.0 {
            self.current = (self.current - self.tuning.drain_per_second * dt).max(0.0);
            self.is_running = true;

            if self.current <= 0.0 {
                // Exhausted: sprint stays locked until regen reaches the threshold.
                self.can_sprint = false;
                self.is_running = false;
            }
        } else {
            self.current = (self.current + self.tuning.regen_per_second * dt).min(self.tuning.max);
            self.is_running = false;

            if self.current >= self.tuning.sprint_threshold {
                self.can_sprint = true;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub stamina: Stamina,
    // Connection that owns this player; deliveries to the player go through the hub by this id.
    pub conn_id: u64,
}

impl Player {
    pub fn new(
        id: String,
        name: String,
        position: Position,
        conn_id: u64,
        stamina: Stamina,
    ) -> Self {
        Self {
            id,
            name,
            position,
            stamina,
            conn_id,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView::from(self)
    }
}

/// Public fields of a player as copied out by world snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            x: p.position.x,
            y: p.position.y,
        }
    }
}
