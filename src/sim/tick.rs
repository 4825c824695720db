//! Fixed timestep simulation tick
//!
//! Applies the tick's remote signals, then advances every piston once.

use super::state::Level;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Activation groups to raise before pistons update
    pub raise: Vec<String>,
    /// Activation groups to lower before pistons update
    pub lower: Vec<String>,
}

impl TickInput {
    pub fn raise(id: &str) -> Self {
        Self {
            raise: vec![id.to_string()],
            ..Default::default()
        }
    }

    pub fn lower(id: &str) -> Self {
        Self {
            lower: vec![id.to_string()],
            ..Default::default()
        }
    }
}

/// Advance the level by one fixed timestep
pub fn tick(level: &mut Level, input: &TickInput, dt: f32) {
    for id in &input.raise {
        level.broadcast_on(id);
    }
    for id in &input.lower {
        level.broadcast_off(id);
    }

    level.time_ticks += 1;

    // Pistons update in id order against the shared world
    let Level {
        actuators, world, ..
    } = level;
    for actuator in actuators.iter_mut() {
        actuator.update(dt, world);
    }
}
