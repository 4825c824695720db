//! Piston Works - linked industrial actuators for a 2D platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (activation signals, phase engine, piston geometry, riders)
//! - `config`: Authored level data with defaults and JSON loading
//!
//! Positions are screen coordinates: +x right, +y down.

pub mod config;
pub mod sim;

pub use config::{ActuatorConfig, ConfigError, LevelConfig};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the driver will try to catch up on
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Actuator timing defaults (seconds)
    pub const DEFAULT_MOVE_TIME: f32 = 0.4;
    pub const DEFAULT_PAUSE_TIME: f32 = 0.2;
    pub const DEFAULT_INITIAL_DELAY: f32 = 0.0;

    /// Cap thickness along the travel axis
    pub const CAP_THICKNESS: f32 = 8.0;
    /// Head can never retract closer than this to the base
    pub const MIN_HEAD_OFFSET: f32 = 8.0;
    /// Head cap width across the travel axis
    pub const HEAD_WIDTH: f32 = 16.0;
    /// Base cap width across the travel axis
    pub const BASE_WIDTH: f32 = 12.0;
    /// Base inset from the head's edge across the travel axis
    pub const BASE_INSET: f32 = 2.0;
    /// Body width across the travel axis
    pub const BODY_WIDTH: f32 = 10.0;
    /// Body inset from the head's edge across the travel axis
    pub const BODY_INSET: f32 = 3.0;
    /// Length covered by one filler segment sprite
    pub const SEGMENT_LENGTH: f32 = 8.0;
    /// Number of filler segment sprite variants
    pub const SEGMENT_VARIANTS: u8 = 4;
    /// Offset from the base to the origin riders are rescaled around
    pub const GRAB_OFFSET: f32 = 8.0;
    /// How far a rider pushed off a cap is lifted
    pub const CAP_NUDGE: f32 = 1.0;

    /// Render depths (lower draws in front)
    pub const CAP_DEPTH: i32 = -9010;
    pub const BODY_DEPTH: i32 = -9000;
    /// Light occlusion for every piston part
    pub const LIGHT_OCCLUSION: f32 = 0.2;

    /// Tints for heated pistons
    pub const HEATED_CAP_TINT: [f32; 3] = [1.0, 0.8, 0.8];
    pub const HEATED_BODY_TINT: [f32; 3] = [1.0, 0.5, 0.5];
    pub const NEUTRAL_TINT: [f32; 3] = [1.0, 1.0, 1.0];

    /// Steam burst emitted on heated contact
    pub const STEAM_PARTICLES: u32 = 10;
    pub const STEAM_SPREAD: f32 = 4.0;
    pub const STEAM_SPEED: [f32; 2] = [16.0, 32.0];
    /// Angular range particles fan out over around the burst direction
    pub const STEAM_DIRECTION_RANGE: f32 = std::f32::consts::FRAC_PI_3;
}

/// Sine ease-in: slow start, accelerating toward the end
#[inline]
pub fn sine_in(t: f32) -> f32 {
    1.0 - (t * std::f32::consts::FRAC_PI_2).cos()
}

/// Move `value` toward `target` by at most `max_delta`, never overshooting
#[inline]
pub fn approach(value: f32, target: f32, max_delta: f32) -> f32 {
    if value > target {
        (value - max_delta).max(target)
    } else {
        (value + max_delta).min(target)
    }
}
