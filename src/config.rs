//! Authored level data
//!
//! Per-piston placement and timing as it comes out of the level editor.
//! Every numeric field has a default; nothing beyond anchor clamping is
//! validated (that happens when the piston is built).

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{DEFAULT_INITIAL_DELAY, DEFAULT_MOVE_TIME, DEFAULT_PAUSE_TIME};
use crate::sim::Direction;

/// Errors raised while loading level data
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse level data: {0}")]
    Parse(#[from] serde_json::Error),
}

fn default_move_time() -> f32 {
    DEFAULT_MOVE_TIME
}

fn default_pause_time() -> f32 {
    DEFAULT_PAUSE_TIME
}

fn default_initial_delay() -> f32 {
    DEFAULT_INITIAL_DELAY
}

fn default_true() -> bool {
    true
}

/// One piston as placed in a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    /// Which way the head extends from the base
    pub direction: Direction,
    /// Base anchor
    pub position: Vec2,
    /// First travel node
    pub start: Vec2,
    /// Second travel node
    pub end: Vec2,
    /// Activation group (empty or missing = private)
    #[serde(default)]
    pub activation_id: Option<String>,
    /// Seconds per leg of travel
    #[serde(default = "default_move_time")]
    pub move_time: f32,
    /// Seconds held at each end
    #[serde(default = "default_pause_time")]
    pub pause_time: f32,
    /// Seconds the piston has notionally been running before the level starts
    #[serde(default = "default_initial_delay")]
    pub initial_delay: f32,
    /// Whether the piston runs before any signal is raised
    #[serde(default = "default_true")]
    pub start_active: bool,
    /// Lethal to riders caught in the body
    #[serde(default)]
    pub heated: bool,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Up,
            position: Vec2::ZERO,
            start: Vec2::ZERO,
            end: Vec2::ZERO,
            activation_id: None,
            move_time: DEFAULT_MOVE_TIME,
            pause_time: DEFAULT_PAUSE_TIME,
            initial_delay: DEFAULT_INITIAL_DELAY,
            start_active: true,
            heated: false,
        }
    }
}

impl ActuatorConfig {
    /// Activation group, treating an empty id as private
    pub fn activation_group(&self) -> Option<&str> {
        self.activation_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A whole level's worth of pistons
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Seed for cosmetic randomness (segment sprite variants)
    #[serde(default)]
    pub seed: u64,
    /// Activation groups whose signal is raised when the level loads
    #[serde(default)]
    pub raised_signals: Vec<String>,
    /// Pistons in placement order
    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,
}

impl LevelConfig {
    /// Parse level data from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let level: LevelConfig = serde_json::from_str(json)?;
        log::info!(
            "Parsed level: {} actuators, {} raised signals",
            level.actuators.len(),
            level.raised_signals.len()
        );
        Ok(level)
    }

    /// Read and parse a JSON level file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        log::info!("Loading level from {}", path.display());
        Self::from_json(&json)
    }

    /// Serialize back to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Built-in showcase: a staggered bank of crushers sharing one switch,
    /// a heated sideways piston, and a private lift.
    pub fn demo() -> Self {
        let crusher = |x: f32, delay: f32| ActuatorConfig {
            direction: Direction::Down,
            position: Vec2::new(x, 0.0),
            start: Vec2::new(x, 16.0),
            end: Vec2::new(x, 96.0),
            activation_id: Some("crushers".to_string()),
            initial_delay: delay,
            ..Default::default()
        };

        let mut actuators: Vec<ActuatorConfig> =
            (0..4).map(|i| crusher(32.0 + i as f32 * 24.0, i as f32 * 0.3)).collect();

        actuators.push(ActuatorConfig {
            direction: Direction::Right,
            position: Vec2::new(0.0, 160.0),
            start: Vec2::new(8.0, 160.0),
            end: Vec2::new(72.0, 160.0),
            activation_id: Some("furnace".to_string()),
            move_time: 0.8,
            pause_time: 0.5,
            start_active: false,
            heated: true,
            ..Default::default()
        });

        actuators.push(ActuatorConfig {
            direction: Direction::Up,
            position: Vec2::new(200.0, 240.0),
            start: Vec2::new(200.0, 200.0),
            end: Vec2::new(200.0, 120.0),
            move_time: 1.2,
            pause_time: 0.6,
            ..Default::default()
        });

        Self {
            seed: 0x5EED,
            raised_signals: Vec::new(),
            actuators,
        }
    }
}
