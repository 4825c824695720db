//! Scene state and core simulation types
//!
//! `World` stands in for the host engine: it holds the collidable sub-bodies
//! pistons register, the riders moving through the level, and the
//! fire-and-forget events bound for the audio/effects side. `Level` owns the
//! world, the activation network and every piston.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::activation::{ActivationListener, ActivationNetwork, ListenerId, ListenerSet};
use super::actuator::{Actuator, ActuatorId};
use super::geometry::{PartKind, Rect};
use super::rider::{Rider, RiderId};
use crate::config::{ActuatorConfig, LevelConfig};

pub type SolidId = u32;

/// Side effects for the excluded audio/effects collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Piston started travelling while its motion loop was silent
    MotionSoundStarted { actuator: ActuatorId, position: Vec2 },
    /// Piston switched off (or removed) while its motion loop was playing
    MotionSoundStopped { actuator: ActuatorId },
    /// Rider killed by a heated piston, flung along `direction`
    RiderEliminated { rider: RiderId, direction: Vec2 },
    /// Steam puff at a heated contact
    SteamBurst {
        position: Vec2,
        direction: Vec2,
        spread: Vec2,
        count: u32,
        speed: [f32; 2],
        direction_range: f32,
    },
}

/// A collidable sub-body registered with the host world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solid {
    pub id: SolidId,
    pub owner: ActuatorId,
    pub part: PartKind,
    pub bounds: Rect,
    /// Render depth (lower draws in front)
    pub depth: i32,
    pub light_occlusion: f32,
    pub tint: [f32; 3],
}

/// Host-world stand-in: solids, riders and outgoing events
#[derive(Debug, Clone, Default)]
pub struct World {
    solids: Vec<Solid>,
    riders: Vec<Rider>,
    events: Vec<SimEvent>,
    next_solid_id: SolidId,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a solid and return its handle
    pub fn add_solid(&mut self, mut solid: Solid) -> SolidId {
        self.next_solid_id += 1;
        solid.id = self.next_solid_id;
        let id = solid.id;
        self.solids.push(solid);
        id
    }

    /// Returns false if the solid was not registered
    pub fn remove_solid(&mut self, id: SolidId) -> bool {
        let before = self.solids.len();
        self.solids.retain(|s| s.id != id);
        self.solids.len() != before
    }

    /// Update a solid's collidable bounds
    pub fn sync_solid(&mut self, id: SolidId, bounds: Rect) {
        if let Some(solid) = self.solids.iter_mut().find(|s| s.id == id) {
            solid.bounds = bounds;
        }
    }

    pub fn solids(&self) -> &[Solid] {
        &self.solids
    }

    pub fn add_rider(&mut self, rider: Rider) {
        self.riders.push(rider);
        self.riders.sort_by_key(|r| r.id);
    }

    pub fn rider(&self, id: RiderId) -> Option<&Rider> {
        self.riders.iter().find(|r| r.id == id)
    }

    pub fn riders(&self) -> &[Rider] {
        &self.riders
    }

    pub fn riders_mut(&mut self) -> &mut [Rider] {
        &mut self.riders
    }

    /// Queue a side effect
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Events queued since the last drain
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Hand queued events to the host
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

impl ListenerSet for [Actuator] {
    fn listener_mut(&mut self, id: ListenerId) -> Option<&mut dyn ActivationListener> {
        self.iter_mut()
            .find(|a| a.id() == id)
            .map(|a| a as &mut dyn ActivationListener)
    }
}

/// A running scene: pistons, their activation network and the host world
#[derive(Debug, Clone)]
pub struct Level {
    /// Seed for cosmetic randomness
    pub seed: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Remote signal fan-out shared by every piston
    pub network: ActivationNetwork,
    /// Host-world stand-in
    pub world: World,
    /// Attached pistons, sorted by id
    pub(super) actuators: Vec<Actuator>,
    rng: Pcg32,
    next_id: u32,
}

impl Level {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            time_ticks: 0,
            network: ActivationNetwork::new(),
            world: World::new(),
            actuators: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Build a level from authored data. Raised signals are applied before
    /// any piston attaches so startup resolution sees them.
    pub fn from_config(config: &LevelConfig) -> Self {
        let mut level = Self::new(config.seed);
        for id in &config.raised_signals {
            level.broadcast_on(id);
        }
        for actuator in &config.actuators {
            level.add_actuator(actuator);
        }
        log::info!(
            "Level ready: {} pistons, {} solids",
            level.actuators.len(),
            level.world.solids().len()
        );
        level
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Construct a piston and attach it to the scene
    pub fn add_actuator(&mut self, config: &ActuatorConfig) -> ActuatorId {
        let id = self.next_entity_id();
        let mut actuator = Actuator::new(id, config, &mut self.rng);
        actuator.attach(&mut self.world, &mut self.network);
        self.actuators.push(actuator);
        id
    }

    /// Detach and drop a piston. Returns false for unknown ids.
    pub fn remove_actuator(&mut self, id: ActuatorId) -> bool {
        let Some(index) = self.actuators.iter().position(|a| a.id() == id) else {
            return false;
        };
        let mut actuator = self.actuators.remove(index);
        actuator.detach(&mut self.world, &mut self.network);
        true
    }

    pub fn actuator(&self, id: ActuatorId) -> Option<&Actuator> {
        self.actuators.iter().find(|a| a.id() == id)
    }

    pub fn actuator_mut(&mut self, id: ActuatorId) -> Option<&mut Actuator> {
        self.actuators.iter_mut().find(|a| a.id() == id)
    }

    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    /// Spawn a rider with a fresh id
    pub fn spawn_rider(&mut self, position: Vec2, size: Vec2) -> RiderId {
        let id = self.next_entity_id();
        self.world.add_rider(Rider::new(id, position, size));
        id
    }

    /// Raise a group's signal; listeners react before this returns
    pub fn broadcast_on(&mut self, id: &str) -> usize {
        log::info!("Signal '{}' raised", id);
        self.network.broadcast_on(id, self.actuators.as_mut_slice())
    }

    /// Lower a group's signal; listeners react before this returns
    pub fn broadcast_off(&mut self, id: &str) -> usize {
        log::info!("Signal '{}' lowered", id);
        self.network.broadcast_off(id, self.actuators.as_mut_slice())
    }
}
