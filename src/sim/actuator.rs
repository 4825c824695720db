//! The piston entity
//!
//! Owns one phase engine, one geometry skeleton and one activator, and wires
//! them together every tick:
//! phase step -> head move (body rescale, carry) -> heated check -> cap push-off.

use glam::Vec2;
use rand::Rng;

use super::activation::{ActivationListener, ActivationNetwork, Activator};
use super::geometry::{Direction, PartKind, PistonGeometry, Rect, Segment};
use super::phase::{Phase, PhaseEngine, Step, resolve_startup};
use super::rider::{carry_rider, crush_contact, push_off_cap, rescale_rider};
use super::state::{SimEvent, Solid, SolidId, World};
use crate::config::ActuatorConfig;
use crate::consts::*;

pub type ActuatorId = u32;

/// Registration order of the collidable parts
const PARTS: [PartKind; 3] = [PartKind::Base, PartKind::Head, PartKind::Body];

/// A linear-motion hazard: fixed base, travelling head, resizable body
#[derive(Debug, Clone)]
pub struct Actuator {
    id: ActuatorId,
    activator: Activator,
    engine: PhaseEngine,
    geometry: PistonGeometry,
    heated: bool,
    initial_delay: f32,
    /// Handles of the registered base, head and body while attached
    solids: Option<[SolidId; 3]>,
    sound_playing: bool,
}

impl Actuator {
    /// Build a piston from authored data. Segment variants draw from `rng`.
    pub fn new<R: Rng>(id: ActuatorId, config: &ActuatorConfig, rng: &mut R) -> Self {
        let geometry = PistonGeometry::new(
            config.direction,
            config.position,
            config.start,
            config.end,
            rng,
        );
        Self {
            id,
            activator: Activator::new(config.activation_group(), config.start_active),
            engine: PhaseEngine::new(config.move_time, config.pause_time, config.initial_delay),
            geometry,
            heated: config.heated,
            initial_delay: config.initial_delay,
            solids: None,
            sound_playing: false,
        }
    }

    pub fn id(&self) -> ActuatorId {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.geometry.direction()
    }

    pub fn is_on(&self) -> bool {
        self.activator.is_on()
    }

    pub fn is_heated(&self) -> bool {
        self.heated
    }

    pub fn is_attached(&self) -> bool {
        self.solids.is_some()
    }

    pub fn sound_playing(&self) -> bool {
        self.sound_playing
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn travel_fraction(&self) -> f32 {
        self.engine.travel_fraction()
    }

    pub fn moving_forward(&self) -> bool {
        self.engine.moving_forward()
    }

    pub fn head_position(&self) -> Vec2 {
        self.geometry.head()
    }

    pub fn geometry(&self) -> &PistonGeometry {
        &self.geometry
    }

    pub fn segments(&self) -> &[Segment] {
        self.geometry.segments()
    }

    pub fn body_length(&self) -> f32 {
        self.geometry.body_length()
    }

    pub fn rect(&self, part: PartKind) -> Rect {
        self.geometry.rect(part)
    }

    /// Sprite tint for a part
    pub fn tint(&self, part: PartKind) -> [f32; 3] {
        match (self.heated, part) {
            (false, _) => NEUTRAL_TINT,
            (true, PartKind::Body) => HEATED_BODY_TINT,
            (true, _) => HEATED_CAP_TINT,
        }
    }

    /// Render depth for a part
    pub fn depth(part: PartKind) -> i32 {
        match part {
            PartKind::Body => BODY_DEPTH,
            PartKind::Base | PartKind::Head => CAP_DEPTH,
        }
    }

    /// Register the three sub-bodies, subscribe to the network and settle
    /// the startup state. Attaching twice is a no-op.
    pub fn attach(&mut self, world: &mut World, network: &mut ActivationNetwork) {
        if self.solids.is_some() {
            return;
        }

        let ids = PARTS.map(|part| {
            world.add_solid(Solid {
                id: 0,
                owner: self.id,
                part,
                bounds: self.geometry.rect(part),
                depth: Self::depth(part),
                light_occlusion: LIGHT_OCCLUSION,
                tint: self.tint(part),
            })
        });
        self.solids = Some(ids);

        network.subscribe(&self.activator, self.id);
        network.resolve_startup(self);
        self.move_head(0.0, world);

        log::info!(
            "Piston {} attached: {:?} at {}, group {:?}, on={}",
            self.id,
            self.geometry.direction(),
            self.geometry.base(),
            self.activator.group(),
            self.activator.is_on()
        );
    }

    /// Remove the sub-bodies and subscription, silencing the motion loop
    pub fn detach(&mut self, world: &mut World, network: &mut ActivationNetwork) {
        let Some(ids) = self.solids.take() else {
            return;
        };
        for id in ids {
            world.remove_solid(id);
        }
        network.unsubscribe(&self.activator, self.id);
        self.silence(world);
        log::info!("Piston {} detached", self.id);
    }

    /// Switch on locally; a no-op when already on
    pub fn turn_on(&mut self) {
        if self.activator.set_on(true) {
            self.on_turn_on();
        }
    }

    /// Switch off locally; a no-op when already off
    pub fn turn_off(&mut self) {
        if self.activator.set_on(false) {
            self.on_turn_off();
        }
    }

    /// Advance one fixed step
    pub fn update(&mut self, dt: f32, world: &mut World) {
        match self.engine.step(dt, self.activator.is_on()) {
            Step::Traveled => {
                self.move_head(dt, world);
                if !self.sound_playing {
                    self.sound_playing = true;
                    world.emit(SimEvent::MotionSoundStarted {
                        actuator: self.id,
                        position: self.geometry.base_rect().center(),
                    });
                }
            }
            Step::Frozen => self.silence(world),
            Step::Delayed | Step::Paused | Step::LegCompleted => {}
        }

        if self.heated {
            self.scald_riders(world);
        }
        self.displace_cap_riders(world);
    }

    fn silence(&mut self, world: &mut World) {
        if self.sound_playing {
            self.sound_playing = false;
            world.emit(SimEvent::MotionSoundStopped { actuator: self.id });
        }
    }

    fn sync_solids(&self, world: &mut World) {
        if let Some(ids) = self.solids {
            for (id, part) in ids.into_iter().zip(PARTS) {
                world.sync_solid(id, self.geometry.rect(part));
            }
        }
    }

    /// Reposition the head from the phase engine and drag attached riders
    /// along. Attachment is judged against the pre-move extents.
    fn move_head(&mut self, dt: f32, world: &mut World) {
        let direction = self.geometry.direction();
        let body_before = self.geometry.body_rect();
        let head_before = self.geometry.head_rect();

        let head = self
            .engine
            .head_position(self.geometry.start(), self.geometry.end());
        let resize = self.geometry.set_head(head);
        self.sync_solids(world);

        let origin = direction.along(self.geometry.base()) + GRAB_OFFSET;
        for rider in world.riders_mut().iter_mut().filter(|r| r.alive) {
            let on_body = if direction.is_vertical() {
                rider.climbs(&body_before)
            } else {
                rider.stands_on(&body_before)
            };

            if on_body {
                if resize.changed() {
                    rescale_rider(rider, direction, origin, &resize, dt);
                }
            } else if resize.head_delta != Vec2::ZERO && rider.stands_on(&head_before) {
                carry_rider(rider, resize.head_delta, dt);
            }
        }
    }

    fn scald_riders(&self, world: &mut World) {
        let body = self.geometry.body_rect();
        for i in 0..world.riders().len() {
            let rider = &mut world.riders_mut()[i];
            if !rider.alive {
                continue;
            }
            let bounds = rider.bounds();
            if !(rider.rides(&body) || body.overlaps(&bounds)) {
                continue;
            }

            rider.alive = false;
            let rider_id = rider.id;
            let contact = crush_contact(&bounds, &body);
            log::info!(
                "Rider {} scalded by piston {} (direction {})",
                rider_id,
                self.id,
                contact.direction
            );

            if !contact.is_enclosed() {
                world.emit(SimEvent::SteamBurst {
                    position: contact.point,
                    direction: contact.direction,
                    spread: contact.spread,
                    count: STEAM_PARTICLES,
                    speed: STEAM_SPEED,
                    direction_range: STEAM_DIRECTION_RANGE,
                });
            }
            world.emit(SimEvent::RiderEliminated {
                rider: rider_id,
                direction: contact.direction,
            });
        }
    }

    /// Vertical pistons shove riders off the base, and off the head when it
    /// points down
    fn displace_cap_riders(&self, world: &mut World) {
        let direction = self.geometry.direction();
        if !direction.is_vertical() {
            return;
        }
        let base = self.geometry.base_rect();
        let head = (direction == Direction::Down).then(|| self.geometry.head_rect());

        for rider in world.riders_mut().iter_mut().filter(|r| r.alive) {
            if rider.stands_on(&base) {
                push_off_cap(rider, &base);
            } else if let Some(head) = head.as_ref().filter(|h| rider.stands_on(h)) {
                push_off_cap(rider, head);
            }
        }
    }
}

impl ActivationListener for Actuator {
    fn activator(&self) -> &Activator {
        &self.activator
    }

    fn activator_mut(&mut self) -> &mut Activator {
        &mut self.activator
    }

    fn on_turn_on(&mut self) {
        log::debug!("Piston {} on", self.id);
    }

    // Motion sound stops on the next update, which has world access
    fn on_turn_off(&mut self) {
        log::debug!("Piston {} off", self.id);
    }

    fn on_start_on(&mut self) {
        let startup = resolve_startup(
            self.initial_delay,
            self.engine.move_time(),
            self.engine.pause_time(),
        );
        log::debug!(
            "Piston {} resumes mid-cycle: {:?} fraction {:.3} forward={}",
            self.id,
            startup.phase,
            startup.travel_fraction,
            startup.moving_forward
        );
        self.engine.apply_startup(startup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rider::Rider;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn attached(config: &ActuatorConfig) -> (Actuator, World, ActivationNetwork) {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut world = World::new();
        let mut network = ActivationNetwork::new();
        let mut actuator = Actuator::new(1, config, &mut rng);
        actuator.attach(&mut world, &mut network);
        (actuator, world, network)
    }

    fn press(heated: bool) -> ActuatorConfig {
        ActuatorConfig {
            direction: Direction::Down,
            position: Vec2::new(0.0, 0.0),
            start: Vec2::new(0.0, 48.0),
            end: Vec2::new(0.0, 28.0),
            heated,
            ..Default::default()
        }
    }

    fn lift() -> ActuatorConfig {
        ActuatorConfig {
            direction: Direction::Up,
            position: Vec2::new(0.0, 100.0),
            start: Vec2::new(0.0, 60.0),
            end: Vec2::new(0.0, 20.0),
            ..Default::default()
        }
    }

    fn run_leg(actuator: &mut Actuator, world: &mut World) {
        for _ in 0..200 {
            actuator.update(SIM_DT, world);
            if actuator.travel_fraction() >= 1.0 {
                break;
            }
        }
    }

    fn climber(x: f32, y: f32) -> Rider {
        let mut rider = Rider::new(7, Vec2::new(x, y), Vec2::new(8.0, 11.0));
        rider.climbing = true;
        rider
    }

    #[test]
    fn test_full_leg_reaches_end_anchor() {
        let (mut actuator, mut world, _) = attached(&lift());
        assert_eq!(actuator.travel_fraction(), 0.0);
        assert!(actuator.moving_forward());
        assert_eq!(actuator.head_position(), Vec2::new(0.0, 60.0));

        for _ in 0..48 {
            actuator.update(SIM_DT, &mut world);
        }
        assert_eq!(actuator.travel_fraction(), 1.0);
        assert!(actuator.moving_forward());
        assert!((actuator.head_position().y - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_climbing_rider_rescales_with_body() {
        let (mut actuator, mut world, _) = attached(&press(false));
        assert_eq!(actuator.body_length(), 40.0);

        // Flush against the body's left side, 30 below the grab origin (y = 8)
        world.add_rider(climber(-1.0, 38.0));
        run_leg(&mut actuator, &mut world);

        assert_eq!(actuator.body_length(), 20.0);
        let rider = world.rider(7).unwrap();
        assert!((rider.position.y - 23.0).abs() < 1e-2);
        assert_eq!(rider.position.x, -1.0);
        assert!(rider.lift_speed.y < 0.0);
    }

    #[test]
    fn test_enclosed_rider_crushed_without_steam() {
        let (mut actuator, mut world, _) = attached(&press(true));
        world.add_rider(Rider::new(7, Vec2::new(8.0, 30.0), Vec2::new(8.0, 11.0)));

        actuator.update(SIM_DT, &mut world);
        let events = world.drain_events();
        assert!(events.contains(&SimEvent::RiderEliminated {
            rider: 7,
            direction: Vec2::ZERO
        }));
        assert!(!events.iter().any(|e| matches!(e, SimEvent::SteamBurst { .. })));
        assert!(!world.rider(7).unwrap().alive);

        // Already eliminated riders are ignored
        actuator.update(SIM_DT, &mut world);
        assert!(
            !world
                .drain_events()
                .iter()
                .any(|e| matches!(e, SimEvent::RiderEliminated { .. }))
        );
    }

    #[test]
    fn test_side_contact_crush_emits_steam() {
        let (mut actuator, mut world, _) = attached(&press(true));
        world.add_rider(climber(-1.0, 38.0));

        actuator.update(SIM_DT, &mut world);
        let events = world.drain_events();
        assert!(events.contains(&SimEvent::RiderEliminated {
            rider: 7,
            direction: Vec2::NEG_X
        }));
        let steam: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SimEvent::SteamBurst {
                    position,
                    direction,
                    count,
                    ..
                } => Some((*position, *direction, *count)),
                _ => None,
            })
            .collect();
        assert_eq!(steam.len(), 1);
        assert_eq!(steam[0].1, Vec2::NEG_X);
        assert_eq!(steam[0].0.x, 3.0);
        assert_eq!(steam[0].2, STEAM_PARTICLES);
    }

    #[test]
    fn test_unheated_body_is_harmless() {
        let (mut actuator, mut world, _) = attached(&press(false));
        world.add_rider(Rider::new(7, Vec2::new(8.0, 30.0), Vec2::new(8.0, 11.0)));
        actuator.update(SIM_DT, &mut world);
        assert!(world.rider(7).unwrap().alive);
    }

    #[test]
    fn test_head_carries_standing_rider() {
        let (mut actuator, mut world, _) = attached(&lift());
        world.add_rider(Rider::new(7, Vec2::new(8.0, 60.0), Vec2::new(8.0, 11.0)));

        for _ in 0..10 {
            actuator.update(SIM_DT, &mut world);
        }
        let rider = world.rider(7).unwrap();
        assert!((rider.position.y - actuator.head_position().y).abs() < 1e-3);
        assert!(rider.position.y < 60.0);
        assert!(rider.lift_speed.y < 0.0);
    }

    #[test]
    fn test_base_pushes_rider_off() {
        let (mut actuator, mut world, _) = attached(&lift());
        world.add_rider(Rider::new(7, Vec2::new(3.0, 100.0), Vec2::new(8.0, 11.0)));

        actuator.update(SIM_DT, &mut world);
        let rider = world.rider(7).unwrap();
        // Base spans x 2..14; the left edge is the shorter trip
        assert_eq!(rider.bounds().right(), 2.0);
        assert_eq!(rider.position.y, 99.0);
    }

    #[test]
    fn test_horizontal_body_rescales_standing_rider() {
        let config = ActuatorConfig {
            direction: Direction::Right,
            position: Vec2::new(0.0, 0.0),
            start: Vec2::new(48.0, 0.0),
            end: Vec2::new(28.0, 0.0),
            ..Default::default()
        };
        let (mut actuator, mut world, _) = attached(&config);
        assert_eq!(actuator.rect(PartKind::Body), Rect::new(8.0, 3.0, 40.0, 10.0));

        // Standing on the body 30 out from the grab origin (x = 8)
        world.add_rider(Rider::new(7, Vec2::new(38.0, 3.0), Vec2::new(8.0, 11.0)));
        run_leg(&mut actuator, &mut world);

        assert_eq!(actuator.body_length(), 20.0);
        let rider = world.rider(7).unwrap();
        assert!((rider.position.x - 23.0).abs() < 1e-2);
        assert_eq!(rider.position.y, 3.0);
        assert!(rider.lift_speed.x < 0.0);
        assert_eq!(rider.lift_speed.y, 0.0);
    }

    #[test]
    fn test_down_head_pushes_rider_off() {
        let (mut actuator, mut world, _) = attached(&press(false));
        // On the head cap's left shoulder (head spans x 0..16 at y 48)
        world.add_rider(Rider::new(7, Vec2::new(2.0, 48.0), Vec2::new(8.0, 11.0)));

        actuator.update(SIM_DT, &mut world);
        let rider = world.rider(7).unwrap();
        assert_eq!(rider.bounds().right(), 0.0);
        assert!((rider.position.y - (actuator.head_position().y - CAP_NUDGE)).abs() < 1e-3);
    }

    #[test]
    fn test_up_head_keeps_rider() {
        let (mut actuator, mut world, _) = attached(&lift());
        world.add_rider(Rider::new(7, Vec2::new(2.0, 60.0), Vec2::new(8.0, 11.0)));

        actuator.update(SIM_DT, &mut world);
        assert_eq!(world.rider(7).unwrap().position.x, 2.0);
    }

    #[test]
    fn test_head_stays_between_anchors() {
        let config = ActuatorConfig {
            direction: Direction::Left,
            position: Vec2::new(200.0, 40.0),
            start: Vec2::new(180.0, 40.0),
            end: Vec2::new(40.0, 40.0),
            move_time: 0.3,
            pause_time: 0.05,
            initial_delay: 0.7,
            ..Default::default()
        };
        let (mut actuator, mut world, _) = attached(&config);
        for _ in 0..600 {
            actuator.update(SIM_DT, &mut world);
            let x = actuator.head_position().x;
            assert!((40.0 - 1e-3..=180.0 + 1e-3).contains(&x));
            assert!((actuator.head_position().y - 40.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_turn_off_is_idempotent_and_freezes() {
        let (mut actuator, mut world, _) = attached(&lift());
        for _ in 0..10 {
            actuator.update(SIM_DT, &mut world);
        }
        assert!(actuator.sound_playing());

        actuator.turn_off();
        actuator.turn_off();
        let head = actuator.head_position();
        let fraction = actuator.travel_fraction();

        actuator.update(SIM_DT, &mut world);
        actuator.update(SIM_DT, &mut world);
        assert_eq!(actuator.head_position(), head);
        assert_eq!(actuator.travel_fraction(), fraction);

        let stops = world
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SimEvent::MotionSoundStopped { .. }))
            .count();
        assert_eq!(stops, 1);

        actuator.turn_on();
        actuator.update(SIM_DT, &mut world);
        assert!(actuator.travel_fraction() > fraction);
    }

    #[test]
    fn test_sound_starts_once_per_run() {
        let (mut actuator, mut world, _) = attached(&lift());
        for _ in 0..30 {
            actuator.update(SIM_DT, &mut world);
        }
        let starts = world
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::MotionSoundStarted { .. }))
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_startup_resumes_mid_cycle() {
        let config = ActuatorConfig {
            initial_delay: 0.9,
            ..lift()
        };
        let (a, _, _) = attached(&config);
        let (b, _, _) = attached(&config);

        assert!(!a.moving_forward());
        assert!((a.travel_fraction() - 0.25).abs() < 1e-4);
        assert_eq!(a.phase(), Phase::Traveling);
        assert_eq!(a.head_position(), b.head_position());
        // Heading back from the end anchor
        assert!(a.head_position().y < 60.0);
    }

    #[test]
    fn test_group_signal_starts_idle_piston() {
        let config = ActuatorConfig {
            activation_id: Some("gate".to_string()),
            start_active: false,
            initial_delay: 0.3,
            ..lift()
        };
        let (mut actuator, mut world, mut network) = attached(&config);
        assert!(!actuator.is_on());
        assert_eq!(actuator.phase(), Phase::Delaying);

        actuator.update(SIM_DT, &mut world);
        assert_eq!(actuator.head_position(), Vec2::new(0.0, 60.0));

        let mut pistons = vec![actuator];
        assert_eq!(network.broadcast_on("gate", pistons.as_mut_slice()), 1);
        assert!(pistons[0].is_on());
    }

    #[test]
    fn test_detach_removes_solids_and_sound() {
        let (mut actuator, mut world, mut network) = attached(&ActuatorConfig {
            activation_id: Some("gate".to_string()),
            ..lift()
        });
        assert_eq!(world.solids().len(), 3);
        actuator.update(SIM_DT, &mut world);
        world.drain_events();

        actuator.detach(&mut world, &mut network);
        assert!(world.solids().is_empty());
        assert!(!actuator.is_attached());
        assert_eq!(network.subscriber_count("gate"), 0);
        assert_eq!(
            world.drain_events(),
            vec![SimEvent::MotionSoundStopped { actuator: 1 }]
        );

        // Second detach has nothing left to do
        actuator.detach(&mut world, &mut network);
        assert!(world.events().is_empty());
    }

    #[test]
    fn test_solids_follow_head() {
        let (mut actuator, mut world, _) = attached(&lift());
        for _ in 0..20 {
            actuator.update(SIM_DT, &mut world);
        }
        for solid in world.solids() {
            assert_eq!(solid.bounds, actuator.rect(solid.part));
            assert_eq!(solid.light_occlusion, LIGHT_OCCLUSION);
        }
    }

    #[test]
    fn test_heated_tints() {
        let (hot, _, _) = attached(&press(true));
        let (cold, _, _) = attached(&press(false));
        assert_eq!(hot.tint(PartKind::Head), HEATED_CAP_TINT);
        assert_eq!(hot.tint(PartKind::Body), HEATED_BODY_TINT);
        assert_eq!(cold.tint(PartKind::Base), NEUTRAL_TINT);
        assert_eq!(Actuator::depth(PartKind::Base), CAP_DEPTH);
        assert_eq!(Actuator::depth(PartKind::Body), BODY_DEPTH);
    }
}
