//! Piston Works entry point
//!
//! Headless driver: loads a level (or the built-in demo), runs it through the
//! fixed-step loop for a few simulated seconds and logs what happens.
//!
//! Usage: `piston-works [level.json]`, verbosity via `RUST_LOG`.

use glam::Vec2;

use piston_works::LevelConfig;
use piston_works::consts::*;
use piston_works::sim::{Level, SimEvent, TickInput, tick};

/// Simulated display refresh
const FRAME_DT: f32 = 1.0 / 60.0;
/// How long the headless run lasts
const RUN_SECONDS: f32 = 4.0;
/// When the demo flips the furnace switch
const FURNACE_AT: f32 = 1.0;

/// Driver state around the simulation
struct Runner {
    level: Level,
    accumulator: f32,
    input: TickInput,
}

impl Runner {
    fn new(level: Level) -> Self {
        Self {
            level,
            accumulator: 0.0,
            input: TickInput::default(),
        }
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.level, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Signals are one-shot
            self.input = TickInput::default();
        }
    }

    fn report_events(&mut self) {
        let time = self.level.time_ticks as f32 * SIM_DT;
        for event in self.level.world.drain_events() {
            match event {
                SimEvent::MotionSoundStarted { actuator, position } => {
                    log::debug!("[{:.2}s] piston {} motion loop on at {}", time, actuator, position);
                }
                SimEvent::MotionSoundStopped { actuator } => {
                    log::debug!("[{:.2}s] piston {} motion loop off", time, actuator);
                }
                SimEvent::RiderEliminated { rider, direction } => {
                    log::info!("[{:.2}s] rider {} eliminated, flung {}", time, rider, direction);
                }
                SimEvent::SteamBurst {
                    position, count, ..
                } => {
                    log::info!("[{:.2}s] steam x{} at {}", time, count, position);
                }
            }
        }
    }
}

fn load_level() -> LevelConfig {
    let Some(path) = std::env::args().nth(1) else {
        log::info!("No level given, using the built-in demo");
        return LevelConfig::demo();
    };
    match LevelConfig::load(&path) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Could not load {}: {}. Falling back to the demo", path, e);
            LevelConfig::demo()
        }
    }
}

fn main() {
    env_logger::init();
    log::info!("Piston Works (headless) starting...");

    let config = load_level();
    let mut level = Level::from_config(&config);
    // Standing where the furnace piston's body extends to once switched on
    level.spawn_rider(Vec2::new(30.0, 163.0), Vec2::new(8.0, 11.0));

    let mut runner = Runner::new(level);
    let frames = (RUN_SECONDS / FRAME_DT).round() as u32;
    let furnace_frame = (FURNACE_AT / FRAME_DT).round() as u32;

    for frame in 0..frames {
        if frame == furnace_frame {
            runner.input.raise.push("furnace".to_string());
        }
        runner.update(FRAME_DT);
        runner.report_events();
    }

    for actuator in runner.level.actuators() {
        log::info!(
            "Piston {} {:?}: head {} body {:.1} phase {:?} on={}",
            actuator.id(),
            actuator.direction(),
            actuator.head_position(),
            actuator.body_length(),
            actuator.phase(),
            actuator.is_on()
        );
    }
    let survivors = runner.level.world.riders().iter().filter(|r| r.alive).count();
    log::info!(
        "Done after {} ticks, {} rider(s) standing",
        runner.level.time_ticks,
        survivors
    );
}
