//! Piston phase engine
//!
//! Each piston cycles `Traveling -> Paused -> Traveling` with the direction
//! flipping at every completed leg, optionally preceded by a one-off
//! `Delaying` countdown. Everything freezes while the piston is switched off.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{approach, sine_in};

/// Fractions this close to 1 count as arrived (absorbs f32 drift over a leg)
const ARRIVAL_EPSILON: f32 = 1e-4;
/// Startup remainders this close to a cycle boundary count as whole cycles
const CYCLE_EPSILON: f32 = 1e-4;

/// What the piston is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Counting down the initial delay
    Delaying,
    /// Holding at one end between legs
    Paused,
    /// Head is moving (or about to complete a leg)
    Traveling,
}

/// Result of advancing the engine by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Switched off, nothing changed
    Frozen,
    /// Delay countdown ticked
    Delayed,
    /// Pause countdown ticked
    Paused,
    /// Travel fraction advanced; head must be repositioned
    Traveled,
    /// Leg finished: pause armed, fraction reset, direction flipped
    LegCompleted,
}

/// Equivalent in-cycle state for a piston that has notionally been running
/// for some time before the player arrived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartupPhase {
    pub phase: Phase,
    pub travel_fraction: f32,
    pub moving_forward: bool,
    pub pause_remaining: f32,
}

impl StartupPhase {
    /// Start of the very first leg
    pub fn fresh() -> Self {
        Self {
            phase: Phase::Traveling,
            travel_fraction: 0.0,
            moving_forward: true,
            pause_remaining: 0.0,
        }
    }
}

/// Resolve where in its cycle a piston should be after `startup_delay`
/// seconds, without simulating the intermediate ticks.
///
/// One full cycle is two legs and two pauses. Delays longer than a cycle are
/// reduced modulo the cycle, so whole cycles land back on the start of the
/// first leg. A delay landing in a pause window leaves the remainder of that
/// pause to count down. Negative durations count as zero.
pub fn resolve_startup(startup_delay: f32, move_time: f32, pause_time: f32) -> StartupPhase {
    let move_time = move_time.max(0.0);
    let pause_time = pause_time.max(0.0);
    let leg = move_time + pause_time;
    let cycle = 2.0 * leg;
    if startup_delay <= 0.0 || cycle <= 0.0 {
        return StartupPhase::fresh();
    }

    let mut remaining = startup_delay.rem_euclid(cycle);
    if remaining <= CYCLE_EPSILON || cycle - remaining <= CYCLE_EPSILON {
        return StartupPhase::fresh();
    }
    let mut moving_forward = true;

    if remaining >= leg {
        remaining -= leg;
        moving_forward = !moving_forward;
    }

    if remaining >= move_time {
        StartupPhase {
            phase: Phase::Paused,
            travel_fraction: 0.0,
            moving_forward,
            pause_remaining: (pause_time - (remaining - move_time)).max(0.0),
        }
    } else {
        StartupPhase {
            phase: Phase::Traveling,
            travel_fraction: (1.0 - remaining / move_time).clamp(0.0, 1.0),
            moving_forward,
            pause_remaining: 0.0,
        }
    }
}

/// Per-piston timing state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEngine {
    move_time: f32,
    pause_time: f32,
    travel_fraction: f32,
    moving_forward: bool,
    pause_remaining: f32,
    delay_remaining: f32,
}

impl PhaseEngine {
    /// A fresh engine; `startup_delay` is counted down before the first leg
    /// unless startup resolution replaces it. Negative durations clamp to 0.
    pub fn new(move_time: f32, pause_time: f32, startup_delay: f32) -> Self {
        Self {
            move_time: move_time.max(0.0),
            pause_time: pause_time.max(0.0),
            travel_fraction: 0.0,
            moving_forward: true,
            pause_remaining: 0.0,
            delay_remaining: startup_delay.max(0.0),
        }
    }

    pub fn move_time(&self) -> f32 {
        self.move_time
    }

    pub fn pause_time(&self) -> f32 {
        self.pause_time
    }

    pub fn travel_fraction(&self) -> f32 {
        self.travel_fraction
    }

    pub fn moving_forward(&self) -> bool {
        self.moving_forward
    }

    pub fn pause_remaining(&self) -> f32 {
        self.pause_remaining
    }

    pub fn delay_remaining(&self) -> f32 {
        self.delay_remaining
    }

    pub fn phase(&self) -> Phase {
        if self.delay_remaining > 0.0 {
            Phase::Delaying
        } else if self.pause_remaining > 0.0 {
            Phase::Paused
        } else {
            Phase::Traveling
        }
    }

    /// Adopt a resolved startup phase; any pending delay is consumed by it
    pub fn apply_startup(&mut self, startup: StartupPhase) {
        self.delay_remaining = 0.0;
        self.travel_fraction = startup.travel_fraction;
        self.moving_forward = startup.moving_forward;
        self.pause_remaining = startup.pause_remaining;
    }

    /// Advance one tick
    pub fn step(&mut self, dt: f32, on: bool) -> Step {
        if !on {
            return Step::Frozen;
        }

        if self.delay_remaining > 0.0 {
            self.delay_remaining = (self.delay_remaining - dt).max(0.0);
            Step::Delayed
        } else if self.pause_remaining > 0.0 {
            self.pause_remaining = (self.pause_remaining - dt).max(0.0);
            Step::Paused
        } else if self.travel_fraction < 1.0 {
            // Zero move time jumps straight to the far anchor
            let rate = if self.move_time > 0.0 {
                dt / self.move_time
            } else {
                1.0
            };
            let mut fraction = approach(self.travel_fraction, 1.0, rate);
            if 1.0 - fraction <= ARRIVAL_EPSILON {
                fraction = 1.0;
            }
            self.travel_fraction = fraction;
            Step::Traveled
        } else {
            self.pause_remaining = self.pause_time;
            self.travel_fraction = 0.0;
            self.moving_forward = !self.moving_forward;
            Step::LegCompleted
        }
    }

    /// Start and end of the current leg
    pub fn leg(&self, start: Vec2, end: Vec2) -> (Vec2, Vec2) {
        if self.moving_forward {
            (start, end)
        } else {
            (end, start)
        }
    }

    /// Eased head position for the current leg
    pub fn head_position(&self, start: Vec2, end: Vec2) -> Vec2 {
        let (from, to) = self.leg(start, end);
        from.lerp(to, sine_in(self.travel_fraction))
    }
}
