//! Rider interaction with moving piston surfaces
//!
//! Riders are the host's moving actors (the player, carried objects). A
//! piston reads a rider's hitbox, decides how the moving structure affects
//! it, and writes the rider back within the same tick:
//! - climbing/standing riders are rescaled proportionally as the body resizes
//! - riders standing on the head are carried with it
//! - riders on a translating cap are pushed off its edge
//! - heated bodies crush riders in contact

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{BodyResize, Direction, Rect};
use crate::consts::{CAP_NUDGE, STEAM_SPREAD};

pub type RiderId = u32;

/// A moving actor that can stand on or climb piston surfaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    pub id: RiderId,
    /// Feet position (bottom-centre of the hitbox)
    pub position: Vec2,
    /// Hitbox size
    pub size: Vec2,
    /// Velocity imparted by whatever is carrying the rider
    pub lift_speed: Vec2,
    /// Holding onto a wall (set by the host's movement code)
    pub climbing: bool,
    pub alive: bool,
}

impl Rider {
    pub fn new(id: RiderId, position: Vec2, size: Vec2) -> Self {
        Self {
            id,
            position,
            size,
            lift_speed: Vec2::ZERO,
            climbing: false,
            alive: true,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            pos: self.position - Vec2::new(self.size.x / 2.0, self.size.y),
            size: self.size,
        }
    }

    /// Standing on top of `solid`
    pub fn stands_on(&self, solid: &Rect) -> bool {
        solid.supports(&self.bounds())
    }

    /// Clinging to the side of `solid`
    pub fn climbs(&self, solid: &Rect) -> bool {
        self.climbing && solid.touches_side(&self.bounds())
    }

    /// Standing on or climbing `solid`
    pub fn rides(&self, solid: &Rect) -> bool {
        self.stands_on(solid) || self.climbs(solid)
    }

    fn set_right(&mut self, x: f32) {
        self.position.x = x - self.size.x / 2.0;
    }

    fn set_left(&mut self, x: f32) {
        self.position.x = x + self.size.x / 2.0;
    }
}

/// Rescale an offset from `origin` by `after / before`.
/// Returns None when the old length is zero (nothing to scale from).
pub fn rescale_offset(coord: f32, origin: f32, before: f32, after: f32) -> Option<f32> {
    if before <= 0.0 {
        return None;
    }
    Some(origin + (coord - origin) * after / before)
}

/// Move a rider attached to a resizing body so it keeps its relative place
/// along the body, and give it the matching lift speed on that axis.
/// Returns the displacement applied.
pub fn rescale_rider(
    rider: &mut Rider,
    direction: Direction,
    origin: f32,
    resize: &BodyResize,
    dt: f32,
) -> Option<f32> {
    let current = direction.along(rider.position);
    let target = rescale_offset(current, origin, resize.before, resize.after)?;
    let delta = target - current;

    if dt > 0.0 {
        let speed = delta / dt;
        if direction.is_vertical() {
            rider.lift_speed.y = speed;
        } else {
            rider.lift_speed.x = speed;
        }
    }
    rider.position += direction.axis() * delta;
    Some(delta)
}

/// Carry a rider along with a moving surface
pub fn carry_rider(rider: &mut Rider, delta: Vec2, dt: f32) {
    rider.position += delta;
    if dt > 0.0 {
        rider.lift_speed = delta / dt;
    }
}

/// Shove a rider standing on `cap` off whichever edge is closer, then lift it
/// clear so it does not land back on the cap next tick.
pub fn push_off_cap(rider: &mut Rider, cap: &Rect) {
    let bounds = rider.bounds();
    if bounds.right() - cap.left() < cap.right() - bounds.left() {
        rider.set_right(cap.left());
    } else {
        rider.set_left(cap.right());
    }
    rider.position.y -= CAP_NUDGE;
}

/// Which face of a body a crushed rider is expelled from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrushContact {
    /// Unit direction away from the body, or zero when fully enclosed
    pub direction: Vec2,
    /// Where on the rider the contact is
    pub point: Vec2,
    /// Spread of the contact face for effects
    pub spread: Vec2,
}

impl CrushContact {
    pub fn is_enclosed(&self) -> bool {
        self.direction == Vec2::ZERO
    }
}

/// Resolve the crush direction for a rider in contact with `body`
pub fn crush_contact(rider: &Rect, body: &Rect) -> CrushContact {
    let center = rider.center();
    if rider.bottom() <= body.top() {
        CrushContact {
            direction: Vec2::NEG_Y,
            point: Vec2::new(center.x, rider.bottom()),
            spread: Vec2::X * STEAM_SPREAD,
        }
    } else if rider.right() <= body.left() {
        CrushContact {
            direction: Vec2::NEG_X,
            point: Vec2::new(rider.right(), center.y),
            spread: Vec2::Y * STEAM_SPREAD,
        }
    } else if rider.left() >= body.right() {
        CrushContact {
            direction: Vec2::X,
            point: Vec2::new(rider.left(), center.y),
            spread: Vec2::Y * STEAM_SPREAD,
        }
    } else {
        CrushContact {
            direction: Vec2::ZERO,
            point: center,
            spread: Vec2::ZERO,
        }
    }
}
