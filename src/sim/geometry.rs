//! Piston geometry: base cap, head cap, resizable body and filler segments
//!
//! A piston is laid out along one axis. The base never moves; the head slides
//! between two clamped anchors; the body fills the gap between the caps and
//! is re-derived from the head position on every move. Filler segments are a
//! fixed-size array repositioned in place, never reallocated.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Tolerance for "touching" contact tests
pub const CONTACT_EPSILON: f32 = 0.01;

/// Which way the head extends from the base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Travel axis is y
    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Sign of the head's offset from the base along the travel axis
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Up | Direction::Left => -1.0,
            Direction::Down | Direction::Right => 1.0,
        }
    }

    /// Sprite rotation applied to every part of the piston
    pub fn rotation(self) -> f32 {
        use std::f32::consts::{FRAC_PI_2, PI};
        match self {
            Direction::Up => 0.0,
            Direction::Down => PI,
            Direction::Left => -FRAC_PI_2,
            Direction::Right => FRAC_PI_2,
        }
    }

    /// Component of `v` along the travel axis
    #[inline]
    pub fn along(self, v: Vec2) -> f32 {
        if self.is_vertical() { v.y } else { v.x }
    }

    /// Component of `v` across the travel axis
    #[inline]
    pub fn across(self, v: Vec2) -> f32 {
        if self.is_vertical() { v.x } else { v.y }
    }

    /// Build a vector from axis components
    #[inline]
    pub fn compose(self, along: f32, across: f32) -> Vec2 {
        if self.is_vertical() {
            Vec2::new(across, along)
        } else {
            Vec2::new(along, across)
        }
    }

    /// Unit vector along the travel axis (no sign)
    #[inline]
    pub fn axis(self) -> Vec2 {
        self.compose(1.0, 0.0)
    }
}

/// Axis-aligned rectangle, `pos` is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap (touching edges do not count)
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.left() < other.right() && other.left() < self.right()
    }

    fn overlaps_vertically(&self, other: &Rect) -> bool {
        self.top() < other.bottom() && other.top() < self.bottom()
    }

    /// `other` is standing on top of this rectangle
    pub fn supports(&self, other: &Rect) -> bool {
        self.size.x > 0.0
            && (other.bottom() - self.top()).abs() <= CONTACT_EPSILON
            && self.overlaps_horizontally(other)
    }

    /// `other` is flush against the left or right side of this rectangle
    pub fn touches_side(&self, other: &Rect) -> bool {
        self.size.y > 0.0
            && ((other.right() - self.left()).abs() <= CONTACT_EPSILON
                || (other.left() - self.right()).abs() <= CONTACT_EPSILON)
            && self.overlaps_vertically(other)
    }
}

/// Named sub-body of a piston
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartKind {
    Base,
    Head,
    Body,
}

/// A filler segment sprite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Sprite centre
    pub position: Vec2,
    pub rotation: f32,
    /// Which of the body sprite variants to draw
    pub variant: u8,
}

/// Body length change caused by a head move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyResize {
    pub before: f32,
    pub after: f32,
    /// How far the head moved
    pub head_delta: Vec2,
}

impl BodyResize {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

/// Clamp a travel node so the head stays at least `MIN_HEAD_OFFSET` out from
/// the base, and snap it onto the base's axis.
pub fn clamp_anchor(direction: Direction, base: Vec2, node: Vec2) -> Vec2 {
    let base_along = direction.along(base);
    let limit = base_along + direction.sign() * MIN_HEAD_OFFSET;
    let along = direction.along(node);
    let clamped = match direction {
        Direction::Up | Direction::Left => along.min(limit),
        Direction::Down | Direction::Right => along.max(limit),
    };
    if clamped != along {
        log::debug!(
            "{:?} piston node {} clamped to {} (base at {})",
            direction,
            along,
            clamped,
            base_along
        );
    }
    direction.compose(clamped, direction.across(base))
}

/// The physical and visual skeleton of one piston
#[derive(Debug, Clone)]
pub struct PistonGeometry {
    direction: Direction,
    base: Vec2,
    start: Vec2,
    end: Vec2,
    head: Vec2,
    rotation: f32,
    segments: Vec<Segment>,
}

impl PistonGeometry {
    /// Build the skeleton with the head resting on the start anchor
    pub fn new<R: Rng>(direction: Direction, base: Vec2, start: Vec2, end: Vec2, rng: &mut R) -> Self {
        let start = clamp_anchor(direction, base, start);
        let end = clamp_anchor(direction, base, end);
        let rotation = direction.rotation();

        let base_along = direction.along(base);
        let max_length = (base_along - direction.along(start))
            .abs()
            .max((base_along - direction.along(end)).abs());
        let count = (max_length / SEGMENT_LENGTH).ceil() as usize;

        let segments = (0..count)
            .map(|_| Segment {
                position: Vec2::ZERO,
                rotation,
                variant: rng.random_range(0..SEGMENT_VARIANTS),
            })
            .collect();

        let mut geometry = Self {
            direction,
            base,
            start,
            end,
            head: start,
            rotation,
            segments,
        };
        geometry.layout_segments();
        geometry
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn base(&self) -> Vec2 {
        self.base
    }

    /// Clamped first anchor
    pub fn start(&self) -> Vec2 {
        self.start
    }

    /// Clamped second anchor
    pub fn end(&self) -> Vec2 {
        self.end
    }

    pub fn head(&self) -> Vec2 {
        self.head
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distance between the facing edges of the two caps
    pub fn body_length(&self) -> f32 {
        let d = self.direction;
        ((d.along(self.base) - d.along(self.head)).abs() - CAP_THICKNESS).max(0.0)
    }

    pub fn base_rect(&self) -> Rect {
        let d = self.direction;
        Rect {
            pos: self.base + d.compose(0.0, BASE_INSET),
            size: d.compose(CAP_THICKNESS, BASE_WIDTH),
        }
    }

    pub fn head_rect(&self) -> Rect {
        Rect {
            pos: self.head,
            size: self.direction.compose(CAP_THICKNESS, HEAD_WIDTH),
        }
    }

    pub fn body_rect(&self) -> Rect {
        let d = self.direction;
        let along = d.along(self.head).min(d.along(self.base)) + CAP_THICKNESS;
        let across = d.across(self.base) + BODY_INSET;
        Rect {
            pos: d.compose(along, across),
            size: d.compose(self.body_length(), BODY_WIDTH),
        }
    }

    pub fn rect(&self, part: PartKind) -> Rect {
        match part {
            PartKind::Base => self.base_rect(),
            PartKind::Head => self.head_rect(),
            PartKind::Body => self.body_rect(),
        }
    }

    /// Move the head and re-derive the body and segment layout
    pub(crate) fn set_head(&mut self, head: Vec2) -> BodyResize {
        let before = self.body_length();
        let head_delta = head - self.head;
        self.head = head;
        self.layout_segments();
        BodyResize {
            before,
            after: self.body_length(),
            head_delta,
        }
    }

    fn layout_segments(&mut self) {
        let d = self.direction;
        let count = self.segments.len();
        if count == 0 {
            return;
        }

        let base_along = d.along(self.base);
        let head_along = d.along(self.head);
        // Up/Left lay out from the head end, Down/Right from the far side of the body
        let (head_mod, body_mod) = match d {
            Direction::Up | Direction::Left => (CAP_THICKNESS, 0.0),
            Direction::Down | Direction::Right => {
                (-CAP_THICKNESS, (base_along - head_along).abs() - 2.0 * CAP_THICKNESS)
            }
        };
        let spacing = (base_along - (head_along + head_mod)) / count as f32;

        let body = self.body_rect();
        let origin_along = d.along(body.pos) + SEGMENT_LENGTH / 2.0;
        let across = d.across(self.base) + HEAD_WIDTH / 2.0;

        for (i, segment) in self.segments.iter_mut().enumerate() {
            let along = origin_along + i as f32 * spacing + body_mod;
            segment.position = d.compose(along, across);
            segment.rotation = self.rotation;
        }
    }
}
