//! Deterministic simulation module
//!
//! All piston logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod activation;
pub mod actuator;
pub mod geometry;
pub mod phase;
pub mod rider;
pub mod state;
pub mod tick;

pub use activation::{ActivationListener, ActivationNetwork, Activator, ListenerId, ListenerSet};
pub use actuator::{Actuator, ActuatorId};
pub use geometry::{BodyResize, Direction, PartKind, PistonGeometry, Rect, Segment, clamp_anchor};
pub use phase::{Phase, PhaseEngine, StartupPhase, Step, resolve_startup};
pub use rider::{CrushContact, Rider, RiderId, crush_contact, rescale_offset};
pub use state::{Level, SimEvent, Solid, SolidId, World};
pub use tick::{TickInput, tick};
