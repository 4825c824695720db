//! Activation network: remote on/off signals shared by groups of hazards
//!
//! Entities subscribe under an optional group id. Raising or lowering a
//! group's signal synchronously notifies every subscriber, in registration
//! order, before the broadcast call returns. An entity without a group id is
//! private: broadcasts never reach it and only its own logic toggles it.
//!
//! Each entity carries a `start_on` polarity. Its effective state is
//! `start_on != group_signal`, so one switch can open some doors while it
//! closes others.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Handle the network uses to find a subscriber at delivery time
pub type ListenerId = u32;

/// Per-entity activation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activator {
    group: Option<String>,
    start_on: bool,
    on: bool,
    startup_resolved: bool,
}

impl Activator {
    pub fn new(group: Option<&str>, start_on: bool) -> Self {
        Self {
            group: group.map(str::to_string),
            start_on,
            on: start_on,
            startup_resolved: false,
        }
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn start_on(&self) -> bool {
        self.start_on
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn startup_resolved(&self) -> bool {
        self.startup_resolved
    }

    /// Returns true if the state changed
    pub fn set_on(&mut self, on: bool) -> bool {
        let changed = self.on != on;
        self.on = on;
        changed
    }
}

/// Callbacks an entity receives from the network
///
/// The network updates the entity's [`Activator`] before invoking the
/// matching callback, so callbacks only need to react.
pub trait ActivationListener {
    fn activator(&self) -> &Activator;
    fn activator_mut(&mut self) -> &mut Activator;

    fn on_turn_on(&mut self) {}
    fn on_turn_off(&mut self) {}
    fn on_start_on(&mut self) {}
    fn on_start_off(&mut self) {}
}

/// Lookup from listener handle to the live entity
pub trait ListenerSet {
    fn listener_mut(&mut self, id: ListenerId) -> Option<&mut dyn ActivationListener>;
}

#[derive(Debug, Clone, Default)]
struct Group {
    signal: bool,
    subscribers: Vec<ListenerId>,
}

/// Broadcast/subscribe service shared by every reactive entity in a scene
#[derive(Debug, Clone, Default)]
pub struct ActivationNetwork {
    groups: HashMap<String, Group>,
}

impl ActivationNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under its activator's group (private activators are ignored)
    pub fn subscribe(&mut self, activator: &Activator, listener: ListenerId) {
        let Some(id) = activator.group() else {
            return;
        };
        let group = self.groups.entry(id.to_string()).or_default();
        if !group.subscribers.contains(&listener) {
            group.subscribers.push(listener);
        }
    }

    /// Drop a listener; unknown listeners are ignored
    pub fn unsubscribe(&mut self, activator: &Activator, listener: ListenerId) {
        let Some(group) = activator.group().and_then(|id| self.groups.get_mut(id)) else {
            return;
        };
        group.subscribers.retain(|&l| l != listener);
    }

    /// Current signal of a group (false for groups never raised)
    pub fn is_on(&self, id: &str) -> bool {
        self.groups.get(id).is_some_and(|g| g.signal)
    }

    pub fn subscriber_count(&self, id: &str) -> usize {
        self.groups.get(id).map_or(0, |g| g.subscribers.len())
    }

    /// State an activator should have given the current signals
    pub fn effective_state(&self, activator: &Activator) -> bool {
        match activator.group() {
            Some(id) => activator.start_on() != self.is_on(id),
            None => activator.is_on(),
        }
    }

    /// Raise a group's signal. Returns how many listeners were notified.
    pub fn broadcast_on<S: ListenerSet + ?Sized>(&mut self, id: &str, listeners: &mut S) -> usize {
        self.broadcast(id, true, listeners)
    }

    /// Lower a group's signal. Returns how many listeners were notified.
    pub fn broadcast_off<S: ListenerSet + ?Sized>(&mut self, id: &str, listeners: &mut S) -> usize {
        self.broadcast(id, false, listeners)
    }

    fn broadcast<S: ListenerSet + ?Sized>(&mut self, id: &str, signal: bool, listeners: &mut S) -> usize {
        // Unknown groups still record the signal so late subscribers start consistent
        let group = self.groups.entry(id.to_string()).or_default();
        if group.signal == signal {
            return 0;
        }
        group.signal = signal;

        if group.subscribers.is_empty() {
            log::debug!("Signal '{}' -> {} reached no listeners", id, signal);
            return 0;
        }

        let mut delivered = 0;
        for &listener_id in &group.subscribers {
            let Some(listener) = listeners.listener_mut(listener_id) else {
                log::warn!("Signal '{}': listener {} is gone", id, listener_id);
                continue;
            };
            let on = listener.activator().start_on() != signal;
            // Already there through local logic
            if !listener.activator_mut().set_on(on) {
                continue;
            }
            if on {
                listener.on_turn_on();
            } else {
                listener.on_turn_off();
            }
            delivered += 1;
        }
        log::debug!("Signal '{}' -> {} delivered to {} listeners", id, signal, delivered);
        delivered
    }

    /// Let a freshly attached entity adopt the network's current state.
    /// Runs once per activator; later calls return false and do nothing.
    pub fn resolve_startup(&self, listener: &mut dyn ActivationListener) -> bool {
        if listener.activator().startup_resolved() {
            return false;
        }
        let on = self.effective_state(listener.activator());
        let activator = listener.activator_mut();
        activator.startup_resolved = true;
        activator.set_on(on);

        if on {
            listener.on_start_on();
        } else {
            listener.on_start_off();
        }
        true
    }
}
