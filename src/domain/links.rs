/// Link-activation network.
///
/// Two channels, both rebuilt from scratch every tick (no latching):
///   - `LinkMap`:   link id → active. Guards are enabled while their link is
///                   NOT active; dynamic walls are open while it IS.
///   - `SignalSet`: status signals (trap / cure) with the side that raised
///                   them, consumed by the status-effect handler.
///
/// A link no switch ever raises reads as inactive: guard armed, wall closed.

use std::collections::HashMap;

use serde::Deserialize;

use super::entity::{Deactivator, PlayerId, SyncZone, Trigger};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Freeze the opposing player and invert their controls.
    Trap,
    /// Undo a trap on the opposing player.
    Cure,
}

#[derive(Clone, Debug, Default)]
pub struct LinkMap {
    active: HashMap<LinkId, bool>,
}

impl LinkMap {
    pub fn new() -> Self {
        LinkMap::default()
    }

    pub fn set(&mut self, id: LinkId) {
        self.active.insert(id, true);
    }

    #[inline]
    pub fn is_active(&self, id: LinkId) -> bool {
        self.active.get(&id).copied().unwrap_or(false)
    }

    #[inline]
    pub fn guard_enabled(&self, id: LinkId) -> bool {
        !self.is_active(id)
    }

    #[inline]
    pub fn wall_open(&self, id: LinkId) -> bool {
        self.is_active(id)
    }

    /// Active links in ascending order.
    pub fn active_ids(&self) -> Vec<LinkId> {
        let mut ids: Vec<LinkId> = self.active.iter()
            .filter(|(_, &on)| on)
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        ids
    }
}

#[derive(Clone, Debug, Default)]
pub struct SignalSet {
    raised: Vec<(Signal, PlayerId)>,
}

impl SignalSet {
    pub fn raise(&mut self, signal: Signal, by: PlayerId) {
        if !self.raised.contains(&(signal, by)) {
            self.raised.push((signal, by));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Signal, PlayerId)> {
        self.raised.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.raised.is_empty()
    }
}

/// Build this tick's link map and signal set from already-sampled switches.
pub fn aggregate(deactivators: &[Deactivator], zones: &[SyncZone]) -> (LinkMap, SignalSet) {
    let mut links = LinkMap::new();
    let mut signals = SignalSet::default();

    let mut feed = |trigger: Trigger, by: PlayerId| match trigger {
        Trigger::Link(id) => links.set(id),
        Trigger::Signal(s) => signals.raise(s, by),
    };

    for d in deactivators.iter().filter(|d| d.contributes()) {
        feed(d.trigger, d.presser);
    }
    for z in zones.iter().filter(|z| z.active) {
        feed(z.trigger, z.presser);
    }

    (links, signals)
}
