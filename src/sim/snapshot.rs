/// Read-only frame snapshot for the front end.
///
/// `FrameSnapshot::capture` copies out everything drawable: boxes, angles,
/// flags and HUD text. The renderer never touches `WorldState`, so it
/// cannot reach into simulation logic.

use crate::domain::entity::{GoalStage, PlayerId, Trigger};
use crate::domain::geom::{Point, Rect};
use crate::domain::guard::{GuardState, HazardStyle};
use crate::domain::links::{LinkId, Signal};
use crate::domain::vision::Cone;
use super::world::{Phase, WorldState};

#[derive(Clone, Debug, PartialEq)]
pub struct GuardView {
    pub rect: Rect,
    /// Apex, facing, field of view and range as of this tick.
    pub cone: Cone,
    /// Next patrol waypoint, for walking guards.
    pub waypoint: Option<Point>,
    pub active: bool,
    pub style: HazardStyle,
    pub state: GuardState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchKind {
    Switch,
    Fake,
    SyncZone,
    Plate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwitchView {
    pub rect: Rect,
    pub kind: SwitchKind,
    /// Raises a status signal instead of a link.
    pub signal: Option<Signal>,
    pub link: Option<LinkId>,
    /// Pressed (switches) or active (zones) this tick.
    pub lit: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WallView {
    pub rect: Rect,
    pub open: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub rect: Rect,
    pub frozen: bool,
    pub inverted: bool,
    pub carrying_key: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GoalView {
    /// Key still lying at its spawn.
    pub key: Option<Rect>,
    pub chest: Rect,
    pub chest_opened: bool,
    pub pod: Option<Rect>,
    pub stage: GoalStage,
}

#[derive(Clone, Debug)]
pub struct FrameSnapshot {
    pub phase: Phase,
    pub level_index: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub description: String,
    pub briefing: Vec<String>,
    pub message: String,
    pub resets: u32,
    pub tick: u64,

    pub walls: Vec<Rect>,
    pub dynamic_walls: Vec<WallView>,
    pub guards: Vec<GuardView>,
    pub switches: Vec<SwitchView>,
    pub players: [PlayerView; 2],
    pub goal: GoalView,
}

fn split(trigger: Trigger) -> (Option<LinkId>, Option<Signal>) {
    match trigger {
        Trigger::Link(id) => (Some(id), None),
        Trigger::Signal(s) => (None, Some(s)),
    }
}

impl FrameSnapshot {
    pub fn capture(world: &WorldState) -> Self {
        let guards = world.guards.iter()
            .map(|g| GuardView {
                rect: g.rect,
                cone: g.cone(),
                waypoint: g.target_waypoint(),
                active: g.active,
                style: g.style,
                state: g.state(),
            })
            .collect();

        let mut switches: Vec<SwitchView> = world.deactivators.iter()
            .map(|d| {
                let (link, signal) = split(d.trigger);
                SwitchView {
                    rect: d.rect,
                    kind: if d.fake { SwitchKind::Fake } else { SwitchKind::Switch },
                    signal,
                    link,
                    lit: d.pressed,
                }
            })
            .collect();
        switches.extend(world.sync_zones.iter().map(|z| {
            let (link, signal) = split(z.trigger);
            SwitchView {
                rect: z.rect,
                kind: if z.requires_motion { SwitchKind::SyncZone } else { SwitchKind::Plate },
                signal,
                link,
                lit: z.active,
            }
        }));

        let player_view = |id: PlayerId| {
            let p = world.player(id);
            PlayerView {
                id,
                rect: p.rect,
                frozen: p.frozen,
                inverted: p.inverted_controls,
                carrying_key: p.carrying_key,
            }
        };

        let goal = &world.goal;

        FrameSnapshot {
            phase: world.phase,
            level_index: world.current_level,
            total_levels: world.total_levels(),
            level_name: world.level_name.clone(),
            description: world.description.clone(),
            briefing: world.briefing.clone(),
            message: world.message.clone(),
            resets: world.resets,
            tick: world.tick,
            walls: world.walls.clone(),
            dynamic_walls: world.dynamic_walls.iter()
                .map(|w| WallView { rect: w.rect, open: w.open })
                .collect(),
            guards,
            switches,
            players: [player_view(PlayerId::P1), player_view(PlayerId::P2)],
            goal: GoalView {
                key: goal.key.filter(|_| goal.key_armed),
                chest: goal.chest,
                chest_opened: goal.chest_opened,
                pod: goal.pod,
                stage: goal.stage(world.evader().carrying_key),
            },
        }
    }

    /// One-line objective for the HUD.
    pub fn objective(&self) -> &'static str {
        match self.goal.stage {
            GoalStage::SeekKey => "Objective: grab the key",
            GoalStage::SeekChest => "Objective: reach the chest",
            GoalStage::SeekPod => "Objective: reach the escape pod",
            GoalStage::Done => "Objective: complete",
        }
    }

    /// Status tags for one player, e.g. `FROZEN INVERTED`.
    pub fn status_tags(&self, id: PlayerId) -> String {
        let p = &self.players[id.index()];
        let mut tags = Vec::new();
        if p.frozen { tags.push("FROZEN"); }
        if p.inverted { tags.push("INVERTED"); }
        if p.carrying_key { tags.push("KEY"); }
        tags.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::level::{builtin_levels, load_level};

    fn loaded(idx: usize) -> WorldState {
        let mut world = WorldState::new(&GameConfig::default(), builtin_levels());
        load_level(&mut world, idx);
        world
    }

    #[test]
    fn capture_copies_every_entity() {
        let world = loaded(1);
        let snap = FrameSnapshot::capture(&world);
        assert_eq!(snap.guards.len(), 3);
        assert_eq!(snap.switches.len(), 6);
        assert_eq!(snap.switches.iter().filter(|s| s.kind == SwitchKind::Fake).count(), 3);
        assert_eq!(snap.walls.len(), world.walls.len());
        assert_eq!(snap.level_index, 1);
        assert_eq!(snap.phase, Phase::Playing);
    }

    #[test]
    fn guard_view_follows_guard() {
        let mut world = loaded(0);
        world.guards[1].active = false;
        let snap = FrameSnapshot::capture(&world);
        assert_eq!(snap.guards[0].cone.facing_deg, 90.0);
        assert_eq!(snap.guards[0].cone.fov_deg, 40.0);
        assert_eq!(snap.guards[0].state, GuardState::Sweeping);
        assert_eq!(snap.guards[1].state, GuardState::Disabled);
        assert_eq!(snap.guards[0].cone.apex, world.guards[0].rect.center());
        assert!(snap.guards[0].waypoint.is_none());
    }

    #[test]
    fn zones_and_signals_are_labelled() {
        let world = loaded(3);
        let snap = FrameSnapshot::capture(&world);
        assert!(snap.switches.iter().any(|s| s.kind == SwitchKind::SyncZone && s.link.is_some()));
        assert!(snap.switches.iter().any(|s| s.kind == SwitchKind::Plate && s.signal == Some(Signal::Trap)));
        assert!(snap.switches.iter().any(|s| s.signal == Some(Signal::Cure)));
    }

    #[test]
    fn picked_key_disappears_and_hud_follows() {
        let mut world = loaded(3);
        assert_eq!(FrameSnapshot::capture(&world).objective(), "Objective: grab the key");

        world.goal.key_armed = false;
        world.player_mut(PlayerId::P1).carrying_key = true;
        world.player_mut(PlayerId::P1).afflict(0);
        let snap = FrameSnapshot::capture(&world);
        assert!(snap.goal.key.is_none());
        assert_eq!(snap.objective(), "Objective: reach the chest");
        assert_eq!(snap.status_tags(PlayerId::P1), "FROZEN INVERTED KEY");
        assert_eq!(snap.status_tags(PlayerId::P2), "");
    }
}
