/// Entities: players, switches (deactivators), sync zones, dynamic walls,
/// and the key → chest → pod goal chain.
///
/// Switch-like entities sample a single designated player every tick and
/// hold only a transient flag; they never latch.

use serde::Deserialize;

use super::geom::{Point, Rect};
use super::links::{LinkId, Signal};

pub const DEACTIVATOR_SIZE: f32 = 40.0;
pub const SYNC_ZONE_SIZE: f32 = 50.0;

/// Half of the board a player lives on, split by the central divider.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerId {
    P1,
    P2,
}

impl PlayerId {
    pub fn other(self) -> PlayerId {
        match self {
            PlayerId::P1 => PlayerId::P2,
            PlayerId::P2 => PlayerId::P1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            PlayerId::P1 => 0,
            PlayerId::P2 => 1,
        }
    }

    pub fn side(self) -> Side {
        match self {
            PlayerId::P1 => Side::Left,
            PlayerId::P2 => Side::Right,
        }
    }
}

/// Held directions for one player this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Everything the core needs from the input collaborator for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub p1: MoveIntent,
    pub p2: MoveIntent,
}

impl FrameInput {
    pub fn for_player(&self, id: PlayerId) -> MoveIntent {
        match id {
            PlayerId::P1 => self.p1,
            PlayerId::P2 => self.p2,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub rect: Rect,
    pub speed: f32,
    pub side: Side,
    pub start: Point,
    /// Position at the start of the current tick's motion.
    pub prev: Point,
    pub frozen: bool,
    /// Ticks left before `frozen` wears off. 0 with `frozen` = until cured.
    pub freeze_timer: u32,
    pub inverted_controls: bool,
    pub carrying_key: bool,
}

impl Player {
    pub fn new(id: PlayerId, start: Point, size: f32, speed: f32) -> Self {
        Player {
            id,
            rect: Rect::square(start, size),
            speed,
            side: id.side(),
            start,
            prev: start,
            frozen: false,
            freeze_timer: 0,
            inverted_controls: false,
            carrying_key: false,
        }
    }

    /// Back to the start position with every transient flag cleared.
    pub fn reset(&mut self) {
        self.rect.x = self.start.x;
        self.rect.y = self.start.y;
        self.prev = self.start;
        self.frozen = false;
        self.freeze_timer = 0;
        self.inverted_controls = false;
        self.carrying_key = false;
    }

    pub fn moved(&self) -> bool {
        self.rect.top_left() != self.prev
    }

    pub fn is_afflicted(&self) -> bool {
        self.frozen || self.inverted_controls
    }

    /// Freeze (for `ticks`, or until cured when 0) and invert controls.
    pub fn afflict(&mut self, ticks: u32) {
        self.frozen = true;
        self.freeze_timer = ticks;
        self.inverted_controls = true;
    }

    pub fn cure(&mut self) {
        self.frozen = false;
        self.freeze_timer = 0;
        self.inverted_controls = false;
    }

    /// Count the freeze down. Returns true on the tick it wears off.
    pub fn tick_status(&mut self) -> bool {
        if self.frozen && self.freeze_timer > 0 {
            self.freeze_timer -= 1;
            if self.freeze_timer == 0 {
                self.frozen = false;
                return true;
            }
        }
        false
    }

    /// Per-tick displacement for the held directions.
    /// Down beats up and right beats left when both are held.
    pub fn displacement(&self, intent: MoveIntent) -> (f32, f32) {
        if self.frozen { return (0.0, 0.0); }

        let (left, right) = if self.inverted_controls {
            (intent.right, intent.left)
        } else {
            (intent.left, intent.right)
        };

        let mut dx = 0.0;
        let mut dy = 0.0;
        if intent.up { dy = -self.speed; }
        if intent.down { dy = self.speed; }
        if left { dx = -self.speed; }
        if right { dx = self.speed; }
        (dx, dy)
    }
}

// ══════════════════════════════════════════════════════════════
// Triggers
// ══════════════════════════════════════════════════════════════

/// Which channel a switch feeds: guard/wall activation or a status signal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Trigger {
    Link(LinkId),
    Signal(Signal),
}

#[derive(Clone, Debug)]
pub struct Deactivator {
    pub rect: Rect,
    pub trigger: Trigger,
    pub fake: bool,
    pub presser: PlayerId,
    pub pressed: bool,
}

impl Deactivator {
    pub fn new(at: Point, trigger: Trigger, fake: bool, presser: PlayerId) -> Self {
        Deactivator {
            rect: Rect::square(at, DEACTIVATOR_SIZE),
            trigger,
            fake,
            presser,
            pressed: false,
        }
    }

    pub fn update(&mut self, presser_rect: &Rect) {
        self.pressed = self.rect.intersects(presser_rect);
    }

    /// Fake switches look pressed but never feed the network.
    pub fn contributes(&self) -> bool {
        self.pressed && !self.fake
    }
}

/// Pressure plate. With `requires_motion` (a sync zone) it only counts while
/// the presser is inside AND moved this tick.
#[derive(Clone, Debug)]
pub struct SyncZone {
    pub rect: Rect,
    pub trigger: Trigger,
    pub presser: PlayerId,
    pub requires_motion: bool,
    pub occupied: bool,
    pub active: bool,
}

impl SyncZone {
    pub fn new(at: Point, trigger: Trigger, presser: PlayerId, requires_motion: bool) -> Self {
        SyncZone {
            rect: Rect::square(at, SYNC_ZONE_SIZE),
            trigger,
            presser,
            requires_motion,
            occupied: false,
            active: false,
        }
    }

    pub fn update(&mut self, presser_rect: &Rect, presser_moved: bool) {
        self.occupied = self.rect.intersects(presser_rect);
        self.active = self.occupied && (!self.requires_motion || presser_moved);
    }
}

#[derive(Clone, Debug)]
pub struct DynamicWall {
    pub rect: Rect,
    pub link: LinkId,
    /// Only this side's player collides with the wall.
    pub owner: Side,
    pub open: bool,
}

impl DynamicWall {
    pub fn new(rect: Rect, link: LinkId, owner: Side) -> Self {
        DynamicWall { rect, link, owner, open: false }
    }

    pub fn blocks(&self, side: Side) -> bool {
        !self.open && self.owner == side
    }
}

// ══════════════════════════════════════════════════════════════
// Goal chain
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GoalStage {
    SeekKey,
    SeekChest,
    SeekPod,
    Done,
}

/// Key (optional) → chest → escape pod (optional).
#[derive(Clone, Debug)]
pub struct Goal {
    pub chest: Rect,
    pub key: Option<Rect>,
    /// Key is lying at its spawn and can be picked up.
    pub key_armed: bool,
    pub pod: Option<Rect>,
    pub chest_opened: bool,
    pub reached_pod: bool,
}

impl Goal {
    pub fn new(chest: Rect, key: Option<Rect>, pod: Option<Rect>) -> Self {
        Goal {
            chest,
            key,
            key_armed: key.is_some(),
            pod,
            chest_opened: false,
            reached_pod: false,
        }
    }

    pub fn stage(&self, carrying_key: bool) -> GoalStage {
        if !self.chest_opened {
            if self.key.is_some() && !carrying_key {
                GoalStage::SeekKey
            } else {
                GoalStage::SeekChest
            }
        } else if self.pod.is_some() && !self.reached_pod {
            GoalStage::SeekPod
        } else {
            GoalStage::Done
        }
    }

    /// Put the key back at its spawn. A key spent on the chest stays spent.
    pub fn rearm_key(&mut self) {
        if self.key.is_some() && !self.chest_opened {
            self.key_armed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p1() -> Player {
        Player::new(PlayerId::P1, Point::new(100.0, 100.0), 32.0, 5.0)
    }

    #[test]
    fn reset_restores_start_and_clears_flags() {
        let mut p = p1();
        p.rect.x = 400.0;
        p.rect.y = 300.0;
        p.afflict(0);
        p.carrying_key = true;
        p.reset();
        assert_eq!(p.rect.top_left(), Point::new(100.0, 100.0));
        assert!(!p.frozen && !p.inverted_controls && !p.carrying_key);
        assert_eq!(p.freeze_timer, 0);
    }

    #[test]
    fn inverted_swaps_horizontal_only() {
        let mut p = p1();
        p.inverted_controls = true;
        let intent = MoveIntent { up: true, left: true, ..Default::default() };
        assert_eq!(p.displacement(intent), (5.0, -5.0));
    }

    #[test]
    fn frozen_ignores_input_until_timer_expires() {
        let mut p = p1();
        p.afflict(2);
        let intent = MoveIntent { right: true, ..Default::default() };
        assert_eq!(p.displacement(intent), (0.0, 0.0));
        assert!(!p.tick_status());
        assert!(p.tick_status());
        assert!(!p.frozen);
        assert!(p.inverted_controls);
        assert_eq!(p.displacement(intent), (-5.0, 0.0));
    }

    #[test]
    fn freeze_without_timer_lasts_until_cure() {
        let mut p = p1();
        p.afflict(0);
        for _ in 0..100 { assert!(!p.tick_status()); }
        assert!(p.frozen);
        p.cure();
        assert!(!p.is_afflicted());
    }

    #[test]
    fn fake_switch_is_pressed_but_silent() {
        let mut d = Deactivator::new(Point::new(0.0, 0.0), Trigger::Link(LinkId(4)), true, PlayerId::P2);
        d.update(&Rect::new(10.0, 10.0, 32.0, 32.0));
        assert!(d.pressed);
        assert!(!d.contributes());
    }

    #[test]
    fn sync_zone_needs_motion() {
        let mut z = SyncZone::new(Point::new(0.0, 0.0), Trigger::Link(LinkId(1)), PlayerId::P2, true);
        let inside = Rect::new(5.0, 5.0, 32.0, 32.0);
        z.update(&inside, false);
        assert!(z.occupied);
        assert!(!z.active);
        z.update(&inside, true);
        assert!(z.active);
    }

    #[test]
    fn plain_plate_counts_when_still() {
        let mut z = SyncZone::new(Point::new(0.0, 0.0), Trigger::Link(LinkId(1)), PlayerId::P2, false);
        z.update(&Rect::new(5.0, 5.0, 32.0, 32.0), false);
        assert!(z.active);
    }

    #[test]
    fn goal_stages() {
        let mut g = Goal::new(
            Rect::new(0.0, 0.0, 40.0, 40.0),
            Some(Rect::new(100.0, 0.0, 20.0, 20.0)),
            Some(Rect::new(200.0, 0.0, 40.0, 40.0)),
        );
        assert_eq!(g.stage(false), GoalStage::SeekKey);
        assert_eq!(g.stage(true), GoalStage::SeekChest);
        g.chest_opened = true;
        assert_eq!(g.stage(false), GoalStage::SeekPod);
        g.reached_pod = true;
        assert_eq!(g.stage(false), GoalStage::Done);
    }

    #[test]
    fn spent_key_is_not_rearmed() {
        let mut g = Goal::new(Rect::default(), Some(Rect::new(1.0, 1.0, 1.0, 1.0)), None);
        g.key_armed = false;
        g.chest_opened = true;
        g.rearm_key();
        assert!(!g.key_armed);
    }
}
