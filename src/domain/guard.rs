/// Guards: patrolling / sweeping hazards with a vision cone.
///
/// One type covers every hazard. `HazardStyle` only changes how the front end
/// draws it; simulation is identical.
///
/// ## Per-tick update (only while active)
///
///   1. Patrol: walk toward `path[current_point]` at `speed`. When the
///      remaining distance is under one tick of travel, snap onto the
///      waypoint and advance the index (wrapping). Facing follows the walk
///      direction unless the guard sweeps.
///   2. Sweep: `sweep_offset += sweep_step`; once |offset| > 45 the step
///      changes sign. The offset may overshoot 45 by at most one step.
///
/// A path needs speed > 0 and at least two distinct points to be walked.
/// Anything else holds position and only sweeps, so no division by a zero
/// distance can happen.

use serde::Deserialize;

use super::geom::{Point, Rect};
use super::links::LinkId;
use super::vision::Cone;

pub const GUARD_SIZE: f32 = 32.0;
pub const SWEEP_LIMIT_DEG: f32 = 45.0;

pub const DEFAULT_FOV: f32 = 60.0;
pub const DEFAULT_RANGE: f32 = 180.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GuardState {
    PatrollingMoving,
    PatrollingIdle,
    Sweeping,
    Disabled,
}

/// Visual tag. Fire hazards are guards drawn differently.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardStyle {
    #[default]
    Guard,
    Fire,
}

#[derive(Clone, Debug)]
pub struct Guard {
    pub id: usize,
    pub rect: Rect,
    pub patrol_path: Vec<Point>,
    pub current_point: usize,
    pub speed: f32,
    pub base_angle: f32,
    pub current_angle: f32,
    pub fov: f32,
    pub vision_range: f32,
    /// Signed per-tick sweep increment. Zero = no sweep.
    pub sweep_step: f32,
    pub sweep_offset: f32,
    pub link: LinkId,
    pub active: bool,
    pub style: HazardStyle,
}

impl Guard {
    pub fn new(id: usize, at: Point, link: LinkId) -> Self {
        Guard {
            id,
            rect: Rect::square(at, GUARD_SIZE),
            patrol_path: vec![],
            current_point: 0,
            speed: 0.0,
            base_angle: 0.0,
            current_angle: 0.0,
            fov: DEFAULT_FOV,
            vision_range: DEFAULT_RANGE,
            sweep_step: 0.0,
            sweep_offset: 0.0,
            link,
            active: true,
            style: HazardStyle::Guard,
        }
    }

    pub fn with_patrol(mut self, path: Vec<Point>, speed: f32) -> Self {
        self.patrol_path = path;
        self.speed = speed;
        self
    }

    pub fn with_vision(mut self, angle: f32, fov: f32, range: f32) -> Self {
        self.base_angle = angle;
        self.current_angle = angle;
        self.fov = fov;
        self.vision_range = range;
        self
    }

    pub fn with_sweep(mut self, step: f32) -> Self {
        self.sweep_step = step;
        self
    }

    pub fn with_style(mut self, style: HazardStyle) -> Self {
        self.style = style;
        self
    }

    /// Does this guard walk its path? (speed > 0, at least two distinct points)
    pub fn patrols(&self) -> bool {
        if self.speed <= 0.0 || self.patrol_path.len() < 2 {
            return false;
        }
        let first = self.patrol_path[0];
        self.patrol_path.iter().any(|p| *p != first)
    }

    pub fn state(&self) -> GuardState {
        if !self.active {
            GuardState::Disabled
        } else if self.sweep_step != 0.0 {
            GuardState::Sweeping
        } else if self.patrols() {
            GuardState::PatrollingMoving
        } else {
            GuardState::PatrollingIdle
        }
    }

    pub fn target_waypoint(&self) -> Option<Point> {
        if self.patrols() {
            self.patrol_path.get(self.current_point).copied()
        } else {
            None
        }
    }

    pub fn cone(&self) -> Cone {
        Cone {
            apex: self.rect.center(),
            facing_deg: self.current_angle,
            fov_deg: self.fov,
            range: self.vision_range,
        }
    }

    pub fn update(&mut self) {
        if !self.active { return; }

        if self.patrols() {
            self.step_patrol();
        }

        if self.sweep_step != 0.0 {
            self.sweep_offset += self.sweep_step;
            if self.sweep_offset.abs() > SWEEP_LIMIT_DEG {
                self.sweep_step = -self.sweep_step;
            }
            self.current_angle = self.base_angle + self.sweep_offset;
        } else {
            self.current_angle = self.base_angle;
        }
    }

    fn step_patrol(&mut self) {
        let len = self.patrol_path.len();
        let target = self.patrol_path[self.current_point % len];
        let dx = target.x - self.rect.x;
        let dy = target.y - self.rect.y;
        let dist = dx.hypot(dy);

        if dist < self.speed {
            self.rect.x = target.x;
            self.rect.y = target.y;
            self.current_point = (self.current_point + 1) % len;
            return;
        }

        self.rect.x += dx / dist * self.speed;
        self.rect.y += dy / dist * self.speed;
        if self.sweep_step == 0.0 {
            self.base_angle = -dy.atan2(dx).to_degrees();
        }
    }

    /// Body contact or corner-sampled cone contact. Inactive guards see nothing.
    pub fn check_collision(&self, target: &Rect) -> bool {
        if !self.active { return false; }
        if self.rect.intersects(target) { return true; }
        self.cone().sees_rect(target)
    }
}
