/// Vision cone geometry.
///
/// Angles are in degrees with "up is positive": a bearing of 90 points toward
/// smaller y on screen. A cone is an apex, a facing angle, a full field of
/// view and a range.
///
/// ## Known limitation
///
/// `rect_in_cone` samples only the four corners of the target. A large
/// target whose edge midpoint is inside a narrow cone while every corner is
/// outside is NOT seen. Level tuning relies on this behaviour, so it stays.

use super::geom::{Point, Rect};

/// A vision cone, borrowed from a guard for one query.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Cone {
    pub apex: Point,
    pub facing_deg: f32,
    pub fov_deg: f32,
    pub range: f32,
}

/// Bearing from `apex` to `point`, up-positive.
#[inline]
pub fn bearing_deg(apex: Point, point: Point) -> f32 {
    let dx = point.x - apex.x;
    let dy = point.y - apex.y;
    -dy.atan2(dx).to_degrees()
}

/// Signed angular difference folded into [-180, 180).
#[inline]
pub fn normalize_angle_diff(diff: f32) -> f32 {
    (diff + 180.0).rem_euclid(360.0) - 180.0
}

pub fn point_in_cone(point: Point, apex: Point, facing_deg: f32, fov_deg: f32, range: f32) -> bool {
    if apex.distance(point) > range {
        return false;
    }
    let diff = normalize_angle_diff(bearing_deg(apex, point) - facing_deg);
    diff.abs() < fov_deg / 2.0
}

/// Corner-sampled rectangle visibility (see module docs).
pub fn rect_in_cone(target: &Rect, cone: &Cone) -> bool {
    target
        .corners()
        .iter()
        .any(|&c| point_in_cone(c, cone.apex, cone.facing_deg, cone.fov_deg, cone.range))
}

impl Cone {
    pub fn sees_point(&self, p: Point) -> bool {
        point_in_cone(p, self.apex, self.facing_deg, self.fov_deg, self.range)
    }

    pub fn sees_rect(&self, target: &Rect) -> bool {
        rect_in_cone(target, self)
    }
}
