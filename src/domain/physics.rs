/// Motion resolver: axis-separated box movement against a wall set.
///
/// ## Order
///
///   1. Apply dx. If the box now overlaps a wall, undo dx.
///   2. Apply dy. If the box now overlaps a wall, undo dy.
///   3. Clamp into the play area (arena minus the status strip).
///   4. Apply the divider rule.
///
/// The independent revert lets a diagonal mover slide along a wall.
///
/// ## Wall set
///
/// Static walls plus every CLOSED dynamic wall owned by the mover's side.
/// Walls owned by the other side never block this mover.
///
/// ## Inverted penalty
///
/// A player with inverted controls on a level with the penalty enabled does
/// not slide: the first wall contact aborts resolution with `Punished` and
/// the caller resets the player.

use serde::Deserialize;

use super::entity::{DynamicWall, Player, Side};
use super::geom::Rect;

/// How the central divider treats a player who ends up on the wrong side.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DividerRule {
    /// Walls alone keep the halves apart.
    #[default]
    Open,
    /// Hard clamp to the player's own half.
    Clamp,
    /// Crossing sends the player back to start.
    SendHome,
}

#[derive(Clone, Copy, Debug)]
pub struct MotionRules {
    pub play_area: Rect,
    pub divider: DividerRule,
    pub divider_x: f32,
    pub inverted_wall_penalty: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MotionOutcome {
    /// No displacement requested.
    Still,
    Moved,
    /// At least one axis was reverted by a wall.
    Blocked,
    /// Wall contact while inverted. Caller must reset the player.
    Punished,
    /// Crossed the divider under `SendHome`. Caller must reset the player.
    SentHome,
}

/// The walls that block a mover on `side` this tick.
pub fn walls_for(side: Side, statics: &[Rect], dynamic: &[DynamicWall]) -> Vec<Rect> {
    let mut walls = Vec::with_capacity(statics.len() + dynamic.len());
    walls.extend_from_slice(statics);
    walls.extend(dynamic.iter().filter(|w| w.blocks(side)).map(|w| w.rect));
    walls
}

#[inline]
pub fn hits_any(rect: &Rect, walls: &[Rect]) -> bool {
    walls.iter().any(|w| w.intersects(rect))
}

pub fn resolve_motion(
    player: &mut Player,
    dx: f32,
    dy: f32,
    walls: &[Rect],
    rules: &MotionRules,
) -> MotionOutcome {
    let punishing = player.inverted_controls && rules.inverted_wall_penalty;
    let mut blocked = false;

    if dx != 0.0 {
        player.rect.x += dx;
        if hits_any(&player.rect, walls) {
            if punishing { return MotionOutcome::Punished; }
            player.rect.x -= dx;
            blocked = true;
        }
    }

    if dy != 0.0 {
        player.rect.y += dy;
        if hits_any(&player.rect, walls) {
            if punishing { return MotionOutcome::Punished; }
            player.rect.y -= dy;
            blocked = true;
        }
    }

    player.rect = player.rect.clamp_within(&rules.play_area);

    match rules.divider {
        DividerRule::Open => {}
        DividerRule::Clamp => clamp_to_half(player, rules.divider_x),
        DividerRule::SendHome => {
            if crossed_divider(player, rules.divider_x) {
                return MotionOutcome::SentHome;
            }
        }
    }

    if blocked {
        MotionOutcome::Blocked
    } else if dx == 0.0 && dy == 0.0 {
        MotionOutcome::Still
    } else {
        MotionOutcome::Moved
    }
}

pub fn crossed_divider(player: &Player, divider_x: f32) -> bool {
    match player.side {
        Side::Left => player.rect.right() > divider_x,
        Side::Right => player.rect.x < divider_x,
    }
}

fn clamp_to_half(player: &mut Player, divider_x: f32) {
    match player.side {
        Side::Left => player.rect.x = player.rect.x.min(divider_x - player.rect.w),
        Side::Right => player.rect.x = player.rect.x.max(divider_x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::PlayerId;
    use crate::domain::geom::Point;
    use crate::domain::links::LinkId;

    fn rules(divider: DividerRule) -> MotionRules {
        MotionRules {
            play_area: Rect::new(0.0, 60.0, 1280.0, 660.0),
            divider,
            divider_x: 640.0,
            inverted_wall_penalty: true,
        }
    }

    fn player_at(id: PlayerId, x: f32, y: f32) -> Player {
        Player::new(id, Point::new(x, y), 32.0, 5.0)
    }

    #[test]
    fn slides_along_wall_diagonally() {
        // Wall directly to the right; moving down-right keeps the Y part.
        let wall = Rect::new(133.0, 0.0, 20.0, 400.0);
        let mut p = player_at(PlayerId::P1, 100.0, 100.0);
        let out = resolve_motion(&mut p, 5.0, 5.0, &[wall], &rules(DividerRule::Open));
        assert_eq!(out, MotionOutcome::Blocked);
        assert_eq!(p.rect.top_left(), Point::new(100.0, 105.0));
    }

    #[test]
    fn free_move_and_still() {
        let mut p = player_at(PlayerId::P1, 100.0, 100.0);
        assert_eq!(resolve_motion(&mut p, 5.0, 0.0, &[], &rules(DividerRule::Open)), MotionOutcome::Moved);
        assert_eq!(resolve_motion(&mut p, 0.0, 0.0, &[], &rules(DividerRule::Open)), MotionOutcome::Still);
        assert_eq!(p.rect.x, 105.0);
    }

    #[test]
    fn clamps_out_of_status_strip() {
        let mut p = player_at(PlayerId::P1, 100.0, 62.0);
        resolve_motion(&mut p, 0.0, -5.0, &[], &rules(DividerRule::Open));
        assert_eq!(p.rect.y, 60.0);
    }

    #[test]
    fn open_dynamic_wall_only_releases_its_owner() {
        let mut dw = DynamicWall::new(Rect::new(0.0, 0.0, 10.0, 10.0), LinkId(1), Side::Left);
        assert_eq!(walls_for(Side::Left, &[], std::slice::from_ref(&dw)).len(), 1);
        assert!(walls_for(Side::Right, &[], std::slice::from_ref(&dw)).is_empty());
        dw.open = true;
        assert!(walls_for(Side::Left, &[], std::slice::from_ref(&dw)).is_empty());
    }

    #[test]
    fn inverted_wall_contact_is_punished() {
        let wall = Rect::new(133.0, 0.0, 20.0, 400.0);
        let mut p = player_at(PlayerId::P1, 100.0, 100.0);
        p.inverted_controls = true;
        let out = resolve_motion(&mut p, 5.0, 0.0, &[wall], &rules(DividerRule::Open));
        assert_eq!(out, MotionOutcome::Punished);

        let mut lenient = rules(DividerRule::Open);
        lenient.inverted_wall_penalty = false;
        let mut q = player_at(PlayerId::P1, 100.0, 100.0);
        q.inverted_controls = true;
        assert_eq!(resolve_motion(&mut q, 5.0, 0.0, &[wall], &lenient), MotionOutcome::Blocked);
    }

    #[test]
    fn divider_clamp_keeps_each_half() {
        let mut left = player_at(PlayerId::P1, 605.0, 300.0);
        resolve_motion(&mut left, 5.0, 0.0, &[], &rules(DividerRule::Clamp));
        assert_eq!(left.rect.right(), 640.0);

        let mut right = player_at(PlayerId::P2, 643.0, 300.0);
        resolve_motion(&mut right, -5.0, 0.0, &[], &rules(DividerRule::Clamp));
        assert_eq!(right.rect.x, 640.0);
    }

    #[test]
    fn divider_send_home_reports_crossing() {
        let mut p = player_at(PlayerId::P1, 606.0, 300.0);
        let out = resolve_motion(&mut p, 5.0, 0.0, &[], &rules(DividerRule::SendHome));
        assert_eq!(out, MotionOutcome::SentHome);
    }
}
