/// WorldState: the complete state of a running campaign.
///
/// ## Ownership
///
/// The level bundle (walls, entity definitions, goal, policy) is rebuilt
/// wholesale by `level::load_level` and never patched afterwards. Within a
/// tick, only `sim::step` writes to entities, one phase at a time:
///
///   motion → switch sampling → link aggregation → status effects →
///   dynamic walls → guards → goal → win
///
/// `links` / `signals` are this tick's aggregation results, kept so the
/// snapshot can show them.

use crate::config::{ArenaConfig, GameConfig, SimConfig};
use crate::domain::entity::{Deactivator, DynamicWall, Goal, Player, PlayerId, SyncZone};
use crate::domain::geom::{Point, Rect};
use crate::domain::guard::Guard;
use crate::domain::links::{LinkMap, SignalSet};
use crate::sim::level::{self, LevelDef};
use crate::sim::policy::LevelPolicy;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Menu,
    Playing,
    Victory,
    CampaignComplete,
}

pub struct WorldState {
    // ── Campaign ──
    pub levels: Vec<LevelDef>,
    pub current_level: usize,
    pub phase: Phase,

    // ── Level text (display only) ──
    pub level_name: String,
    pub description: String,
    pub briefing: Vec<String>,

    // ── Entities ──
    pub players: [Player; 2],
    pub walls: Vec<Rect>,
    pub guards: Vec<Guard>,
    pub deactivators: Vec<Deactivator>,
    pub sync_zones: Vec<SyncZone>,
    pub dynamic_walls: Vec<DynamicWall>,
    pub goal: Goal,
    pub policy: LevelPolicy,

    // ── This tick's network ──
    pub links: LinkMap,
    pub signals: SignalSet,

    // ── Config ──
    pub sim: SimConfig,
    pub arena: ArenaConfig,

    // ── Meta ──
    pub tick: u64,
    pub resets: u32,
    pub message: String,
    pub message_timer: u32,
}

impl WorldState {
    pub fn new(config: &GameConfig, levels: Vec<LevelDef>) -> Self {
        let size = config.sim.player_size;
        let speed = config.sim.player_speed;
        WorldState {
            levels,
            current_level: 0,
            phase: Phase::Menu,
            level_name: String::new(),
            description: String::new(),
            briefing: vec![],
            players: [
                Player::new(PlayerId::P1, Point::default(), size, speed),
                Player::new(PlayerId::P2, Point::default(), size, speed),
            ],
            walls: vec![],
            guards: vec![],
            deactivators: vec![],
            sync_zones: vec![],
            dynamic_walls: vec![],
            goal: Goal::new(Rect::default(), None, None),
            policy: LevelPolicy::default(),
            links: LinkMap::new(),
            signals: SignalSet::default(),
            sim: config.sim.clone(),
            arena: config.arena,
            tick: 0,
            resets: 0,
            message: String::new(),
            message_timer: 0,
        }
    }

    #[inline]
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    #[inline]
    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    /// The player the guards hunt.
    #[inline]
    pub fn evader(&self) -> &Player {
        self.player(PlayerId::P1)
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    pub fn tick_message(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 { self.message.clear(); }
        }
    }

    // ── Campaign control ──

    /// Reload the current level from its definition.
    pub fn restart_level(&mut self) {
        log::info!("restarting level {}", self.current_level + 1);
        level::load_level(self, self.current_level);
    }

    /// Back to level 1, parked on the menu.
    pub fn restart_campaign(&mut self) {
        log::info!("restarting campaign");
        level::load_level(self, 0);
        self.phase = Phase::Menu;
    }

    /// Next level, or campaign complete after the last one.
    pub fn advance_level(&mut self) {
        level::load_level(self, self.current_level + 1);
    }

    /// Jump to `idx` (0-based). Out-of-range jumps are ignored.
    pub fn jump_to(&mut self, idx: usize) {
        if idx < self.levels.len() {
            log::info!("jumping to level {}", idx + 1);
            level::load_level(self, idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign() -> WorldState {
        WorldState::new(&GameConfig::default(), level::builtin_levels())
    }

    #[test]
    fn starts_in_menu() {
        let world = campaign();
        assert_eq!(world.phase, Phase::Menu);
        assert_eq!(world.current_level, 0);
    }

    #[test]
    fn advancing_past_last_level_completes_campaign() {
        let mut world = campaign();
        let last = world.total_levels() - 1;
        world.jump_to(last);
        assert_eq!(world.current_level, last);
        world.advance_level();
        assert_eq!(world.phase, Phase::CampaignComplete);

        world.restart_campaign();
        assert_eq!(world.phase, Phase::Menu);
        assert_eq!(world.current_level, 0);
    }

    #[test]
    fn restart_puts_players_back() {
        let mut world = campaign();
        world.jump_to(0);
        let start = world.player(PlayerId::P1).start;
        world.player_mut(PlayerId::P1).rect.x += 40.0;
        world.resets = 3;
        world.restart_level();
        assert_eq!(world.player(PlayerId::P1).rect.top_left(), start);
        assert_eq!(world.resets, 0);
    }

    #[test]
    fn out_of_range_jump_is_ignored() {
        let mut world = campaign();
        world.jump_to(0);
        world.jump_to(99);
        assert_eq!(world.current_level, 0);
        assert_eq!(world.phase, Phase::Playing);
    }

    #[test]
    fn message_expires() {
        let mut world = campaign();
        world.set_message("hello", 2);
        world.tick_message();
        assert_eq!(world.message, "hello");
        world.tick_message();
        assert!(world.message.is_empty());
    }
}
