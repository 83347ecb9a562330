/// Per-level rules supplied with the level data.
///
/// Everything a level may tweak about the shared tick pipeline lives here,
/// so the pipeline itself never branches on which level is loaded.

use serde::Deserialize;

use crate::config::{ArenaConfig, SimConfig};
use crate::domain::physics::{DividerRule, MotionRules};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LevelPolicy {
    pub divider: DividerRule,
    /// Divider position; the arena's center line when absent.
    pub divider_x: Option<f32>,
    /// Wall contact while controls are inverted resets the player.
    pub inverted_wall_penalty: bool,
    /// Overrides `[sim] freeze_ticks` for this level.
    pub freeze_ticks: Option<u32>,
}

impl Default for LevelPolicy {
    fn default() -> Self {
        LevelPolicy {
            divider: DividerRule::Open,
            divider_x: None,
            inverted_wall_penalty: true,
            freeze_ticks: None,
        }
    }
}

impl LevelPolicy {
    pub fn divider_x(&self, arena: &ArenaConfig) -> f32 {
        self.divider_x.unwrap_or_else(|| arena.divider_x())
    }

    pub fn motion_rules(&self, arena: &ArenaConfig) -> MotionRules {
        MotionRules {
            play_area: arena.play_area(),
            divider: self.divider,
            divider_x: self.divider_x(arena),
            inverted_wall_penalty: self.inverted_wall_penalty,
        }
    }

    pub fn freeze_ticks(&self, sim: &SimConfig) -> u32 {
        self.freeze_ticks.unwrap_or(sim.freeze_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn missing_table_fields_use_defaults() {
        let p: LevelPolicy = toml::from_str("divider = \"sendhome\"").unwrap();
        assert_eq!(p.divider, DividerRule::SendHome);
        assert!(p.inverted_wall_penalty);
        assert!(p.freeze_ticks.is_none());
    }

    #[test]
    fn overrides_fall_back_to_config() {
        let cfg = GameConfig::default();
        let mut p = LevelPolicy::default();
        assert_eq!(p.freeze_ticks(&cfg.sim), 120);
        assert_eq!(p.divider_x(&cfg.arena), 640.0);
        p.freeze_ticks = Some(0);
        p.divider_x = Some(700.0);
        assert_eq!(p.freeze_ticks(&cfg.sim), 0);
        assert_eq!(p.motion_rules(&cfg.arena).divider_x, 700.0);
    }
}
