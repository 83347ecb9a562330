/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (every `*.toml`, sorted by file name)
///   2. Built-in campaign embedded from `data/levels/`
///
/// ## Level format (`.toml`):
///   ```toml
///   name = "Level 1: Patience Protocol"
///   description = "one-line HUD text"
///   p1_start = [300, 650]
///   p2_start = [700, 350]
///   walls = [[150, 100, 20, 500]]      # x, y, w, h (border + divider added)
///
///   [goal]
///   chest = [300, 60, 40, 40]
///   key = [100, 600, 24, 24]           # optional
///   pod = [560, 80, 50, 50]            # optional
///
///   [policy]
///   divider = "clamp"                  # open | clamp | sendhome
///
///   [[guards]]
///   at = [300, 200]
///   path = [[300, 200], [500, 200]]
///   angle = 90
///   link = 1
///   speed = 0
///   fov = 40
///   range = 250
///   sweep = 1.5
///
///   [[deactivators]]
///   at = [1100, 600]
///   link = 2                           # or: signal = "trap" | "cure"
///   fake = false
///
///   [[sync_zones]]
///   at = [980, 60]
///   link = 1
///   requires_motion = false            # false = plain pressure plate
///
///   [[dynamic_walls]]
///   rect = [250, 350, 150, 20]
///   link = 1
///   owner = "left"
///   ```
///
/// Files that fail to parse or validate are logged and skipped.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::config::{ArenaConfig, GameConfig};
use crate::domain::entity::{
    Deactivator, DynamicWall, Goal, Player, PlayerId, Side, SyncZone, Trigger,
};
use crate::domain::geom::{Point, Rect};
use crate::domain::guard::{Guard, HazardStyle, DEFAULT_FOV, DEFAULT_RANGE};
use crate::domain::links::{LinkId, LinkMap, Signal, SignalSet};
use crate::sim::policy::LevelPolicy;
use crate::sim::world::{Phase, WorldState};

const BORDER: f32 = 10.0;

const BUILTIN: &[(&str, &str)] = &[
    ("01_patience.toml", include_str!("../../data/levels/01_patience.toml")),
    ("02_grid.toml", include_str!("../../data/levels/02_grid.toml")),
    ("03_interdependence.toml", include_str!("../../data/levels/03_interdependence.toml")),
    ("04_heist.toml", include_str!("../../data/levels/04_heist.toml")),
];

// ══════════════════════════════════════════════════════════════
// Level description (deserialized)
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Deserialize)]
pub struct LevelDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub briefing: Vec<String>,
    pub p1_start: [f32; 2],
    pub p2_start: [f32; 2],
    /// Add the arena border and the central divider wall.
    #[serde(default = "default_true")]
    pub base_walls: bool,
    #[serde(default)]
    pub walls: Vec<[f32; 4]>,
    #[serde(default)]
    pub guards: Vec<GuardDef>,
    #[serde(default)]
    pub deactivators: Vec<SwitchDef>,
    #[serde(default)]
    pub sync_zones: Vec<ZoneDef>,
    #[serde(default)]
    pub dynamic_walls: Vec<DynamicWallDef>,
    pub goal: GoalDef,
    #[serde(default)]
    pub policy: LevelPolicy,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GuardDef {
    pub at: [f32; 2],
    #[serde(default)]
    pub path: Vec<[f32; 2]>,
    #[serde(default)]
    pub angle: f32,
    pub link: LinkId,
    #[serde(default)]
    pub speed: f32,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_range")]
    pub range: f32,
    #[serde(default)]
    pub sweep: f32,
    #[serde(default)]
    pub style: HazardStyle,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SwitchDef {
    pub at: [f32; 2],
    #[serde(default)]
    pub link: Option<LinkId>,
    #[serde(default)]
    pub signal: Option<Signal>,
    #[serde(default)]
    pub fake: bool,
    #[serde(default = "default_presser")]
    pub presser: PlayerId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ZoneDef {
    pub at: [f32; 2],
    #[serde(default)]
    pub link: Option<LinkId>,
    #[serde(default)]
    pub signal: Option<Signal>,
    #[serde(default = "default_presser")]
    pub presser: PlayerId,
    #[serde(default = "default_true")]
    pub requires_motion: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DynamicWallDef {
    pub rect: [f32; 4],
    pub link: LinkId,
    pub owner: Side,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GoalDef {
    pub chest: [f32; 4],
    #[serde(default)]
    pub key: Option<[f32; 4]>,
    #[serde(default)]
    pub pod: Option<[f32; 4]>,
}

fn default_true() -> bool { true }
fn default_fov() -> f32 { DEFAULT_FOV }
fn default_range() -> f32 { DEFAULT_RANGE }
fn default_presser() -> PlayerId { PlayerId::P2 }

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read level {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{kind} {index} has non-positive size {w}x{h}")]
    BadRect { kind: &'static str, index: usize, w: f32, h: f32 },
    #[error("guard {index}: field of view {fov} is outside (0, 360]")]
    BadFov { index: usize, fov: f32 },
    #[error("guard {index}: {field} must not be negative (got {value})")]
    Negative { index: usize, field: &'static str, value: f32 },
    #[error("{kind} {index} must name exactly one of `link` or `signal`")]
    Trigger { kind: &'static str, index: usize },
}

fn rect(r: [f32; 4]) -> Rect {
    Rect::new(r[0], r[1], r[2], r[3])
}

fn point(p: [f32; 2]) -> Point {
    Point::new(p[0], p[1])
}

fn trigger(link: Option<LinkId>, signal: Option<Signal>) -> Option<Trigger> {
    match (link, signal) {
        (Some(id), None) => Some(Trigger::Link(id)),
        (None, Some(s)) => Some(Trigger::Signal(s)),
        _ => None,
    }
}

impl SwitchDef {
    pub fn trigger(&self) -> Option<Trigger> {
        trigger(self.link, self.signal)
    }
}

impl ZoneDef {
    pub fn trigger(&self) -> Option<Trigger> {
        trigger(self.link, self.signal)
    }
}

impl LevelDef {
    pub fn validate(&self) -> Result<(), LevelError> {
        let check_rect = |kind, index, r: [f32; 4]| {
            if r[2] > 0.0 && r[3] > 0.0 {
                Ok(())
            } else {
                Err(LevelError::BadRect { kind, index, w: r[2], h: r[3] })
            }
        };

        for (i, w) in self.walls.iter().enumerate() {
            check_rect("wall", i, *w)?;
        }
        for (i, w) in self.dynamic_walls.iter().enumerate() {
            check_rect("dynamic wall", i, w.rect)?;
        }
        check_rect("chest", 0, self.goal.chest)?;
        if let Some(k) = self.goal.key { check_rect("key", 0, k)?; }
        if let Some(p) = self.goal.pod { check_rect("pod", 0, p)?; }

        for (i, g) in self.guards.iter().enumerate() {
            if !(g.fov > 0.0 && g.fov <= 360.0) {
                return Err(LevelError::BadFov { index: i, fov: g.fov });
            }
            for (field, value) in [("speed", g.speed), ("range", g.range)] {
                if value < 0.0 {
                    return Err(LevelError::Negative { index: i, field, value });
                }
            }
        }

        for (i, d) in self.deactivators.iter().enumerate() {
            if d.trigger().is_none() {
                return Err(LevelError::Trigger { kind: "deactivator", index: i });
            }
        }
        for (i, z) in self.sync_zones.iter().enumerate() {
            if z.trigger().is_none() {
                return Err(LevelError::Trigger { kind: "sync zone", index: i });
            }
        }
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Parse and validate one level. `origin` only labels errors.
pub fn parse_level(text: &str, origin: &Path) -> Result<LevelDef, LevelError> {
    let def: LevelDef = toml::from_str(text).map_err(|source| LevelError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    def.validate()?;
    Ok(def)
}

pub fn builtin_levels() -> Vec<LevelDef> {
    BUILTIN.iter()
        .filter_map(|(name, text)| match parse_level(text, Path::new(name)) {
            Ok(def) => Some(def),
            Err(e) => {
                log::error!("built-in {e}");
                None
            }
        })
        .collect()
}

/// Every valid `*.toml` level in `dir`, sorted by file name.
pub fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<PathBuf> = entries.flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |x| x == "toml"))
        .collect();
    paths.sort();

    paths.iter()
        .filter_map(|path| {
            let loaded = std::fs::read_to_string(path)
                .map_err(|source| LevelError::Read { path: path.clone(), source })
                .and_then(|text| parse_level(&text, path));
            match loaded {
                Ok(def) => Some(def),
                Err(e) => {
                    log::warn!("skipping {e}");
                    None
                }
            }
        })
        .collect()
}

/// The campaign to play: the levels directory if it holds any valid level,
/// the built-in set otherwise.
pub fn campaign(config: &GameConfig) -> Vec<LevelDef> {
    let external = load_from_directory(&config.levels_dir);
    if external.is_empty() {
        builtin_levels()
    } else {
        log::info!("using {} levels from {}", external.len(), config.levels_dir.display());
        external
    }
}

/// Arena border plus the central divider.
pub fn base_walls(arena: &ArenaConfig, divider_x: f32) -> Vec<Rect> {
    vec![
        Rect::new(0.0, 0.0, arena.width, BORDER),
        Rect::new(0.0, arena.height - BORDER, arena.width, BORDER),
        Rect::new(0.0, 0.0, BORDER, arena.height),
        Rect::new(arena.width - BORDER, 0.0, BORDER, arena.height),
        Rect::new(divider_x - BORDER / 2.0, 0.0, BORDER, arena.height),
    ]
}

/// Load a level into the world state, replacing the previous one wholesale.
/// An index past the end completes the campaign.
pub fn load_level(world: &mut WorldState, level_idx: usize) {
    if level_idx >= world.levels.len() {
        world.phase = Phase::CampaignComplete;
        log::info!("campaign complete after {} levels", world.levels.len());
        return;
    }

    let def = world.levels[level_idx].clone();
    world.current_level = level_idx;
    world.level_name = def.name.clone();
    world.description = def.description.clone();
    world.briefing = def.briefing.clone();
    world.policy = def.policy.clone();

    let divider_x = world.policy.divider_x(&world.arena);
    world.walls = if def.base_walls { base_walls(&world.arena, divider_x) } else { vec![] };
    world.walls.extend(def.walls.iter().copied().map(rect));

    let size = world.sim.player_size;
    let speed = world.sim.player_speed;
    world.players = [
        Player::new(PlayerId::P1, point(def.p1_start), size, speed),
        Player::new(PlayerId::P2, point(def.p2_start), size, speed),
    ];

    world.guards = def.guards.iter().enumerate()
        .map(|(i, g)| {
            Guard::new(i, point(g.at), g.link)
                .with_patrol(g.path.iter().copied().map(point).collect(), g.speed)
                .with_vision(g.angle, g.fov, g.range)
                .with_sweep(g.sweep)
                .with_style(g.style)
        })
        .collect();

    world.deactivators = def.deactivators.iter()
        .filter_map(|d| Some(Deactivator::new(point(d.at), d.trigger()?, d.fake, d.presser)))
        .collect();

    world.sync_zones = def.sync_zones.iter()
        .filter_map(|z| Some(SyncZone::new(point(z.at), z.trigger()?, z.presser, z.requires_motion)))
        .collect();

    world.dynamic_walls = def.dynamic_walls.iter()
        .map(|w| DynamicWall::new(rect(w.rect), w.link, w.owner))
        .collect();

    world.goal = Goal::new(rect(def.goal.chest), def.goal.key.map(rect), def.goal.pod.map(rect));

    world.links = LinkMap::new();
    world.signals = SignalSet::default();
    world.tick = 0;
    world.resets = 0;
    world.phase = Phase::Playing;
    world.set_message(&def.name, 180);

    log::info!(
        "loaded level {}/{}: {} ({} guards, {} switches, {} zones, {} dynamic walls)",
        level_idx + 1, world.levels.len(), def.name,
        world.guards.len(), world.deactivators.len(),
        world.sync_zones.len(), world.dynamic_walls.len(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        name = "Tiny"
        p1_start = [50, 650]
        p2_start = [700, 650]
        [goal]
        chest = [500, 100, 40, 40]
    "#;

    fn world_with(levels: Vec<LevelDef>) -> WorldState {
        WorldState::new(&GameConfig::default(), levels)
    }

    #[test]
    fn builtin_campaign_parses() {
        let levels = builtin_levels();
        assert_eq!(levels.len(), BUILTIN.len());
        assert_eq!(levels[0].name, "Level 1: Patience Protocol");
        assert!(levels.iter().any(|l| l.goal.key.is_some() && l.goal.pod.is_some()));
    }

    #[test]
    fn minimal_level_gets_defaults() {
        let def = parse_level(MINIMAL, Path::new("tiny.toml")).unwrap();
        assert!(def.base_walls);
        assert!(def.guards.is_empty());
        assert!(def.goal.key.is_none());
    }

    #[test]
    fn guard_defaults_fill_missing_fields() {
        let text = format!("{MINIMAL}\n[[guards]]\nat = [1, 2]\nlink = 3\n");
        let def = parse_level(&text, Path::new("g.toml")).unwrap();
        let g = &def.guards[0];
        assert_eq!(g.fov, 60.0);
        assert_eq!(g.range, 180.0);
        assert_eq!(g.sweep, 0.0);
        assert_eq!(g.style, HazardStyle::Guard);
    }

    #[test]
    fn switch_needs_exactly_one_target() {
        let both = format!("{MINIMAL}\n[[deactivators]]\nat = [1, 2]\nlink = 3\nsignal = \"trap\"\n");
        assert!(matches!(
            parse_level(&both, Path::new("x.toml")),
            Err(LevelError::Trigger { kind: "deactivator", index: 0 })
        ));
        let neither = format!("{MINIMAL}\n[[sync_zones]]\nat = [1, 2]\n");
        assert!(matches!(
            parse_level(&neither, Path::new("x.toml")),
            Err(LevelError::Trigger { kind: "sync zone", .. })
        ));
    }

    #[test]
    fn rejects_bad_geometry_and_cones() {
        // Top-level keys must precede the [goal] header.
        let wall = MINIMAL.replace("name = \"Tiny\"", "name = \"Tiny\"\nwalls = [[0, 0, 0, 10]]");
        assert!(matches!(parse_level(&wall, Path::new("w.toml")), Err(LevelError::BadRect { .. })));

        let fov = format!("{MINIMAL}\n[[guards]]\nat = [1, 2]\nlink = 3\nfov = 0\n");
        assert!(matches!(parse_level(&fov, Path::new("f.toml")), Err(LevelError::BadFov { .. })));

        let speed = format!("{MINIMAL}\n[[guards]]\nat = [1, 2]\nlink = 3\nspeed = -1\n");
        assert!(matches!(
            parse_level(&speed, Path::new("s.toml")),
            Err(LevelError::Negative { field: "speed", .. })
        ));
    }

    #[test]
    fn unknown_side_is_a_parse_error() {
        let text = format!("{MINIMAL}\n[[dynamic_walls]]\nrect = [0, 0, 5, 5]\nlink = 1\nowner = \"middle\"\n");
        assert!(matches!(parse_level(&text, Path::new("d.toml")), Err(LevelError::Parse { .. })));
    }

    #[test]
    fn load_level_builds_entities() {
        let mut world = world_with(builtin_levels());
        load_level(&mut world, 2);
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(world.current_level, 2);
        assert_eq!(world.guards.len(), 3);
        assert_eq!(world.deactivators.iter().filter(|d| d.fake).count(), 1);
        assert_eq!(world.dynamic_walls.len(), 1);
        assert!(!world.dynamic_walls[0].open);
        // Border (4) + divider + level walls.
        assert_eq!(world.walls.len(), 5 + world.levels[2].walls.len());
    }

    #[test]
    fn interdependence_plate_only_drives_the_wall() {
        let mut world = world_with(builtin_levels());
        load_level(&mut world, 2);
        let plate = LinkId(10);
        assert_eq!(world.sync_zones[0].trigger, Trigger::Link(plate));
        assert_eq!(world.dynamic_walls[0].link, plate);
        assert!(world.guards.iter().all(|g| g.link != plate));
        assert!(world.deactivators.iter().all(|d| d.trigger != Trigger::Link(plate)));
    }

    #[test]
    fn loading_past_the_end_completes_campaign() {
        let mut world = world_with(builtin_levels());
        let n = world.total_levels();
        load_level(&mut world, n);
        assert_eq!(world.phase, Phase::CampaignComplete);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        assert!(load_from_directory(Path::new("/no/such/levels/dir")).is_empty());
    }

    #[test]
    fn divider_wall_sits_on_center_line() {
        let cfg = GameConfig::default();
        let walls = base_walls(&cfg.arena, 640.0);
        assert_eq!(walls[4], Rect::new(635.0, 0.0, 10.0, 720.0));
    }
}
