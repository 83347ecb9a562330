/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.local/share/duos`. Falls back to defaults if the file is missing,
/// unreadable or incomplete; problems are logged, never fatal.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub sim: SimConfig,
    pub arena: ArenaConfig,
    pub display: DisplayConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SimConfig {
    pub tick_rate_ms: u64,
    pub player_speed: f32,
    pub player_size: f32,
    pub freeze_ticks: u32,   // 0 = frozen until cured
}

#[derive(Clone, Copy, Debug)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    pub status_bar: f32,     // reserved strip at the top, players never enter it
}

#[derive(Clone, Copy, Debug)]
pub struct DisplayConfig {
    pub cell_width: f32,     // world units per terminal column
    pub cell_height: f32,    // world units per terminal row
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not valid config: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    sim: TomlSim,
    #[serde(default)]
    arena: TomlArena,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSim {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_speed")]
    player_speed: f32,
    #[serde(default = "default_player_size")]
    player_size: f32,
    #[serde(default = "default_freeze_ticks")]
    freeze_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlArena {
    #[serde(default = "default_arena_width")]
    width: f32,
    #[serde(default = "default_arena_height")]
    height: f32,
    #[serde(default = "default_status_bar")]
    status_bar: f32,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_cell_width")]
    cell_width: f32,
    #[serde(default = "default_cell_height")]
    cell_height: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }      // ~60 Hz
fn default_player_speed() -> f32 { 5.0 }
fn default_player_size() -> f32 { 32.0 }
fn default_freeze_ticks() -> u32 { 120 }  // 2s at 60 Hz
fn default_arena_width() -> f32 { 1280.0 }
fn default_arena_height() -> f32 { 720.0 }
fn default_status_bar() -> f32 { 60.0 }
fn default_cell_width() -> f32 { 16.0 }   // 1280 / 16 = 80 columns
fn default_cell_height() -> f32 { 24.0 }  // 720 / 24 = 30 rows
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlSim {
    fn default() -> Self {
        TomlSim {
            tick_rate_ms: default_tick_rate(),
            player_speed: default_player_speed(),
            player_size: default_player_size(),
            freeze_ticks: default_freeze_ticks(),
        }
    }
}

impl Default for TomlArena {
    fn default() -> Self {
        TomlArena {
            width: default_arena_width(),
            height: default_arena_height(),
            status_bar: default_status_bar(),
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            cell_width: default_cell_width(),
            cell_height: default_cell_height(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir() }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl ArenaConfig {
    /// Where players may stand: the arena minus the status strip.
    pub fn play_area(&self) -> crate::domain::geom::Rect {
        crate::domain::geom::Rect::new(0.0, self.status_bar, self.width, self.height - self.status_bar)
    }

    pub fn divider_x(&self) -> f32 {
        self.width / 2.0
    }
}

impl GameConfig {
    /// Load config. `explicit` (from the command line) wins over the search
    /// path. Missing file or missing keys fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let search_dirs = candidate_dirs();

        let toml_cfg = match explicit {
            Some(path) => read_config(path).unwrap_or_else(|e| {
                log::warn!("{e}; using default settings");
                TomlConfig::default()
            }),
            None => load_toml(&search_dirs),
        };

        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no filesystem search).
    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            sim: SimConfig {
                tick_rate_ms: cfg.sim.tick_rate_ms.max(1),
                player_speed: cfg.sim.player_speed,
                player_size: cfg.sim.player_size,
                freeze_ticks: cfg.sim.freeze_ticks,
            },
            arena: ArenaConfig {
                width: cfg.arena.width,
                height: cfg.arena.height,
                status_bar: cfg.arena.status_bar,
            },
            display: DisplayConfig {
                cell_width: cfg.display.cell_width.max(1.0),
                cell_height: cfg.display.cell_height.max(1.0),
            },
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/duos");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn read_config(path: &Path) -> Result<TomlConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<TomlConfig>(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// First readable, valid config.toml in the search path.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match read_config(&path) {
            Ok(cfg) => {
                log::info!("loaded config from {}", path.display());
                return cfg;
            }
            Err(e @ ConfigError::Parse { .. }) => {
                log::warn!("{e}; using default settings");
                return TomlConfig::default();
            }
            Err(e) => log::warn!("{e}"),
        }
    }
    log::debug!("no config.toml found, using defaults");
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.sim.tick_rate_ms, 16);
        assert_eq!(cfg.sim.player_speed, 5.0);
        assert_eq!(cfg.arena.width, 1280.0);
        assert_eq!(cfg.arena.status_bar, 60.0);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse("[sim]\nplayer_speed = 7.5\n[arena]\nstatus_bar = 0\n").unwrap();
        assert_eq!(cfg.sim.player_speed, 7.5);
        assert_eq!(cfg.sim.freeze_ticks, 120);
        assert_eq!(cfg.arena.status_bar, 0.0);
        assert_eq!(cfg.arena.height, 720.0);
    }

    #[test]
    fn play_area_excludes_status_strip() {
        let cfg = GameConfig::default();
        let area = cfg.arena.play_area();
        assert_eq!(area.y, 60.0);
        assert_eq!(area.bottom(), 720.0);
        assert_eq!(cfg.arena.divider_x(), 640.0);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(GameConfig::parse("[sim\nplayer_speed = ").is_err());
    }

    #[test]
    fn unreadable_explicit_path_reports_read_error() {
        let err = read_config(Path::new("/definitely/not/here/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
