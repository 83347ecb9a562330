/// Entry point and game loop.

mod config;
mod domain;
mod logging;
mod sim;
mod ui;

use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use config::GameConfig;
use sim::event::GameEvent;
use sim::level;
use sim::snapshot::FrameSnapshot;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Duos & Don'ts: two players, one keyboard, one way out.
#[derive(Parser, Debug)]
#[command(name = "duos", version, about)]
struct Args {
    /// Log at debug level (RUST_LOG still wins)
    #[arg(short, long)]
    verbose: bool,

    /// Config file to use instead of searching for config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the menu and start at this level (1-based)
    #[arg(short, long)]
    level: Option<usize>,

    /// Log destination while the terminal is in raw mode
    #[arg(long, default_value = "duos.log")]
    log_file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose, Some(&args.log_file));

    let config = GameConfig::load(args.config.as_deref());
    let levels = level::campaign(&config);
    if levels.is_empty() {
        log::error!("no playable levels");
        eprintln!("No playable levels found (see {}).", args.log_file.display());
        return ExitCode::FAILURE;
    }

    let mut world = WorldState::new(&config, levels);
    if let Some(n) = args.level {
        if n == 0 || n > world.total_levels() {
            log::warn!("--level {n} is out of range (1..={})", world.total_levels());
        } else {
            world.jump_to(n - 1);
        }
    }

    install_panic_hook();
    let mut renderer = Renderer::new(&config.display, &config.arena);

    let result = match renderer.init() {
        Ok(enhanced) => guarded(|| game_loop(&mut world, &mut renderer, enhanced, &config)),
        Err(e) => Err(e.into()),
    };

    if let Err(e) = renderer.cleanup() {
        log::warn!("terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => {
            log::info!("exiting after {} resets on level {}", world.resets, world.current_level + 1);
            println!("Thanks for playing Duos & Don'ts!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("game error: {e}");
            eprintln!("Game error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Put the terminal back and log the panic. `guarded` reports it to the
/// player, so no default crash dump is printed.
fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags,
            crossterm::cursor::Show,
            crossterm::terminal::LeaveAlternateScreen
        );
        let _ = crossterm::terminal::disable_raw_mode();
        log::error!("panic: {info}");
    }));
}

/// Run `f`, turning a panic into an ordinary error.
fn guarded<F>(f: F) -> Result<(), Box<dyn Error>>
where
    F: FnOnce() -> Result<(), Box<dyn Error>>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let reason = payload.downcast_ref::<&str>().map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(format!("internal error: {reason}").into())
    })
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    enhanced_keys: bool,
    config: &GameConfig,
) -> Result<(), Box<dyn Error>> {
    let mut kb = InputState::new(enhanced_keys);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.sim.tick_rate_ms);

    loop {
        kb.drain_events()?;

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, &kb) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            match world.phase {
                Phase::Playing => {
                    let events = step::step(world, kb.frame_input());
                    log_events(&events);
                }
                Phase::Menu | Phase::Victory | Phase::CampaignComplete => world.tick_message(),
            }
            last_tick = Instant::now();
        }

        renderer.render(&FrameSnapshot::capture(world))?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn log_events(events: &[GameEvent]) {
    for e in events {
        log::debug!("event: {e:?}");
    }
}

// ── Meta keys (outside the simulation) ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Meta {
    Quit,
    Confirm,
    Restart,
    RestartCampaign,
    Jump(usize),
}

fn meta_command(key: &KeyEvent) -> Option<Meta> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Meta::Quit),
        KeyCode::Char(' ') | KeyCode::Enter => Some(Meta::Confirm),
        KeyCode::Char('R') => Some(Meta::RestartCampaign),
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::SHIFT) => Some(Meta::RestartCampaign),
        KeyCode::Char('r') => Some(Meta::Restart),
        KeyCode::F(n @ 1..=9) => Some(Meta::Jump(n as usize - 1)),
        _ => None,
    }
}

/// Returns true to quit.
fn handle_meta(world: &mut WorldState, kb: &InputState) -> bool {
    for cmd in kb.presses().iter().filter_map(meta_command) {
        if cmd == Meta::Quit {
            return true;
        }
        apply_meta(world, cmd);
    }
    false
}

fn apply_meta(world: &mut WorldState, cmd: Meta) {
    match (cmd, world.phase) {
        (Meta::Quit, _) => {}
        (Meta::Confirm | Meta::Restart, Phase::Menu) => {
            let idx = world.current_level;
            level::load_level(world, idx);
        }
        (Meta::Confirm | Meta::Restart, Phase::Victory) => world.advance_level(),
        (Meta::Confirm | Meta::Restart, Phase::CampaignComplete) => world.restart_campaign(),
        (Meta::Confirm, Phase::Playing) => {}
        (Meta::Restart, Phase::Playing) => world.restart_level(),
        (Meta::RestartCampaign, _) => world.restart_campaign(),
        (Meta::Jump(idx), _) => world.jump_to(idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn campaign() -> WorldState {
        WorldState::new(&GameConfig::default(), level::builtin_levels())
    }

    #[test]
    fn meta_keys_map_to_commands() {
        assert_eq!(meta_command(&key(KeyCode::Esc)), Some(Meta::Quit));
        assert_eq!(meta_command(&key(KeyCode::Char(' '))), Some(Meta::Confirm));
        assert_eq!(meta_command(&key(KeyCode::Char('r'))), Some(Meta::Restart));
        assert_eq!(
            meta_command(&KeyEvent::new(KeyCode::Char('R'), KeyModifiers::SHIFT)),
            Some(Meta::RestartCampaign)
        );
        assert_eq!(meta_command(&key(KeyCode::F(3))), Some(Meta::Jump(2)));
        assert_eq!(meta_command(&key(KeyCode::F(10))), None);
        assert_eq!(meta_command(&key(KeyCode::Char('w'))), None);
    }

    #[test]
    fn confirm_walks_the_campaign() {
        let mut world = campaign();
        apply_meta(&mut world, Meta::Confirm);
        assert_eq!(world.phase, Phase::Playing);
        assert_eq!(world.current_level, 0);

        // Confirm does nothing mid-level.
        apply_meta(&mut world, Meta::Confirm);
        assert_eq!(world.current_level, 0);

        world.phase = Phase::Victory;
        apply_meta(&mut world, Meta::Restart);
        assert_eq!(world.current_level, 1);
        assert_eq!(world.phase, Phase::Playing);
    }

    #[test]
    fn jump_then_restart_campaign() {
        let mut world = campaign();
        apply_meta(&mut world, Meta::Jump(2));
        assert_eq!(world.current_level, 2);
        apply_meta(&mut world, Meta::RestartCampaign);
        assert_eq!(world.current_level, 0);
        assert_eq!(world.phase, Phase::Menu);
    }

    #[test]
    fn guarded_turns_panic_into_error() {
        assert!(guarded(|| Ok(())).is_ok());

        let err = guarded(|| panic!("renderer blew up")).unwrap_err();
        assert_eq!(err.to_string(), "internal error: renderer blew up");

        let code = 7;
        let err = guarded(|| panic!("bad tick {code}")).unwrap_err();
        assert_eq!(err.to_string(), "internal error: bad tick 7");
    }

    #[test]
    fn finished_campaign_returns_to_menu() {
        let mut world = campaign();
        let last = world.total_levels() - 1;
        apply_meta(&mut world, Meta::Jump(last));
        world.phase = Phase::Victory;
        apply_meta(&mut world, Meta::Confirm);
        assert_eq!(world.phase, Phase::CampaignComplete);

        apply_meta(&mut world, Meta::Confirm);
        assert_eq!(world.phase, Phase::Menu);
        assert_eq!(world.current_level, 0);

        apply_meta(&mut world, Meta::Confirm);
        assert_eq!(world.phase, Phase::Playing);
    }
}
