/// Logging setup.
///
/// One `env_logger` backend behind the `log` facade. While the game owns the
/// terminal, records go to a file so they don't tear the frame.

use std::fs::File;
use std::path::Path;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

/// Initializes the global logger.
///
/// The terminal is in raw mode while the game runs, so records go to
/// `log_file` when one is given (stderr otherwise). `RUST_LOG` overrides the
/// default filter: `debug` with `verbose`, `info` without.
pub fn init(verbose: bool, log_file: Option<&Path>) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);

    if let Some(path) = log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("could not open log file {}: {e}", path.display()),
        }
    }

    // A logger that is already installed stays in place.
    let _ = builder.try_init();
}
