use log::{LevelFilter, warn};
use simplelog::{ColorChoice, ConfigBuilder, SimpleLogger, TerminalMode, TermLogger};

/// Installs the global logger at the given level. Logs go to the terminal, or plainly to stdout when no terminal is
/// attached. Failing to install a logger is reported and otherwise ignored.
pub fn init(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Debug)
        .set_thread_level(LevelFilter::Debug)
        .build();

    if TermLogger::init(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto).is_ok() {
        return;
    }
    if let Err(err) = SimpleLogger::init(level, config) {
        eprintln!("Could not initialize logging: {}", err);
        return;
    }
    warn!("No terminal available, logging without colors");
}
