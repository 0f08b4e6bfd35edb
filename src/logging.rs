use std::env;

use log::{LevelFilter, Metadata, Record};

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        // stdout belongs to the board
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// `MINESWEEPER_LOG` wins over the command-line level when it names a valid level.
pub fn effective_level(env_level: Option<&str>, flag_level: LevelFilter) -> LevelFilter {
    env_level
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(flag_level)
}

pub fn level_from_env(flag_level: LevelFilter) -> LevelFilter {
    effective_level(env::var("MINESWEEPER_LOG").ok().as_deref(), flag_level)
}

/// Install the stderr logger. Calling it twice keeps the first logger.
pub fn init_logging(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_flags_only_when_set() {
        assert_eq!(effective_level(None, LevelFilter::Info), LevelFilter::Info);
        assert_eq!(effective_level(Some("debug"), LevelFilter::Warn), LevelFilter::Debug);
        assert_eq!(effective_level(Some("off"), LevelFilter::Trace), LevelFilter::Off);
        assert_eq!(effective_level(Some("loud"), LevelFilter::Error), LevelFilter::Error);
    }
}
