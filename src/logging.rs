//! `log`/`simplelog` initialization. The original firmware wrote straight
//! to a serial debug port with no level filtering; here the level is an
//! operator-facing knob (`--log-level`) instead.

use log::LevelFilter;
use simplelog::{Config as LogConfig, SimpleLogger};

fn parse_level(level: &str) -> LevelFilter {
    match level.to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs the global logger. Safe to call once at process start; a
/// second call is a bug in the caller, not something this guards against.
pub fn init(level: &str) {
    let filter = parse_level(level);
    if let Err(e) = SimpleLogger::init(filter, LogConfig::default()) {
        eprintln!("logger already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_level_name_falls_back_to_info() {
        assert_eq!(parse_level("chatty"), LevelFilter::Info);
    }

    #[test]
    fn known_level_names_map_correctly() {
        assert_eq!(parse_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_level("OFF"), LevelFilter::Off);
    }
}
