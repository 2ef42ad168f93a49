//! Bring-up configuration: CLI flags layered over an optional TOML file,
//! grounded on the ambient-stack section of the expanded spec rather than
//! anything in the original firmware (which has no config file at all —
//! its equivalents of these knobs were `#define`s). `clap` parses the
//! command line, `serde`/`toml` parse the overlay file, and a CLI value
//! always wins over the file when both are present.

use crate::error::AppError;
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ledshelld", about = "Cooperative scheduler and telnet shell for an addressable LED strip")]
struct Cli {
    /// Address the telnet shell listens on.
    #[arg(long)]
    telnet_addr: Option<SocketAddr>,

    /// Serial device the local terminal is attached to.
    #[arg(long)]
    serial_port: Option<String>,

    /// Serial baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Number of pixels on the attached strip.
    #[arg(long)]
    pixels: Option<usize>,

    /// Path to an optional TOML overlay file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// `log` level filter (error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    telnet_addr: Option<SocketAddr>,
    serial_port: Option<String>,
    baud: Option<u32>,
    pixels: Option<usize>,
    log_level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telnet_addr: SocketAddr,
    /// `None` means "no real UART" — the serial terminal binds to stdin/stdout instead.
    pub serial_port: Option<String>,
    pub baud: u32,
    pub pixels: usize,
    pub log_level: String,
}

impl Config {
    /// Parses `argv`, reads the `--config` overlay if one was given, and
    /// merges the two (CLI wins) with these built-in defaults for anything
    /// neither source supplied.
    pub fn load() -> Result<Self, AppError> {
        Self::from_args(std::env::args_os())
    }

    fn from_args<I, T>(argv: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::parse_from(argv);
        let file = match &cli.config {
            Some(path) => Self::read_file(path)?,
            None => FileConfig::default(),
        };

        Ok(Config {
            telnet_addr: cli.telnet_addr.or(file.telnet_addr).unwrap_or_else(|| "0.0.0.0:23".parse().unwrap()),
            serial_port: cli.serial_port.or(file.serial_port),
            baud: cli.baud.or(file.baud).unwrap_or(115_200),
            pixels: cli.pixels.or(file.pixels).unwrap_or(240),
            log_level: cli.log_level.or(file.log_level).unwrap_or_else(|| "info".to_string()),
        })
    }

    fn read_file(path: &Path) -> Result<FileConfig, AppError> {
        let text = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead { path: path.to_path_buf(), source })?;
        toml::from_str(&text).map_err(|source| AppError::ConfigParse { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_with_no_flags_or_file() {
        let cfg = Config::from_args(["ledshelld"]).unwrap();
        assert_eq!(cfg.pixels, 240);
        assert_eq!(cfg.baud, 115_200);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn serial_port_is_none_when_omitted() {
        let cfg = Config::from_args(["ledshelld"]).unwrap();
        assert_eq!(cfg.serial_port, None);
    }

    #[test]
    fn serial_port_flag_is_carried_through() {
        let cfg = Config::from_args(["ledshelld", "--serial-port", "/dev/ttyUSB0"]).unwrap();
        assert_eq!(cfg.serial_port.as_deref(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn cli_flag_overrides_default() {
        let cfg = Config::from_args(["ledshelld", "--pixels", "60"]).unwrap();
        assert_eq!(cfg.pixels, 60);
    }

    #[test]
    fn cli_flag_wins_over_file_value() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pixels = 30\nlog_level = \"debug\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let cfg = Config::from_args(["ledshelld", "--config", &path, "--pixels", "90"]).unwrap();
        assert_eq!(cfg.pixels, 90);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn unreadable_config_path_is_an_app_error() {
        let err = Config::from_args(["ledshelld", "--config", "/nonexistent/ledshell.toml"]).unwrap_err();
        assert!(matches!(err, AppError::ConfigRead { .. }));
    }
}
