//! Bring-up errors. The scheduler/terminal/command layer never uses this
//! enum: per the core's error-handling contract, in-band failures are
//! reported to the invoking TTY, not propagated as exceptions. `AppError`
//! only covers the process bring-up path in `main`.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to bind telnet listener on {addr}: {source}")]
    TelnetBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open serial device {path}: {source}")]
    SerialOpen {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
