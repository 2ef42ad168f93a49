//! Cooperative scheduler, telnet line discipline, and LED segment ownership
//! for an addressable-strip appliance.

pub mod animations;
pub mod clock;
pub mod color;
pub mod commands;
pub mod config;
pub mod error;
pub mod led;
pub mod logging;
pub mod net;
pub mod task;
pub mod telnet;
pub mod terminal;
pub mod tty;

pub use clock::Clock;
pub use config::Config;
pub use error::AppError;
pub use task::{Scheduler, Tid};
pub use tty::{Tty, TtyHandle};
