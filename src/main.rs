//! `ledshelld` entry point: wires configuration, logging, the LED system,
//! the scheduler, and the two front ends (a serial terminal and a telnet
//! acceptor) together, grounded on `main.cpp`'s `setup()`/`loop()`.

use ledshell::commands::builtins::register_builtins;
use ledshell::commands::Registry;
use ledshell::led::{LedSystem, NullDmaSink};
use ledshell::net::TelnetAcceptorTask;
use ledshell::task::{Scheduler, TaskBehavior, Tid};
use ledshell::terminal::TerminalTask;
use ledshell::tty::stream::StreamTty;
use ledshell::tty::{self, TtyHandle};
use ledshell::{AppError, Clock, Config};
use std::cell::RefCell;
use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

const TICK_BUDGET_US: u64 = 2_000;
const IDLE_SLEEP: Duration = Duration::from_millis(1);
const ANNOUNCE_INTERVAL_US: u64 = 60_000_000;

/// Grounded on `main.cpp`'s `TimeSayerTask`: a non-interactive, non-background
/// interval task that prints the wall clock to the serial console once a
/// minute. It has no shell command of its own.
struct ClockAnnounceTask {
    clock: Clock,
}

impl TaskBehavior for ClockAnnounceTask {
    fn run(&mut self, sched: &Scheduler, _tid: Tid) {
        let tty = sched.current_tty();
        tty::println(&tty, &format!("[{}] tick", self.clock.prompt_time()));
    }
}

/// Glues the process's own stdin/stdout into one `Read + Write` stream so
/// it can stand in for a real UART when `--serial-port` is omitted.
struct Stdio {
    stdin: io::Stdin,
    stdout: io::Stdout,
}

impl Read for Stdio {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdin.read(buf)
    }
}

impl Write for Stdio {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stdout.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

fn open_serial_tty(config: &Config) -> Result<TtyHandle, AppError> {
    match &config.serial_port {
        Some(path) => {
            let port = serialport::new(path, config.baud)
                .timeout(Duration::from_millis(10))
                .open()
                .map_err(|source| AppError::SerialOpen { path: path.clone(), source })?;
            Ok(Rc::new(RefCell::new(StreamTty::new(port))))
        }
        None => {
            log::info!("no --serial-port given, binding the serial terminal to stdin/stdout");
            Ok(Rc::new(RefCell::new(StreamTty::new(Stdio { stdin: io::stdin(), stdout: io::stdout() }))))
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = Config::load()?;
    ledshell::logging::init(&config.log_level);
    log::info!(
        "starting ledshelld: {} pixels, serial {} @ {}, telnet on {}",
        config.pixels,
        config.serial_port.as_deref().unwrap_or("stdin/stdout"),
        config.baud,
        config.telnet_addr
    );

    let clock = Clock::new();
    let leds = LedSystem::new(config.pixels, Box::new(NullDmaSink::new()));
    let registry = Registry::new();
    register_builtins(&registry);

    let serial_tty = open_serial_tty(&config)?;
    let sched = Scheduler::new(clock.clone(), serial_tty.clone());

    let serial_terminal = TerminalTask::new(&serial_tty, registry.clone(), leds.clone(), &sched.clock());
    let serial_tid = sched.spawn("serial-terminal", Box::new(serial_terminal));
    sched.set_tty(serial_tid, serial_tty.clone());
    sched.set_active(serial_tid, true);

    let announce_tid = sched.spawn("clock-announce", Box::new(ClockAnnounceTask { clock: clock.clone() }));
    sched.set_tty(announce_tid, serial_tty);
    sched.set_interval(announce_tid, ANNOUNCE_INTERVAL_US);
    sched.set_active(announce_tid, true);

    let listener = TcpListener::bind(config.telnet_addr).map_err(|source| AppError::TelnetBind { addr: config.telnet_addr.to_string(), source })?;
    let acceptor = TelnetAcceptorTask::new(listener, registry, leds).map_err(|source| AppError::TelnetBind { addr: config.telnet_addr.to_string(), source })?;
    let acceptor_tid = sched.spawn("telnet-acceptor", Box::new(acceptor));
    sched.set_background(acceptor_tid, true);
    sched.set_waits(acceptor_tid, false);
    sched.set_active(acceptor_tid, true);

    log::info!("ledshelld ready");
    loop {
        sched.tick(TICK_BUDGET_US);
        thread::sleep(IDLE_SLEEP);
    }
}

fn main() {
    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("ledshelld: {e}");
        std::process::exit(1);
    }
}
