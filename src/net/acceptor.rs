//! Spawns a terminal task per inbound telnet connection, grounded on
//! `telnet.cpp`'s `TelnetSpawnerTask`: a task that, every tick, checks a
//! nonblocking listener for a waiting client and spawns a terminal bound
//! to it.

use crate::commands::Registry;
use crate::led::LedSystem;
use crate::task::{Scheduler, TaskBehavior, Tid};
use crate::telnet::TelnetTty;
use crate::terminal::TerminalTask;
use crate::tty::tcp::TcpTty;
use std::net::TcpListener;

pub struct TelnetAcceptorTask {
    listener: TcpListener,
    registry: Registry,
    leds: LedSystem,
}

impl TelnetAcceptorTask {
    pub fn new(listener: TcpListener, registry: Registry, leds: LedSystem) -> std::io::Result<Self> {
        listener.set_nonblocking(true)?;
        Ok(TelnetAcceptorTask { listener, registry, leds })
    }
}

impl TaskBehavior for TelnetAcceptorTask {
    fn run(&mut self, sched: &Scheduler, _tid: Tid) {
        match self.listener.accept() {
            Ok((stream, addr)) => {
                log::info!("telnet client connected from {addr}");
                let raw = match TcpTty::new(stream) {
                    Ok(raw) => raw,
                    Err(e) => {
                        log::warn!("failed to configure telnet client socket: {e}");
                        return;
                    }
                };
                let raw_handle = std::rc::Rc::new(std::cell::RefCell::new(raw));
                let client_tty = std::rc::Rc::new(std::cell::RefCell::new(TelnetTty::new(raw_handle))) as crate::tty::TtyHandle;

                let clock = sched.clock();
                let task = TerminalTask::new(&client_tty, self.registry.clone(), self.leds.clone(), &clock);
                let tid = sched.spawn("telnet-terminal", Box::new(task));
                sched.set_tty(tid, client_tty);
                sched.set_active(tid, true);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => log::warn!("telnet accept failed: {e}"),
        }
    }
}
