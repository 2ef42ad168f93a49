//! Line editor + argv tokenizer + command dispatcher, grounded on
//! `terminal.cpp`'s `TerminalTask::run`/`parse_line`. Itself a
//! [`crate::task::TaskBehavior`] — every other built-in and the telnet
//! acceptor run the same way.

use crate::clock::Clock;
use crate::commands::{CommandContext, Registry};
use crate::led::LedSystem;
use crate::task::{Scheduler, TaskBehavior, Tid};
use crate::tty::{self, TtyHandle};

const MAX_INPUT_LINE: usize = 128;
const MAX_CMD_ARGS: usize = 16;

pub struct TerminalTask {
    registry: Registry,
    leds: LedSystem,
    line_buf: Vec<u8>,
    last_char: u8,
}

impl TerminalTask {
    /// `tty` must be the same handle the caller then binds via
    /// [`Scheduler::set_tty`] — the greeting below is written directly,
    /// before the task has ever been run, the same way the original
    /// constructor writes straight to its `tty` member.
    pub fn new(tty: &TtyHandle, registry: Registry, leds: LedSystem, clock: &Clock) -> Self {
        tty::print(tty, "ledshell (core 0.1.0; pixels ");
        tty::print(tty, &leds.pixel_count().to_string());
        tty::print(tty, ")\n");
        let task = TerminalTask { registry, leds, line_buf: Vec::with_capacity(MAX_INPUT_LINE), last_char: 0 };
        task.show_prompt(tty, clock);
        task
    }

    fn show_prompt(&self, tty: &TtyHandle, clock: &Clock) {
        tty::print(tty, &format!("{}> ", clock.prompt_time()));
    }

    fn commit_line(&mut self, sched: &Scheduler, tty: &TtyHandle) {
        let line = String::from_utf8_lossy(&self.line_buf).into_owned();
        self.line_buf.clear();

        let argv: Vec<String> = line.split(' ').filter(|s| !s.is_empty()).take(MAX_CMD_ARGS).map(String::from).collect();
        if argv.is_empty() {
            return;
        }

        match self.registry.lookup(&argv[0]) {
            None => tty::println(tty, &format!("command not found: {}", argv[0])),
            Some(cmd) => {
                let ctx = CommandContext { scheduler: sched.clone(), leds: self.leds.clone(), registry: self.registry.clone() };
                let code = cmd(&ctx, &argv);
                if code != 0 {
                    tty::println(tty, &format!("(error code {code})"));
                }
            }
        }
    }
}

impl TaskBehavior for TerminalTask {
    fn run(&mut self, sched: &Scheduler, tid: Tid) {
        let tty = sched.current_tty();
        let clock = sched.clock();
        let input = tty.borrow_mut().poll();

        for &c in &input {
            let was_cr = self.last_char == b'\r';
            self.last_char = c;

            match c {
                b'\n' if was_cr => continue,
                b'\n' | b'\r' | 3 => {
                    let process = (c == b'\n' || c == b'\r') && !self.line_buf.is_empty();
                    tty::print(&tty, "\n");
                    if process {
                        self.commit_line(sched, &tty);
                    }
                    self.line_buf.clear();
                    self.show_prompt(&tty, &clock);
                }
                0x08 | 0x7F => {
                    if !self.line_buf.is_empty() {
                        tty::write_all(&tty, b"\x08 \x08");
                        self.line_buf.pop();
                    }
                }
                0x20..=0x7E => {
                    if self.line_buf.len() < MAX_INPUT_LINE {
                        self.line_buf.push(c);
                        tty::write_all(&tty, &[c]);
                    }
                }
                _ => {}
            }
        }

        let _ = tid;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::builtins::register_builtins;
    use crate::led::NullDmaSink;
    use crate::tty::MemoryTty;

    fn setup() -> (Scheduler, TtyHandle, Tid) {
        let mem = MemoryTty::new().handle();
        let sched = Scheduler::new(Clock::new(), mem.clone());
        let leds = LedSystem::new(4, Box::new(NullDmaSink::new()));
        let registry = Registry::new();
        register_builtins(&registry);
        let task = TerminalTask::new(&mem, registry, leds, &sched.clock());
        let tid = sched.spawn("term", Box::new(task));
        sched.set_tty(tid, mem.clone());
        sched.set_active(tid, true);
        mem.borrow_mut().take_output();
        (sched, mem, tid)
    }

    #[test]
    fn cr_lf_is_a_single_commit() {
        let (sched, mem, _tid) = setup();
        mem.borrow_mut().feed(b"help\r\n");
        sched.tick(10_000);
        let out = String::from_utf8_lossy(&mem.borrow_mut().take_output()).into_owned();
        assert_eq!(out.matches("Commands:").count(), 1);
    }

    #[test]
    fn backspace_deletes_one_character() {
        let (sched, mem, _tid) = setup();
        mem.borrow_mut().feed(b"hz\x08elp\r");
        sched.tick(10_000);
        let out = String::from_utf8_lossy(&mem.borrow_mut().take_output()).into_owned();
        assert!(out.contains("Commands:"));
    }

    #[test]
    fn unknown_command_reports_not_found() {
        let (sched, mem, _tid) = setup();
        mem.borrow_mut().feed(b"bogus\r");
        sched.tick(10_000);
        let out = String::from_utf8_lossy(&mem.borrow_mut().take_output()).into_owned();
        assert!(out.contains("command not found: bogus"));
    }

    #[test]
    fn overflow_input_is_dropped_not_echoed_past_limit() {
        let (sched, mem, _tid) = setup();
        let long = vec![b'x'; MAX_INPUT_LINE + 20];
        mem.borrow_mut().feed(&long);
        sched.tick(10_000);
        let out = mem.borrow_mut().take_output();
        let echoed = out.iter().filter(|&&b| b == b'x').count();
        assert_eq!(echoed, MAX_INPUT_LINE);
    }

    #[test]
    fn ctrl_c_commits_empty_line_without_dispatch() {
        let (sched, mem, _tid) = setup();
        mem.borrow_mut().feed(b"he\x03");
        sched.tick(10_000);
        let out = String::from_utf8_lossy(&mem.borrow_mut().take_output()).into_owned();
        assert!(!out.contains("command not found"));
    }
}
