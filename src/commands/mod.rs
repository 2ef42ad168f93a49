//! Name -> handler table, grounded on `terminal.cpp`'s `add_command`/
//! `lookup_command`: a linear-scanned, insertion-ordered vector with
//! replace-on-duplicate semantics, so `help` can list commands in
//! registration order without a second data structure.

pub mod builtins;

use crate::clock::Clock;
use crate::led::LedSystem;
use crate::task::Scheduler;
use std::cell::RefCell;
use std::rc::Rc;

pub type CommandFn = dyn Fn(&CommandContext, &[String]) -> i32;

/// Everything a command handler needs besides its own argv: the
/// scheduler (to spawn animation tasks, print to the invoking TTY, or
/// kill other tasks) and the LED system (to request a segment). Replaces
/// the original's `cur_tty`/`Task::current()` globals with an explicit
/// handle passed at the call site.
#[derive(Clone)]
pub struct CommandContext {
    pub scheduler: Scheduler,
    pub leds: LedSystem,
    pub registry: Registry,
}

impl CommandContext {
    pub fn clock(&self) -> Clock {
        self.scheduler.clock()
    }
}

#[derive(Clone)]
pub struct Registry {
    entries: Rc<RefCell<Vec<(String, Rc<CommandFn>)>>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { entries: Rc::new(RefCell::new(Vec::new())) }
    }

    pub fn register(&self, name: &str, f: impl Fn(&CommandContext, &[String]) -> i32 + 'static) {
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = Rc::new(f);
        } else {
            entries.push((name.to_string(), Rc::new(f)));
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<CommandFn>> {
        self.entries.borrow().iter().find(|(n, _)| n == name).map(|(_, f)| f.clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|(n, _)| n.clone()).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
