//! Task identity, lifecycle handle, and the behavior a task runs. The
//! scheduling loop itself lives in [`scheduler`]; this module only defines
//! the pieces a task author touches.

pub mod scheduler;

use std::cell::Cell;

pub use scheduler::Scheduler;

/// Table index, `0..=255`. Slot 0 is the overflow slot (see
/// [`Scheduler::spawn`]).
pub type Tid = u8;

/// What a task actually does each time the scheduler runs it. Concrete
/// tasks (the terminal, the telnet acceptor, each animation) implement
/// this; the scheduler owns the rest of the bookkeeping (`Task` in the
/// original firmware bundled both into one class — here that's the
/// data/behavior split in [`scheduler::TaskData`] vs. this trait).
pub trait TaskBehavior {
    fn run(&mut self, sched: &Scheduler, tid: Tid);
}

/// Shared exit-code cell, one per task, outliving the task itself.
/// `try_set_exit` is first-writer-wins: an explicit `exit(code)` call and
/// the scheduler's own cleanup (which defaults to 0) race to set it, and
/// whichever gets there first sticks.
#[derive(Default)]
pub struct TaskRef {
    exit_code: Cell<Option<u8>>,
}

impl TaskRef {
    pub fn new() -> Self {
        TaskRef { exit_code: Cell::new(None) }
    }

    pub fn try_set_exit(&self, code: u8) {
        if self.exit_code.get().is_none() {
            self.exit_code.set(Some(code));
        }
    }

    pub fn exit_code(&self) -> Option<u8> {
        self.exit_code.get()
    }

    pub fn is_done(&self) -> bool {
        self.exit_code.get().is_some()
    }
}
