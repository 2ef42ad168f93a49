//! The round-robin tick loop and the 256-slot task table, grounded on
//! `task.cpp`'s `Task::run_tasks`/`task_list`. A task's mutable data
//! (`TaskData`) and its behavior (`Box<dyn TaskBehavior>`) live in two
//! parallel tables inside one `RefCell` so that `run` can be taken out,
//! invoked without holding any borrow on the scheduler, and reinserted —
//! a task is free to spawn, kill, or inspect any other task (including
//! itself) from inside its own `run` without tripping `already borrowed`.

use super::{TaskBehavior, TaskRef, Tid};
use crate::clock::Clock;
use crate::tty::TtyHandle;
use std::cell::RefCell;
use std::rc::Rc;

const SLOTS: usize = 256;

pub struct TaskData {
    name: String,
    tty: TtyHandle,
    active: bool,
    background: bool,
    waits: bool,
    interval: u64,
    scheduled: u64,
    deathmark: bool,
    ms_cost: u64,
    ms_late: u64,
    parent: Option<Tid>,
    children: Vec<Tid>,
    task_ref: Rc<TaskRef>,
}

/// A point-in-time copy of one task's bookkeeping, for the `tasks` command.
pub struct TaskSnapshot {
    pub tid: Tid,
    pub name: String,
    pub active: bool,
    pub background: bool,
    pub waits: bool,
    pub parent: Option<Tid>,
    pub interval: u64,
    pub scheduled: u64,
    pub tty: TtyHandle,
    pub ms_cost: u64,
    pub ms_late: u64,
}

struct SchedulerInner {
    data: Vec<Option<TaskData>>,
    behavior: Vec<Option<Box<dyn TaskBehavior>>>,
    next_tid: Tid,
    current_tid: Option<Tid>,
    current_tty: TtyHandle,
    clock: Clock,
}

/// A cheap, cloneable handle onto the scheduler. Task behaviors receive
/// one of these on every `run` call and use it in place of the original
/// firmware's `cur_tty`/`Task::current()` globals.
#[derive(Clone)]
pub struct Scheduler(Rc<RefCell<SchedulerInner>>);

impl Scheduler {
    pub fn new(clock: Clock, root_tty: TtyHandle) -> Self {
        let mut data = Vec::with_capacity(SLOTS);
        let mut behavior = Vec::with_capacity(SLOTS);
        for _ in 0..SLOTS {
            data.push(None);
            behavior.push(None);
        }
        Scheduler(Rc::new(RefCell::new(SchedulerInner {
            data,
            behavior,
            next_tid: 0,
            current_tid: None,
            current_tty: root_tty,
            clock,
        })))
    }

    pub fn current_tid(&self) -> Option<Tid> {
        self.0.borrow().current_tid
    }

    pub fn current_tty(&self) -> TtyHandle {
        self.0.borrow().current_tty.clone()
    }

    pub fn clock(&self) -> Clock {
        self.0.borrow().clock.clone()
    }

    pub fn task_ref(&self, tid: Tid) -> Option<Rc<TaskRef>> {
        self.0.borrow().data[tid as usize].as_ref().map(|d| d.task_ref.clone())
    }

    pub fn name_of(&self, tid: Tid) -> Option<String> {
        self.0.borrow().data[tid as usize].as_ref().map(|d| d.name.clone())
    }

    pub fn is_alive(&self, tid: Tid) -> bool {
        self.0.borrow().data[tid as usize].is_some()
    }

    /// Register a new task as a child of the currently-running task (if
    /// any), bound to the current ambient TTY. The task starts inactive;
    /// the caller configures it (`set_active`, `set_interval`, ...) before
    /// it ever runs.
    pub fn spawn(&self, name: impl Into<String>, behavior: Box<dyn TaskBehavior>) -> Tid {
        let (parent, tty) = {
            let inner = self.0.borrow();
            (inner.current_tid, inner.current_tty.clone())
        };
        let tid = self.allocate_slot();
        let data = TaskData {
            name: name.into(),
            tty,
            active: false,
            background: false,
            waits: true,
            interval: 0,
            scheduled: 0,
            deathmark: false,
            ms_cost: 0,
            ms_late: 0,
            parent,
            children: Vec::new(),
            task_ref: Rc::new(TaskRef::new()),
        };
        let mut inner = self.0.borrow_mut();
        inner.data[tid as usize] = Some(data);
        inner.behavior[tid as usize] = Some(behavior);
        if let Some(p) = parent {
            if let Some(pdata) = &mut inner.data[p as usize] {
                pdata.children.push(tid);
            }
        }
        tid
    }

    fn allocate_slot(&self) -> Tid {
        {
            let inner = self.0.borrow();
            for tid in 1..=255u8 {
                if inner.data[tid as usize].is_none() {
                    return tid;
                }
            }
        }
        self.destroy(0);
        0
    }

    pub fn detach(&self, tid: Tid) {
        let parent = {
            let mut inner = self.0.borrow_mut();
            match &mut inner.data[tid as usize] {
                Some(data) => data.parent.take(),
                None => return,
            }
        };
        if let Some(p) = parent {
            let mut inner = self.0.borrow_mut();
            if let Some(pdata) = &mut inner.data[p as usize] {
                pdata.children.retain(|&c| c != tid);
            }
        }
    }

    pub fn set_tty(&self, tid: Tid, tty: TtyHandle) {
        if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
            data.tty = tty;
        }
    }

    pub fn set_background(&self, tid: Tid, background: bool) {
        if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
            data.background = background;
        }
    }

    pub fn set_waits(&self, tid: Tid, waits: bool) {
        if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
            data.waits = waits;
        }
    }

    pub fn set_interval(&self, tid: Tid, interval_us: u64) {
        let now = self.0.borrow().clock.now_us();
        if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
            data.interval = interval_us;
            if interval_us > 0 {
                data.scheduled = now + interval_us;
            }
        }
    }

    pub fn set_interval_fps(&self, tid: Tid, fps: f64) {
        self.set_interval(tid, (1_000_000.0 / fps) as u64);
    }

    /// Re-arms `scheduled` when flipping an interval task from inactive to
    /// active, so a just-activated periodic task does not fire on the very
    /// next tick.
    pub fn set_active(&self, tid: Tid, active: bool) {
        let rearm_interval = {
            let inner = self.0.borrow();
            match &inner.data[tid as usize] {
                Some(data) if active && !data.active => Some(data.interval),
                _ => None,
            }
        };
        if let Some(interval) = rearm_interval {
            self.set_interval(tid, interval);
        }
        if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
            data.active = active;
        }
    }

    /// Records the exit code (first writer wins) and marks the task for
    /// reaping on the scheduler's next visit to its slot.
    pub fn exit(&self, tid: Tid, code: u8) {
        if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
            data.task_ref.try_set_exit(code);
            data.deathmark = true;
        }
    }

    pub fn kill_current(&self) {
        if let Some(tid) = self.current_tid() {
            if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
                data.deathmark = true;
            }
        }
    }

    pub fn snapshot(&self) -> Vec<TaskSnapshot> {
        let inner = self.0.borrow();
        inner
            .data
            .iter()
            .enumerate()
            .filter_map(|(tid, slot)| {
                slot.as_ref().map(|d| TaskSnapshot {
                    tid: tid as Tid,
                    name: d.name.clone(),
                    active: d.active,
                    background: d.background,
                    waits: d.waits,
                    parent: d.parent,
                    interval: d.interval,
                    scheduled: d.scheduled,
                    tty: d.tty.clone(),
                    ms_cost: d.ms_cost,
                    ms_late: d.ms_late,
                })
            })
            .collect()
    }

    fn destroy(&self, tid: Tid) {
        let (children, parent, task_ref) = {
            let inner = self.0.borrow();
            match &inner.data[tid as usize] {
                None => return,
                Some(d) => (d.children.clone(), d.parent, d.task_ref.clone()),
            }
        };
        for child in children {
            self.destroy(child);
        }
        if let Some(p) = parent {
            let mut inner = self.0.borrow_mut();
            if let Some(pdata) = &mut inner.data[p as usize] {
                pdata.children.retain(|&c| c != tid);
            }
        }
        {
            let mut inner = self.0.borrow_mut();
            inner.data[tid as usize] = None;
            inner.behavior[tid as usize] = None;
        }
        task_ref.try_set_exit(0);
    }

    fn should_die(inner: &SchedulerInner, tid: Tid) -> bool {
        match &inner.data[tid as usize] {
            None => false,
            Some(data) => data.deathmark || (!data.background && !data.tty.borrow().connected()),
        }
    }

    fn should_run(inner: &SchedulerInner, tid: Tid, now: u64) -> bool {
        let data = match &inner.data[tid as usize] {
            None => return false,
            Some(data) => data,
        };
        if !data.active {
            return false;
        }
        if data.waits {
            for &child_tid in &data.children {
                if let Some(child) = &inner.data[child_tid as usize] {
                    if !child.background && child.interval == 0 && child.active {
                        return false;
                    }
                }
            }
        }
        if data.interval > 0 && data.scheduled > now {
            return false;
        }
        true
    }

    fn reschedule(&self, tid: Tid) {
        let now = self.0.borrow().clock.now_us();
        if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
            if data.interval > 0 {
                loop {
                    data.scheduled += data.interval;
                    if data.scheduled > now {
                        break;
                    }
                }
            }
        }
    }

    fn visit(&self, tid: Tid, now: u64, outer_tty: &TtyHandle) {
        let (die, run) = {
            let inner = self.0.borrow();
            let die = Self::should_die(&inner, tid);
            let run = !die && Self::should_run(&inner, tid, now);
            (die, run)
        };
        if die {
            self.destroy(tid);
            return;
        }
        if !run {
            return;
        }

        {
            let mut inner = self.0.borrow_mut();
            if let Some(data) = &mut inner.data[tid as usize] {
                if data.interval > 0 {
                    let late = now.saturating_sub(data.scheduled) / 1024;
                    data.ms_late = data.ms_late.max(late);
                }
            }
        }

        let behavior = self.0.borrow_mut().behavior[tid as usize].take();
        let mut behavior = match behavior {
            Some(b) => b,
            None => return,
        };

        let task_tty = match &self.0.borrow().data[tid as usize] {
            Some(data) => data.tty.clone(),
            None => return,
        };
        {
            let mut inner = self.0.borrow_mut();
            inner.current_tty = task_tty;
            inner.current_tid = Some(tid);
        }

        behavior.run(self, tid);

        {
            let mut inner = self.0.borrow_mut();
            if inner.data[tid as usize].is_some() {
                inner.behavior[tid as usize] = Some(behavior);
            }
            inner.current_tid = None;
            inner.current_tty = outer_tty.clone();
        }

        self.reschedule(tid);

        let run_end = self.0.borrow().clock.now_us();
        if let Some(data) = &mut self.0.borrow_mut().data[tid as usize] {
            let this_ms = run_end.saturating_sub(now) / 1024;
            if data.interval > 0 {
                data.ms_cost = this_ms;
            } else {
                data.ms_cost += this_ms;
            }
        }
    }

    /// Run active tasks round-robin, once through at most, for at most
    /// `budget_us` microseconds.
    pub fn tick(&self, budget_us: u64) {
        let start = self.0.borrow().clock.now_us();
        let start_tid = self.0.borrow().next_tid;
        let outer_tty = self.0.borrow().current_tty.clone();
        let mut now = start;
        loop {
            let tid = {
                let mut inner = self.0.borrow_mut();
                let t = inner.next_tid;
                inner.next_tid = inner.next_tid.wrapping_add(1);
                t
            };
            self.visit(tid, now, &outer_tty);
            now = self.0.borrow().clock.now_us();
            let wrapped = self.0.borrow().next_tid == start_tid;
            if now.saturating_sub(start) >= budget_us || wrapped {
                break;
            }
        }
    }
}
