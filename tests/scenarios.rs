//! End-to-end scenarios driving the scheduler, terminal, and LED system
//! together through an in-memory TTY, the way a real telnet/serial client
//! would see them.

use ledshell::commands::builtins::register_builtins;
use ledshell::commands::Registry;
use ledshell::led::{LedSystem, NullDmaSink};
use ledshell::task::Scheduler;
use ledshell::terminal::TerminalTask;
use ledshell::tty::MemoryTty;
use ledshell::Clock;

fn shell() -> (Scheduler, ledshell::TtyHandle, LedSystem) {
    let mem = MemoryTty::new().handle();
    let clock = Clock::new();
    let sched = Scheduler::new(clock.clone(), mem.clone());
    let leds = LedSystem::new(8, Box::new(NullDmaSink::new()));
    let registry = Registry::new();
    register_builtins(&registry);
    let task = TerminalTask::new(&mem, registry, leds.clone(), &sched.clock());
    let tid = sched.spawn("term", Box::new(task));
    sched.set_tty(tid, mem.clone());
    sched.set_active(tid, true);
    mem.borrow_mut().take_output();
    (sched, mem, leds)
}

fn type_line(sched: &Scheduler, mem: &ledshell::TtyHandle, line: &str) {
    mem.borrow_mut().feed(line.as_bytes());
    mem.borrow_mut().feed(b"\r");
    sched.tick(20_000);
}

/// A rainbow started, then stopped, should free the strip: the animation
/// task exits on its very next scheduled tick rather than lingering.
#[test]
fn rainbow_is_preempted_by_stop() {
    let (sched, mem, _leds) = shell();

    type_line(&sched, &mem, "rainbow");
    let before = sched.snapshot();
    assert!(before.iter().any(|t| t.name == "rainbow"), "rainbow task should have spawned");

    mem.borrow_mut().take_output();
    type_line(&sched, &mem, "stop");

    // the rainbow task's next interval tick observes its segment revoked
    for _ in 0..3 {
        sched.tick(50_000);
    }
    let after = sched.snapshot();
    assert!(!after.iter().any(|t| t.name == "rainbow"), "rainbow task should have self-exited once stopped");
}

/// `twinkle` run right after `rainbow` preempts it the same way `stop`
/// does — whichever animation last requested a segment owns the strip.
#[test]
fn twinkle_preempts_a_running_rainbow() {
    let (sched, mem, _leds) = shell();

    type_line(&sched, &mem, "rainbow");
    assert!(sched.snapshot().iter().any(|t| t.name == "rainbow"));

    type_line(&sched, &mem, "twinkle");
    for _ in 0..3 {
        sched.tick(50_000);
    }
    let snapshot = sched.snapshot();
    assert!(snapshot.iter().any(|t| t.name == "twinkle"));
    assert!(!snapshot.iter().any(|t| t.name == "rainbow"));
}

/// `kill -c <code> <tid>` reports the task's exit code and reaps it on
/// the next tick.
#[test]
fn kill_with_explicit_code_reaps_the_target_task() {
    let (sched, mem, _leds) = shell();

    type_line(&sched, &mem, "rainbow");
    let rainbow_tid = sched.snapshot().into_iter().find(|t| t.name == "rainbow").unwrap().tid;

    mem.borrow_mut().take_output();
    type_line(&sched, &mem, &format!("kill -c 9 {rainbow_tid}"));
    let out = String::from_utf8_lossy(&mem.borrow_mut().take_output()).into_owned();
    assert!(out.contains("Killing task"));
    assert!(out.contains("code 9"));

    sched.tick(10_000);
    assert!(!sched.is_alive(rainbow_tid));
}

/// A detached, backgrounded animation still shares its spawning
/// terminal's TTY handle, so the TTY disconnecting reaps it even though
/// it is no longer in the terminal's child list.
#[test]
fn background_animation_dies_with_its_terminal_tty() {
    let (sched, mem, _leds) = shell();

    type_line(&sched, &mem, "rainbow");
    let rainbow_tid = sched.snapshot().into_iter().find(|t| t.name == "rainbow").unwrap().tid;
    assert!(sched.is_alive(rainbow_tid));

    mem.borrow_mut().close();
    sched.tick(50_000);
    assert!(!sched.is_alive(rainbow_tid), "animation should be reaped once its shared tty disconnects");
}

/// `rgb` bypasses any running animation and paints a flat color directly,
/// which also preempts whatever animation was running (same segment
/// revocation path as `stop`).
#[test]
fn rgb_preempts_a_running_animation() {
    let (sched, mem, _leds) = shell();

    type_line(&sched, &mem, "rainbow");
    assert!(sched.snapshot().iter().any(|t| t.name == "rainbow"));

    type_line(&sched, &mem, "rgb 1 0 0");
    for _ in 0..3 {
        sched.tick(50_000);
    }
    assert!(!sched.snapshot().iter().any(|t| t.name == "rainbow"));
}
