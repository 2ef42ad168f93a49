//! Periodic tasks that each own one [`crate::led::LedSegment`], grounded
//! on `commands.cpp`'s `LightTask` base class: every frame, check whether
//! the segment is still active (a newer `request_segment()` call
//! deactivates it implicitly) and self-exit the moment it isn't. This is
//! how `clear`/`stop`/any new animation preempts whatever ran before it,
//! without the scheduler needing to know anything about animations.

pub mod fire;
pub mod rainbow;
pub mod twinkle;

pub use fire::{FireParams, FireTask};
pub use rainbow::{RainbowParams, RainbowTask};
pub use twinkle::TwinkleTask;

use crate::led::LedSegment;
use crate::task::{Scheduler, TaskBehavior, Tid};

/// Runs `update` once per frame as long as the held segment is still the
/// current one; exits with code 0 the first frame it finds it isn't.
pub trait Animate {
    fn update(&mut self, seg: &mut LedSegment);
}

pub struct LightTask<A> {
    seg: LedSegment,
    anim: A,
}

impl<A> LightTask<A> {
    pub fn new(seg: LedSegment, anim: A) -> Self {
        LightTask { seg, anim }
    }
}

impl<A: Animate> TaskBehavior for LightTask<A> {
    fn run(&mut self, sched: &Scheduler, tid: Tid) {
        if !self.seg.is_active() {
            sched.exit(tid, 0);
            return;
        }
        self.anim.update(&mut self.seg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::led::{LedSystem, NullDmaSink};
    use crate::tty::MemoryTty;

    struct Flat;
    impl Animate for Flat {
        fn update(&mut self, seg: &mut LedSegment) {
            for i in 0..seg.length() {
                seg.set(i, (1, 2, 3));
            }
            seg.send(false);
        }
    }

    #[test]
    fn self_exits_once_segment_is_revoked() {
        let sched = Scheduler::new(Clock::new(), MemoryTty::new().handle());
        let leds = LedSystem::new(4, Box::new(NullDmaSink::new()));
        let seg = leds.request_segment();
        let tid = sched.spawn("anim", Box::new(LightTask::new(seg, Flat)));
        sched.set_active(tid, true);

        sched.tick(10_000);
        assert!(sched.is_alive(tid));

        let _new_seg = leds.request_segment();
        sched.tick(10_000);
        assert!(!sched.is_alive(tid));
    }
}
