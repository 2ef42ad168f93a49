//! Single-producer ownership over one physical pixel strip, grounded on
//! `lights.hpp`/`lights.cpp`'s `LEDSystem`/`LEDSegment`. The original ties
//! a segment's liveness to its owning `LEDSystem` through a raw back
//! pointer and an `_active` flag the system flips directly; here the
//! system instead holds an authoritative generation counter and each
//! segment remembers the generation it was born with, so revocation is
//! visible without a back-pointer (see `DESIGN.md`).

pub mod dma;

pub use dma::{DmaSink, NullDmaSink};

use std::cell::RefCell;
use std::rc::Rc;

struct LedSystemState {
    pixel_count: usize,
    generation: u64,
    buffer: Vec<u8>,
    dma: Box<dyn DmaSink>,
}

#[derive(Clone)]
pub struct LedSystem(Rc<RefCell<LedSystemState>>);

impl LedSystem {
    pub fn new(pixel_count: usize, dma: Box<dyn DmaSink>) -> Self {
        LedSystem(Rc::new(RefCell::new(LedSystemState {
            pixel_count,
            generation: 0,
            buffer: vec![0u8; pixel_count * 3],
            dma,
        })))
    }

    pub fn pixel_count(&self) -> usize {
        self.0.borrow().pixel_count
    }

    /// Deactivates whatever segment is currently issued (if any) and hands
    /// out a fresh, zeroed one.
    pub fn request_segment(&self) -> LedSegment {
        let mut state = self.0.borrow_mut();
        state.generation += 1;
        let generation = state.generation;
        let pixel_count = state.pixel_count;
        drop(state);
        LedSegment { system: self.clone(), generation, buffer: vec![0u8; pixel_count * 3] }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.0.borrow().generation == generation
    }

    fn send(&self, generation: u64, pixels: &[u8], wait: bool) {
        let mut state = self.0.borrow_mut();
        if state.generation != generation {
            return;
        }
        if wait || state.dma.is_ready() {
            state.buffer.copy_from_slice(pixels);
            let buf = state.buffer.clone();
            state.dma.update(&buf);
        }
    }
}

/// A handle granting exclusive write access to the strip until the next
/// segment is issued. `is_active` compares the segment's birth generation
/// against the system's current one; once a newer segment is requested,
/// every older handle observes `is_active() == false`.
pub struct LedSegment {
    system: LedSystem,
    generation: u64,
    buffer: Vec<u8>,
}

impl LedSegment {
    pub fn is_active(&self) -> bool {
        self.system.is_current(self.generation)
    }

    pub fn length(&self) -> usize {
        self.buffer.len() / 3
    }

    pub fn set(&mut self, idx: usize, color: (u8, u8, u8)) {
        if idx < self.length() {
            self.buffer[idx * 3] = color.0;
            self.buffer[idx * 3 + 1] = color.1;
            self.buffer[idx * 3 + 2] = color.2;
        }
    }

    pub fn get(&self, idx: usize) -> (u8, u8, u8) {
        if idx < self.length() {
            (self.buffer[idx * 3], self.buffer[idx * 3 + 1], self.buffer[idx * 3 + 2])
        } else {
            (0, 0, 0)
        }
    }

    pub fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|b| *b = 0);
    }

    /// Forwards the buffer to the DMA sink if this segment is still
    /// active. `wait=false` drops the frame if the sink isn't ready yet
    /// (frame-skipping under backpressure); `wait=true` always sends.
    pub fn send(&self, wait: bool) {
        if self.is_active() {
            self.system.send(self.generation, &self.buffer, wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_segment_revokes_the_previous_one() {
        let sys = LedSystem::new(4, Box::new(NullDmaSink::new()));
        let first = sys.request_segment();
        assert!(first.is_active());
        let second = sys.request_segment();
        assert!(!first.is_active());
        assert!(second.is_active());
    }

    #[test]
    fn send_is_noop_once_revoked() {
        let sys = LedSystem::new(2, Box::new(NullDmaSink::new()));
        let mut first = sys.request_segment();
        first.set(0, (1, 2, 3));
        let _second = sys.request_segment();
        first.send(true);
        let sys_state = sys.0.borrow();
        assert_eq!(sys_state.buffer, vec![0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn set_out_of_bounds_is_ignored() {
        let sys = LedSystem::new(2, Box::new(NullDmaSink::new()));
        let mut seg = sys.request_segment();
        seg.set(99, (9, 9, 9));
        assert_eq!(seg.get(99), (0, 0, 0));
    }

    #[test]
    fn clear_zeroes_the_buffer() {
        let sys = LedSystem::new(1, Box::new(NullDmaSink::new()));
        let mut seg = sys.request_segment();
        seg.set(0, (255, 255, 255));
        seg.clear();
        assert_eq!(seg.get(0), (0, 0, 0));
    }
}
