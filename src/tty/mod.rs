//! Uniform bidirectional byte stream with connection state — the `TTY`
//! abstraction from `tty.hpp` in the original firmware, generalized to any
//! backing stream (serial device, raw TCP socket, telnet-decorated socket,
//! or an in-memory double for tests).

pub mod stream;
pub mod tcp;

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

/// A bidirectional byte stream paired with a connection-state observer.
///
/// `poll` never blocks: it drains whatever bytes are currently available
/// and returns them. `write_bytes` reports the number of bytes the
/// underlying stream actually accepted; short writes are not retried here
/// (spec §7: "the caller is responsible for retry").
pub trait Tty {
    fn connected(&self) -> bool;
    fn close(&mut self);
    fn poll(&mut self) -> Vec<u8>;
    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize>;
    fn flush(&mut self) -> io::Result<()>;
}

pub type TtyHandle = Rc<RefCell<dyn Tty>>;

/// Write `data` to `tty`, retrying on short writes until the stream
/// accepts everything, errors, or disconnects. This is the convenience
/// layer command handlers use; [`Tty::write_bytes`] itself never retries.
pub fn write_all(tty: &TtyHandle, mut data: &[u8]) {
    while !data.is_empty() {
        let written = match tty.borrow_mut().write_bytes(data) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };
        data = &data[written..];
    }
}

pub fn print(tty: &TtyHandle, s: &str) {
    write_all(tty, s.as_bytes());
}

pub fn println(tty: &TtyHandle, s: &str) {
    write_all(tty, s.as_bytes());
    write_all(tty, b"\n");
}

/// An in-memory [`Tty`] double: bytes written by the peer under test are
/// queued in `inbox` for the task under test to [`Tty::poll`], and bytes
/// the task writes land in `outbox` for the test to inspect.
#[derive(Default)]
pub struct MemoryTty {
    pub inbox: std::collections::VecDeque<u8>,
    pub outbox: Vec<u8>,
    pub open: bool,
}

impl MemoryTty {
    pub fn new() -> Self {
        MemoryTty { inbox: Default::default(), outbox: Vec::new(), open: true }
    }

    pub fn handle(self) -> TtyHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.inbox.extend(bytes.iter().copied());
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbox)
    }
}

impl Tty for MemoryTty {
    fn connected(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn poll(&mut self) -> Vec<u8> {
        self.inbox.drain(..).collect()
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        self.outbox.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
