//! [`Tty`] over any `Read + Write` byte stream that has no notion of its
//! own disconnection — a serial device, or the process's own stdio. This
//! is the analogue of `StreamTTY` in the original `tty.hpp`: `connected()`
//! only reflects whether [`Tty::close`] has been called locally.

use super::Tty;
use std::io::{self, Read, Write};

pub struct StreamTty<T> {
    inner: T,
    open: bool,
    scratch: [u8; 512],
}

impl<T: Read + Write> StreamTty<T> {
    pub fn new(inner: T) -> Self {
        StreamTty { inner, open: true, scratch: [0u8; 512] }
    }
}

impl<T: Read + Write> Tty for StreamTty<T> {
    fn connected(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn poll(&mut self) -> Vec<u8> {
        if !self.open {
            return Vec::new();
        }
        let mut out = Vec::new();
        loop {
            match self.inner.read(&mut self.scratch) {
                Ok(0) => {
                    self.open = false;
                    break;
                }
                Ok(n) => {
                    out.extend_from_slice(&self.scratch[..n]);
                    if n < self.scratch.len() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => break,
                Err(_) => break,
            }
        }
        out
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.open {
            return Ok(0);
        }
        match self.inner.write(data) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
