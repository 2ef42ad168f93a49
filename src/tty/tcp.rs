//! [`Tty`] over a raw nonblocking [`TcpStream`] — the byte-level half of
//! what `WiFiClientTTY` did in the original firmware, before telnet
//! decoding is layered on top by [`crate::telnet::TelnetTty`].

use super::Tty;
use std::io::{self, Read, Write};
use std::net::TcpStream;

pub struct TcpTty {
    stream: TcpStream,
    open: bool,
    scratch: [u8; 1024],
}

impl TcpTty {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        let _ = stream.set_nodelay(true);
        Ok(TcpTty { stream, open: true, scratch: [0u8; 1024] })
    }
}

impl Tty for TcpTty {
    fn connected(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }

    fn poll(&mut self) -> Vec<u8> {
        if !self.open {
            return Vec::new();
        }
        let mut out = Vec::new();
        loop {
            match self.stream.read(&mut self.scratch) {
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
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(_) => {
                    self.open = false;
                    break;
                }
            }
        }
        out
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        if !self.open {
            return Ok(0);
        }
        match self.stream.write(data) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => {
                self.open = false;
                Err(e)
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
