//! RFC 854 telnet line discipline. Wraps a raw byte-stream [`Tty`] (usually
//! a [`crate::tty::tcp::TcpTty`]) and decodes/encodes on top of it: CR/LF
//! translation, IAC escaping, option negotiation with idempotence, and
//! command-code translation (Interrupt -> ^C, Erase-Char -> BS, Erase-Line
//! -> ^U). The byte-at-a-time state machine mirrors `tty.cpp`'s
//! `handleTelnet()`, restructured to consume a whole chunk at once since
//! [`Tty::poll`] is chunk-oriented rather than a lazy `Stream::read`/`peek`
//! pair.

use crate::tty::{Tty, TtyHandle};
use std::io;

const IAC: u8 = 255;
const SE: u8 = 240;
const NOP: u8 = 241;
const DATA_MARK: u8 = 242;
const BREAK: u8 = 243;
const INTERRUPT: u8 = 244;
const ABORT_OUTPUT: u8 = 245;
const AYT: u8 = 246;
const ERASE_CHAR: u8 = 247;
const ERASE_LINE: u8 = 248;
const GO_AHEAD: u8 = 249;
const SB: u8 = 250;
const WILL: u8 = 251;
const WONT: u8 = 252;
const DO: u8 = 253;
const DONT: u8 = 254;

const CR: u8 = 13;
const LF: u8 = 10;

pub const OPT_ECHO: u8 = 1;
pub const OPT_SGA: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Eol,
    Iac,
    Will,
    Wont,
    Do,
    Dont,
    Sb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Do,
    Dont,
    Will,
    Wont,
}

impl Verb {
    fn code(self) -> u8 {
        match self {
            Verb::Do => DO,
            Verb::Dont => DONT,
            Verb::Will => WILL,
            Verb::Wont => WONT,
        }
    }

    fn family(self) -> Family {
        match self {
            Verb::Do | Verb::Dont => Family::Do,
            Verb::Will | Verb::Wont => Family::Will,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Do,
    Will,
}

pub struct TelnetTty {
    inner: TtyHandle,
    state: State,
    /// (option, family, last verb sent in that family for that option)
    negotiations: Vec<(u8, Family, Verb)>,
}

impl TelnetTty {
    pub fn new(inner: TtyHandle) -> Self {
        let mut t = TelnetTty { inner, state: State::Start, negotiations: Vec::new() };
        t.send(Verb::Will, OPT_ECHO);
        t.send(Verb::Dont, OPT_ECHO);
        t.send(Verb::Will, OPT_SGA);
        t
    }

    fn send(&mut self, verb: Verb, opt: u8) {
        let family = verb.family();
        if let Some(entry) = self.negotiations.iter_mut().find(|e| e.0 == opt && e.1 == family) {
            if entry.2 == verb {
                return;
            }
            entry.2 = verb;
        } else {
            self.negotiations.push((opt, family, verb));
        }
        let wire = [IAC, verb.code(), opt];
        crate::tty::write_all(&self.inner, &wire);
    }

    fn recv_do(&mut self, opt: u8) {
        if opt == OPT_ECHO || opt == OPT_SGA {
            self.send(Verb::Will, opt);
        } else {
            self.send(Verb::Wont, opt);
        }
    }

    fn recv_dont(&mut self, opt: u8) {
        self.send(Verb::Wont, opt);
    }

    fn recv_will(&mut self, opt: u8) {
        if opt == OPT_SGA {
            self.send(Verb::Do, opt);
        } else {
            self.send(Verb::Dont, opt);
        }
    }

    fn recv_wont(&mut self, opt: u8) {
        self.send(Verb::Dont, opt);
    }

    fn decode(&mut self, raw: &[u8], out: &mut Vec<u8>) {
        for &b in raw {
            self.step(b, out);
        }
    }

    fn step(&mut self, b: u8, out: &mut Vec<u8>) {
        match self.state {
            State::Start => self.step_start(b, out),
            State::Eol => {
                match b {
                    0 => out.push(CR),
                    LF => out.push(LF),
                    _ => {
                        out.push(CR);
                        self.state = State::Start;
                        self.step_start(b, out);
                        return;
                    }
                }
                self.state = State::Start;
            }
            State::Iac => {
                match b {
                    IAC => {
                        out.push(0xFF);
                        self.state = State::Start;
                    }
                    NOP | DATA_MARK | ABORT_OUTPUT | GO_AHEAD | BREAK | SE => {
                        self.state = State::Start;
                    }
                    INTERRUPT => {
                        out.push(3);
                        self.state = State::Start;
                    }
                    AYT => {
                        crate::tty::write_all(&self.inner, &[7]);
                        log::debug!("telnet: AYT, negotiations={:?}", self.negotiations.len());
                        self.state = State::Start;
                    }
                    ERASE_CHAR => {
                        out.push(0x08);
                        self.state = State::Start;
                    }
                    ERASE_LINE => {
                        out.push(0x15);
                        self.state = State::Start;
                    }
                    WILL => self.state = State::Will,
                    WONT => self.state = State::Wont,
                    DO => self.state = State::Do,
                    DONT => self.state = State::Dont,
                    SB => self.state = State::Sb,
                    other => {
                        log::warn!("telnet: unknown IAC verb {other}");
                        self.state = State::Start;
                    }
                }
            }
            State::Will => {
                self.recv_will(b);
                self.state = State::Start;
            }
            State::Wont => {
                self.recv_wont(b);
                self.state = State::Start;
            }
            State::Do => {
                self.recv_do(b);
                self.state = State::Start;
            }
            State::Dont => {
                self.recv_dont(b);
                self.state = State::Start;
            }
            State::Sb => {
                self.state = State::Start;
            }
        }
    }

    fn step_start(&mut self, b: u8, out: &mut Vec<u8>) {
        match b {
            IAC => self.state = State::Iac,
            CR => self.state = State::Eol,
            _ => out.push(b),
        }
    }
}

impl Tty for TelnetTty {
    fn connected(&self) -> bool {
        self.inner.borrow().connected()
    }

    fn close(&mut self) {
        self.inner.borrow_mut().close();
    }

    fn poll(&mut self) -> Vec<u8> {
        let raw = self.inner.borrow_mut().poll();
        let mut out = Vec::with_capacity(raw.len());
        self.decode(&raw, &mut out);
        out
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut escaped = Vec::with_capacity(data.len() + 8);
        let mut boundaries = Vec::with_capacity(data.len());
        for &b in data {
            match b {
                b'\n' => escaped.extend_from_slice(&[CR, LF]),
                b'\r' => escaped.extend_from_slice(&[CR, 0]),
                0xFF => escaped.extend_from_slice(&[0xFF, 0xFF]),
                _ => escaped.push(b),
            }
            boundaries.push(escaped.len());
        }
        let written = self.inner.borrow_mut().write_bytes(&escaped)?;
        if written >= escaped.len() {
            return Ok(data.len());
        }
        let mut consumed = 0;
        for &boundary in &boundaries {
            if boundary <= written {
                consumed += 1;
            } else {
                break;
            }
        }
        Ok(consumed)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().flush()
    }
}
