//! Reading a whole memory bank over DTR1/DTR0 and READ MEMORY
//! LOCATION (IEC 62386-102 section 9.10).

use super::{Next, Sequence, SequenceError};
use crate::drivers::send_flags::Flags;
use crate::gear::address::Address;
use crate::gear::cmd_defs::GearCommand;
use crate::response::Response;
use log::debug;
use std::collections::VecDeque;

/// Raw contents of one memory bank, indexed by location address.
/// Location 0 holds the address of the last accessible location,
/// location 1 the checksum over everything after it.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBankDump {
    pub bank: u8,
    pub bytes: Vec<u8>,
}

impl MemoryBankDump {
    pub fn get(&self, location: u8) -> Option<u8> {
        self.bytes.get(usize::from(location)).copied()
    }

    /// Address of the last accessible location, from location 0.
    /// `None` if the dump holds no bytes at all.
    pub fn last_location(&self) -> Option<u8> {
        self.bytes.first().copied()
    }
}

/// Checksum as stored in location 1: the low byte of the sum of all
/// locations from 2 up to and including the last accessible one.
pub fn bank_checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .skip(2)
        .fold(0u8, |sum, b| sum.wrapping_add(*b))
}

const READ_ATTEMPTS: u8 = 3;

#[derive(Debug)]
enum State {
    Start,
    /// READ MEMORY LOCATION for `location` outstanding
    Reading { location: u8, attempts_left: u8 },
    Finished(Result<MemoryBankDump, SequenceError>),
}

/// Reads every accessible location of one memory bank of a single
/// unit and verifies the declared checksum. A silent unit gets the
/// DTR0 write and read reissued twice before the sequence gives up.
pub struct MemoryBankRead {
    addr: Address,
    bank: u8,
    bytes: Vec<u8>,
    state: State,
    pending: VecDeque<GearCommand>,
    awaiting_setup: bool,
    steps: usize,
}

impl MemoryBankRead {
    pub fn new(addr: Address, bank: u8) -> MemoryBankRead {
        MemoryBankRead {
            addr,
            bank,
            bytes: Vec::new(),
            state: State::Start,
            pending: VecDeque::new(),
            awaiting_setup: false,
            steps: 0,
        }
    }

    fn start_read(&mut self, location: u8, attempts_left: u8) {
        self.pending.push_back(GearCommand::Dtr0(location));
        self.state = State::Reading {
            location,
            attempts_left,
        };
    }

    fn finish(&mut self) {
        let declared = self.bytes[1];
        let computed = bank_checksum(&self.bytes);
        if declared == computed {
            self.state = State::Finished(Ok(MemoryBankDump {
                bank: self.bank,
                bytes: std::mem::take(&mut self.bytes),
            }));
        } else {
            self.state = State::Finished(Err(SequenceError::Checksum {
                declared,
                computed,
                bytes: std::mem::take(&mut self.bytes),
            }));
        }
    }

    fn handle_reply(&mut self, reply: Response) {
        let (location, attempts_left) = match &self.state {
            State::Reading {
                location,
                attempts_left,
            } => (*location, *attempts_left),
            _ => unreachable!("reply outside a read"),
        };
        match reply {
            Response::Numeric(b) => {
                debug!("bank {} location {}: {:#04x}", self.bank, location, b);
                self.bytes.push(b);
                let last = self.bytes[0];
                if location >= last {
                    if self.bytes.len() < 2 {
                        // Bank declares no checksum location
                        self.state = State::Finished(Ok(MemoryBankDump {
                            bank: self.bank,
                            bytes: std::mem::take(&mut self.bytes),
                        }));
                    } else {
                        self.finish();
                    }
                } else {
                    self.start_read(location + 1, READ_ATTEMPTS);
                }
            }
            Response::NoAnswer if attempts_left > 1 => {
                debug!(
                    "bank {} location {} silent, {} attempts left",
                    self.bank,
                    location,
                    attempts_left - 1
                );
                self.start_read(location, attempts_left - 1);
            }
            Response::NoAnswer => self.state = State::Finished(Err(SequenceError::Timeout)),
            Response::Collision => self.state = State::Finished(Err(SequenceError::Collision)),
            _ => self.state = State::Finished(Err(SequenceError::UnexpectedResponse)),
        }
    }
}

impl Sequence for MemoryBankRead {
    type Output = MemoryBankDump;

    fn resume(&mut self, reply: Option<Response>) -> Next<MemoryBankDump> {
        if let State::Finished(outcome) = &self.state {
            return Next::Done(outcome.clone());
        }
        if let State::Start = self.state {
            self.pending.push_back(GearCommand::Dtr1(self.bank));
            self.start_read(0, READ_ATTEMPTS);
        } else if self.awaiting_setup {
            self.awaiting_setup = false;
        } else if let Some(reply) = reply {
            self.handle_reply(reply);
        }
        if let State::Finished(outcome) = &self.state {
            return Next::Done(outcome.clone());
        }
        self.steps += 1;
        if let Some(cmd) = self.pending.pop_front() {
            self.awaiting_setup = true;
            Next::Send(cmd.into(), Flags::empty())
        } else {
            Next::Send(
                GearCommand::ReadMemoryLocation(self.addr).into(),
                Flags::empty(),
            )
        }
    }

    fn steps_taken(&self) -> usize {
        self.steps
    }
}
