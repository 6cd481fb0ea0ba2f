//! Multi-step bus transactions written as explicit state machines.
//!
//! A [`Sequence`] is driven by repeatedly calling
//! [`resume`](Sequence::resume): the first call takes `None`, each
//! later call feeds back the reply to the previously requested
//! command. The machine either asks for another command to be sent or
//! finishes with a result. A finished machine stays finished.

pub mod commissioning;
pub mod device_types;
pub mod memory_bank;

use crate::command::Command;
use crate::drivers::send_flags::Flags;
use crate::response::Response;
use std::error::Error;
use std::fmt;

pub use commissioning::{Assignment, Commissioning, CommissioningOptions};
pub use device_types::QueryDeviceTypes;
pub use memory_bank::{MemoryBankDump, MemoryBankRead};

/// What the driver should do next on behalf of a sequence.
#[derive(Debug)]
pub enum Next<T> {
    /// Transmit the command with the given flags and resume with the
    /// interpreted reply
    Send(Command, Flags),
    /// The sequence has finished. Every later `resume` call returns
    /// the same outcome.
    Done(Result<T, SequenceError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SequenceError {
    /// A memory bank's declared checksum does not match its contents.
    /// The bytes read so far are included for diagnostics.
    Checksum {
        declared: u8,
        computed: u8,
        bytes: Vec<u8>,
    },
    /// A unit stayed silent where an answer was required
    Timeout,
    /// Several units answered at once where one was required
    Collision,
    /// The reply does not fit the command that was sent
    UnexpectedResponse,
    /// More units found than free short addresses. The assignments
    /// already made are kept.
    ShortAddressesExhausted { assigned: Vec<Assignment> },
    /// A unit did not confirm the short address it was just given
    ProgramShortAddress(crate::common::address::Short),
    /// The peer answered something structurally valid but wrong
    Protocol(String),
    /// The bus driver failed
    Driver(String),
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::Checksum {
                declared, computed, ..
            } => write!(
                f,
                "memory bank checksum mismatch, declared {:#04x}, computed {:#04x}",
                declared, computed
            ),
            SequenceError::Timeout => write!(f, "no answer from unit"),
            SequenceError::Collision => write!(f, "collision on bus"),
            SequenceError::UnexpectedResponse => write!(f, "unexpected response"),
            SequenceError::ShortAddressesExhausted { assigned } => write!(
                f,
                "all short addresses in use after {} assignments",
                assigned.len()
            ),
            SequenceError::ProgramShortAddress(a) => {
                write!(f, "unit did not accept short address {}", a)
            }
            SequenceError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            SequenceError::Driver(msg) => write!(f, "driver error: {}", msg),
        }
    }
}

impl Error for SequenceError {}

/// A resumable bus transaction.
pub trait Sequence {
    type Output;

    /// Advance the machine. `reply` is `None` on the first call and
    /// the interpreted reply to the last requested command afterwards.
    fn resume(&mut self, reply: Option<Response>) -> Next<Self::Output>;

    /// Commands requested so far, for progress reporting.
    fn steps_taken(&self) -> usize;
}
