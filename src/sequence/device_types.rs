//! Enumerating the device types a gear implements.

use super::{Next, Sequence, SequenceError};
use crate::drivers::send_flags::Flags;
use crate::gear::address::Address;
use crate::gear::cmd_defs::GearCommand;
use crate::response::Response;

/// QUERY DEVICE TYPE answers the type directly for single-type gear.
/// Multi-type gear answers MASK and the individual types are then
/// collected with QUERY NEXT DEVICE TYPE, which reports them in
/// ascending order and ends with 254.
#[derive(Debug)]
pub struct QueryDeviceTypes {
    addr: Address,
    state: State,
    types: Vec<u8>,
    steps: usize,
}

#[derive(Debug)]
enum State {
    Start,
    First,
    Iterating,
    Finished(Result<Vec<u8>, SequenceError>),
}

const NO_DEVICE_TYPE: u8 = 254;
const MULTIPLE_DEVICE_TYPES: u8 = 255;

impl QueryDeviceTypes {
    pub fn new(addr: Address) -> QueryDeviceTypes {
        QueryDeviceTypes {
            addr,
            state: State::Start,
            types: Vec::new(),
            steps: 0,
        }
    }

    fn handle_reply(&mut self, reply: Response) {
        let outcome = match (&self.state, reply) {
            (State::First, Response::Numeric(MULTIPLE_DEVICE_TYPES)) => {
                self.state = State::Iterating;
                return;
            }
            (State::First, Response::Numeric(NO_DEVICE_TYPE)) => Ok(Vec::new()),
            (State::First, Response::Numeric(t)) => Ok(vec![t]),
            (State::Iterating, Response::Numeric(NO_DEVICE_TYPE)) => {
                Ok(std::mem::take(&mut self.types))
            }
            (State::Iterating, Response::Numeric(t)) => {
                if self.types.last().map_or(true, |last| t > *last) && t < NO_DEVICE_TYPE {
                    self.types.push(t);
                    return;
                }
                Err(SequenceError::Protocol(format!(
                    "device type {} out of order",
                    t
                )))
            }
            (_, Response::NoAnswer) => Err(SequenceError::Timeout),
            (_, Response::Collision) => Err(SequenceError::Collision),
            _ => Err(SequenceError::UnexpectedResponse),
        };
        self.state = State::Finished(outcome);
    }
}

impl Sequence for QueryDeviceTypes {
    type Output = Vec<u8>;

    fn resume(&mut self, reply: Option<Response>) -> Next<Vec<u8>> {
        match &self.state {
            State::Finished(outcome) => return Next::Done(outcome.clone()),
            State::Start => self.state = State::First,
            _ => {
                if let Some(reply) = reply {
                    self.handle_reply(reply);
                }
            }
        }
        let cmd = match &self.state {
            State::Finished(outcome) => return Next::Done(outcome.clone()),
            State::First => GearCommand::QueryDeviceType(self.addr),
            State::Iterating => GearCommand::QueryNextDeviceType(self.addr),
            State::Start => unreachable!(),
        };
        self.steps += 1;
        Next::Send(cmd.into(), Flags::empty())
    }

    fn steps_taken(&self) -> usize {
        self.steps
    }
}
