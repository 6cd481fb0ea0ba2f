//! Short address assignment through random address binary search
//! (IEC 62386-102 section 9.14).

use super::{Next, Sequence, SequenceError};
use crate::common::address::{Long, Short};
use crate::gear::address::Address;
use crate::gear::cmd_defs::{GearCommand, InitialiseMode};
use crate::response::Response;
use crate::utils::address_set::AddressSet;
use log::debug;
use std::collections::VecDeque;

/// One unit found on the bus and the short address it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub long: Long,
    pub short: Short,
}

#[derive(Debug, Clone)]
pub struct CommissioningOptions {
    /// Short addresses that may be handed out, lowest first
    pub pool: AddressSet,
    /// Wipe existing short addresses and renumber every unit instead
    /// of only the unaddressed ones
    pub readdress: bool,
}

impl Default for CommissioningOptions {
    fn default() -> CommissioningOptions {
        CommissioningOptions {
            pool: AddressSet::all(),
            readdress: false,
        }
    }
}

#[derive(Debug)]
enum State {
    Start,
    /// QUERY CONTROL GEAR PRESENT for `short` outstanding, to drop
    /// addresses already in use from the pool
    Scan { short: Short },
    /// COMPARE against the full search address, to see whether any
    /// unselected unit is left
    CheckRemaining,
    /// COMPARE against `probe` inside the binary search
    Search { probe: Long },
    Program { short: Short, long: Long },
    Verify { short: Short, long: Long },
    Withdrawing,
    Terminating {
        outcome: Result<Vec<Assignment>, SequenceError>,
    },
    Finished(Result<Vec<Assignment>, SequenceError>),
}

const FULL_ADDRESS: Long = 0xff_ff_ff;

/// Finds every gear in the initialisation state and assigns each a
/// short address from the pool.
///
/// Unless every unit is being readdressed, the pool is first scanned
/// with QUERY CONTROL GEAR PRESENT and addresses that answer are
/// dropped, so a unit keeping its address can never end up sharing it
/// with a newly assigned one.
///
/// Each round starts with a COMPARE at the full search address; once
/// that stays silent every unit has been withdrawn and the sequence
/// terminates successfully. Otherwise the lowest remaining random
/// address is isolated by bisection, programmed, verified and
/// withdrawn.
pub struct Commissioning {
    options: CommissioningOptions,
    state: State,
    assigned: Vec<Assignment>,
    low: Long,
    high: Long,
    /// Search address the bus currently holds, if known
    latched: Option<[u8; 3]>,
    /// Setup commands to transmit before the current state's command,
    /// replies discarded
    pending: VecDeque<GearCommand>,
    awaiting_setup: bool,
    /// Pool addresses still to be checked for units using them
    scan: VecDeque<Short>,
    steps: usize,
}

impl Commissioning {
    pub fn new(options: CommissioningOptions) -> Commissioning {
        Commissioning {
            options,
            state: State::Start,
            assigned: Vec::new(),
            low: 0,
            high: FULL_ADDRESS,
            latched: None,
            pending: VecDeque::new(),
            awaiting_setup: false,
            scan: VecDeque::new(),
            steps: 0,
        }
    }

    /// Assignments made so far, also available while the sequence is
    /// still running.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assigned
    }

    /// Queue SEARCHADDR writes for the bytes that differ from what the
    /// bus already holds.
    fn latch(&mut self, target: Long) {
        let bytes = [
            (target >> 16) as u8,
            (target >> 8) as u8,
            target as u8,
        ];
        let make = [
            GearCommand::SetSearchAddrH,
            GearCommand::SetSearchAddrM,
            GearCommand::SetSearchAddrL,
        ];
        for i in 0..3 {
            if self.latched.map(|l| l[i]) != Some(bytes[i]) {
                self.pending.push_back(make[i](bytes[i]));
            }
        }
        self.latched = Some(bytes);
    }

    fn queue_setup(&mut self) {
        self.pending.push_back(GearCommand::Terminate);
        let mode = if self.options.readdress {
            self.pending.push_back(GearCommand::Dtr0(0xff));
            self.pending
                .push_back(GearCommand::SetShortAddress(Address::Broadcast));
            InitialiseMode::All
        } else {
            InitialiseMode::NoAddress
        };
        self.pending.push_back(GearCommand::Initialise(mode));
        self.pending.push_back(GearCommand::Randomise);
    }

    /// Query the next unchecked pool address, or start the search
    /// proper once the whole pool has been checked.
    fn enter_scan(&mut self) {
        match self.scan.pop_front() {
            Some(short) => self.state = State::Scan { short },
            None => {
                debug!("available addresses: {:?}", self.options.pool);
                self.queue_setup();
                self.enter_check();
            }
        }
    }

    fn enter_check(&mut self) {
        self.low = 0;
        self.high = FULL_ADDRESS;
        self.latch(FULL_ADDRESS);
        self.state = State::CheckRemaining;
    }

    fn enter_search(&mut self) {
        let probe = self.low + (self.high - self.low) / 2;
        self.latch(probe);
        self.state = State::Search { probe };
    }

    fn enter_terminate(&mut self, outcome: Result<Vec<Assignment>, SequenceError>) {
        self.state = State::Terminating { outcome };
    }

    fn found(&mut self, long: Long) {
        // CheckRemaining guarantees the pool is not empty here
        let short = self.options.pool.lowest().unwrap();
        debug!("isolated unit {:#08x}, programming address {}", long, short);
        self.latch(long);
        self.state = State::Program { short, long };
    }

    fn handle_reply(&mut self, reply: Response) {
        match std::mem::replace(&mut self.state, State::Start) {
            State::Start => unreachable!("no command sent yet"),
            State::Scan { short } => match reply {
                Response::Ack | Response::Collision => {
                    debug!("short address {} already in use", short);
                    self.options.pool.remove(short);
                    self.enter_scan();
                }
                Response::NoAck => self.enter_scan(),
                _ => self.enter_terminate(Err(SequenceError::UnexpectedResponse)),
            },
            State::CheckRemaining => match reply {
                Response::NoAck => {
                    debug!("no units left, {} assigned", self.assigned.len());
                    self.enter_terminate(Ok(self.assigned.clone()));
                }
                Response::Ack | Response::Collision => {
                    if self.options.pool.is_empty() {
                        self.enter_terminate(Err(SequenceError::ShortAddressesExhausted {
                            assigned: self.assigned.clone(),
                        }));
                    } else {
                        self.enter_search();
                    }
                }
                _ => self.enter_terminate(Err(SequenceError::UnexpectedResponse)),
            },
            State::Search { probe } if self.low == self.high => match reply {
                // COMPARE at the isolated address itself
                Response::Ack => self.found(probe),
                Response::Collision => {
                    // Several units picked this random address. Hand
                    // out fresh ones and start the round over; units
                    // already withdrawn keep their assignments.
                    debug!("random address clash at {:#08x}, re-randomising", probe);
                    self.pending.push_back(GearCommand::Randomise);
                    self.enter_check();
                }
                Response::NoAck => self.enter_check(),
                _ => self.enter_terminate(Err(SequenceError::UnexpectedResponse)),
            },
            State::Search { probe } => {
                match reply {
                    Response::Ack | Response::Collision => self.high = probe,
                    Response::NoAck => self.low = probe + 1,
                    _ => {
                        self.enter_terminate(Err(SequenceError::UnexpectedResponse));
                        return;
                    }
                }
                self.enter_search();
            }
            State::Program { short, long } => {
                self.state = State::Verify { short, long };
            }
            State::Verify { short, long } => match reply {
                Response::Ack => {
                    self.options.pool.remove(short);
                    self.assigned.push(Assignment { long, short });
                    self.state = State::Withdrawing;
                }
                _ => self.enter_terminate(Err(SequenceError::ProgramShortAddress(short))),
            },
            State::Withdrawing => self.enter_check(),
            State::Terminating { outcome } => self.state = State::Finished(outcome),
            State::Finished(_) => unreachable!("replaced before dispatch"),
        }
    }

    fn command_for_state(&self) -> GearCommand {
        match &self.state {
            State::Scan { short } => GearCommand::QueryControlGearPresent(Address::from(*short)),
            State::CheckRemaining | State::Search { .. } => GearCommand::Compare,
            State::Program { short, .. } => GearCommand::ProgramShortAddress(Some(*short)),
            State::Verify { short, .. } => GearCommand::VerifyShortAddress(*short),
            State::Withdrawing => GearCommand::Withdraw,
            State::Terminating { .. } => GearCommand::Terminate,
            State::Start | State::Finished(_) => unreachable!("not a sending state"),
        }
    }
}

impl Sequence for Commissioning {
    type Output = Vec<Assignment>;

    fn resume(&mut self, reply: Option<Response>) -> Next<Vec<Assignment>> {
        if let State::Finished(outcome) = &self.state {
            return Next::Done(outcome.clone());
        }
        if let State::Start = self.state {
            if self.options.readdress {
                // Every address is wiped, nothing to scan for
                self.queue_setup();
                self.enter_check();
            } else {
                self.scan = self.options.pool.to_vec().into();
                self.enter_scan();
            }
        } else if self.awaiting_setup {
            // Reply to a setup command, nothing to interpret
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
            Next::Send(cmd.into(), crate::drivers::send_flags::Flags::empty())
        } else {
            Next::Send(
                self.command_for_state().into(),
                crate::drivers::send_flags::Flags::empty(),
            )
        }
    }

    fn steps_taken(&self) -> usize {
        self.steps
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct SimUnit {
        random: Long,
        short: Option<Short>,
        withdrawn: bool,
    }

    /// Minimal bus model, just enough for the commissioning commands.
    fn reply_for(units: &mut [SimUnit], search: &mut Long, cmd: &GearCommand) -> Response {
        match cmd {
            GearCommand::QueryControlGearPresent(addr) => {
                if units.iter().any(|u| u.short.map_or(false, |s| *addr == s)) {
                    Response::Ack
                } else {
                    Response::NoAck
                }
            }
            GearCommand::SetSearchAddrH(b) => {
                *search = (*search & 0x00ffff) | (Long::from(*b) << 16);
                Response::None
            }
            GearCommand::SetSearchAddrM(b) => {
                *search = (*search & 0xff00ff) | (Long::from(*b) << 8);
                Response::None
            }
            GearCommand::SetSearchAddrL(b) => {
                *search = (*search & 0xffff00) | Long::from(*b);
                Response::None
            }
            GearCommand::Compare => {
                let n = units
                    .iter()
                    .filter(|u| !u.withdrawn && u.random <= *search)
                    .count();
                match n {
                    0 => Response::NoAck,
                    1 => Response::Ack,
                    _ => Response::Collision,
                }
            }
            GearCommand::ProgramShortAddress(short) => {
                for u in units.iter_mut().filter(|u| u.random == *search) {
                    u.short = *short;
                }
                Response::None
            }
            GearCommand::VerifyShortAddress(short) => {
                if units.iter().any(|u| u.short == Some(*short)) {
                    Response::Ack
                } else {
                    Response::NoAck
                }
            }
            GearCommand::Withdraw => {
                for u in units.iter_mut().filter(|u| u.random == *search) {
                    u.withdrawn = true;
                }
                Response::None
            }
            _ => Response::None,
        }
    }

    fn run_units(
        units: &mut [SimUnit],
        options: CommissioningOptions,
    ) -> Result<Vec<Assignment>, SequenceError> {
        let mut search = 0;
        let mut seq = Commissioning::new(options);
        let mut reply = None;
        for _ in 0..200000 {
            match seq.resume(reply) {
                Next::Send(cmd, _) => {
                    let gear = match cmd {
                        crate::command::Command::Gear(g) => g,
                        c => panic!("unexpected command {:?}", c),
                    };
                    reply = Some(reply_for(units, &mut search, &gear));
                }
                Next::Done(outcome) => return outcome,
            }
        }
        panic!("sequence did not finish");
    }

    fn run(
        randoms: &[Long],
        options: CommissioningOptions,
    ) -> Result<Vec<Assignment>, SequenceError> {
        let mut units: Vec<SimUnit> = randoms
            .iter()
            .map(|r| SimUnit {
                random: *r,
                short: None,
                withdrawn: false,
            })
            .collect();
        run_units(&mut units, options)
    }

    #[test]
    fn assigns_every_unit() {
        let randoms = [0x123456, 0x000001, 0x800000];
        let assigned = run(&randoms, CommissioningOptions::default()).unwrap();
        assert_eq!(assigned.len(), 3);
        // Bisection isolates the lowest remaining random address, so
        // assignments come out in ascending order
        assert_eq!(assigned[0].long, 0x000001);
        assert_eq!(assigned[1].long, 0x123456);
        assert_eq!(assigned[2].long, 0x800000);
        for (i, a) in assigned.iter().enumerate() {
            assert_eq!(a.short, Short::new(i as u8));
        }
    }

    #[test]
    fn empty_bus() {
        let assigned = run(&[], CommissioningOptions::default()).unwrap();
        assert!(assigned.is_empty());
    }

    #[test]
    fn pool_exhaustion_keeps_assignments() {
        let options = CommissioningOptions {
            pool: AddressSet::new(&[Short::new(7)]),
            ..Default::default()
        };
        match run(&[0x000010, 0x000020], options) {
            Err(SequenceError::ShortAddressesExhausted { assigned }) => {
                assert_eq!(assigned.len(), 1);
                assert_eq!(assigned[0].long, 0x000010);
                assert_eq!(assigned[0].short, Short::new(7));
            }
            r => panic!("unexpected outcome {:?}", r),
        }
    }

    #[test]
    fn sixty_fifth_unit_exhausts_the_pool() {
        let randoms: Vec<Long> = (1..=65).map(|n| n * 0x1111).collect();
        match run(&randoms, CommissioningOptions::default()) {
            Err(SequenceError::ShortAddressesExhausted { assigned }) => {
                assert_eq!(assigned.len(), 64);
                for (i, a) in assigned.iter().enumerate() {
                    assert_eq!(a.short, Short::new(i as u8));
                }
            }
            r => panic!("unexpected outcome {:?}", r),
        }
    }

    #[test]
    fn existing_addresses_are_not_reused() {
        // The unit holding short address 0 keeps its address and never
        // enters initialisation; the pool scan has to notice it so the
        // new unit gets the next free address
        let mut units = [
            SimUnit {
                random: 0x123456,
                short: Some(Short::new(0)),
                withdrawn: true,
            },
            SimUnit {
                random: 0x000001,
                short: None,
                withdrawn: false,
            },
        ];
        let assigned = run_units(&mut units, CommissioningOptions::default()).unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].long, 0x000001);
        assert_eq!(assigned[0].short, Short::new(1));
        assert_eq!(units[0].short, Some(Short::new(0)));
        assert_eq!(units[1].short, Some(Short::new(1)));
    }

    #[test]
    fn shared_random_address_restarts_the_round() {
        // Both units pick the same random address at first; the
        // sequence has to notice the clash when the search converges
        // and issue a second RANDOMISE instead of programming both
        let mut units = vec![
            SimUnit {
                random: 0x4000,
                short: None,
                withdrawn: false,
            },
            SimUnit {
                random: 0x4000,
                short: None,
                withdrawn: false,
            },
        ];
        let mut rounds = [[0x4000, 0x4000], [0x200000, 0x100000]].into_iter();
        let mut search = 0;
        let mut seq = Commissioning::new(CommissioningOptions::default());
        let mut reply = None;
        let mut randomises = 0;
        for _ in 0..200000 {
            match seq.resume(reply) {
                Next::Send(cmd, _) => {
                    let gear = match cmd {
                        crate::command::Command::Gear(g) => g,
                        c => panic!("unexpected command {:?}", c),
                    };
                    if gear == GearCommand::Randomise {
                        randomises += 1;
                        if let Some(randoms) = rounds.next() {
                            for (u, r) in units.iter_mut().zip(randoms) {
                                if !u.withdrawn {
                                    u.random = r;
                                }
                            }
                        }
                    }
                    reply = Some(reply_for(&mut units, &mut search, &gear));
                }
                Next::Done(outcome) => {
                    let assigned = outcome.unwrap();
                    assert_eq!(randomises, 2);
                    assert_eq!(assigned.len(), 2);
                    assert_eq!(assigned[0].long, 0x100000);
                    assert_eq!(assigned[0].short, Short::new(0));
                    assert_eq!(assigned[1].long, 0x200000);
                    assert_eq!(assigned[1].short, Short::new(1));
                    return;
                }
            }
        }
        panic!("sequence did not finish");
    }

    #[test]
    fn restricted_pool_order() {
        let options = CommissioningOptions {
            pool: AddressSet::new(&[Short::new(40), Short::new(10)]),
            ..Default::default()
        };
        let assigned = run(&[0x000002, 0x000001], options).unwrap();
        assert_eq!(assigned[0].short, Short::new(10));
        assert_eq!(assigned[1].short, Short::new(40));
    }

    #[test]
    fn readdress_wipes_existing_addresses() {
        let mut seq = Commissioning::new(CommissioningOptions {
            readdress: true,
            ..Default::default()
        });
        let mut sent = Vec::new();
        let mut reply = None;
        for _ in 0..5 {
            match seq.resume(reply) {
                Next::Send(cmd, _) => sent.push(cmd),
                Next::Done(_) => break,
            }
            reply = Some(Response::None);
        }
        use crate::command::Command;
        assert_eq!(sent[0], Command::Gear(GearCommand::Terminate));
        assert_eq!(sent[1], Command::Gear(GearCommand::Dtr0(0xff)));
        assert_eq!(
            sent[2],
            Command::Gear(GearCommand::SetShortAddress(Address::Broadcast))
        );
        assert_eq!(
            sent[3],
            Command::Gear(GearCommand::Initialise(InitialiseMode::All))
        );
        assert_eq!(sent[4], Command::Gear(GearCommand::Randomise));
    }

    #[test]
    fn outcome_is_sticky() {
        let mut seq = Commissioning::new(CommissioningOptions::default());
        let mut reply = None;
        let outcome = loop {
            match seq.resume(reply) {
                Next::Send(cmd, _) => {
                    // Nothing on the bus answers
                    let raw = match cmd.response_kind() {
                        crate::response::ResponseKind::Ack => Response::NoAck,
                        _ => Response::None,
                    };
                    reply = Some(raw);
                }
                Next::Done(outcome) => break outcome,
            }
        };
        assert_eq!(outcome, Ok(vec![]));
        let steps = seq.steps_taken();
        match seq.resume(None) {
            Next::Done(again) => assert_eq!(again, outcome),
            Next::Send(c, _) => panic!("sent {:?} after finishing", c),
        }
        assert_eq!(seq.steps_taken(), steps);
    }
}
