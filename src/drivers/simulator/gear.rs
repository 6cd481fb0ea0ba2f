use crate::common::address::{Long, Short};
use crate::gear::address::Address;
use crate::gear::cmd_defs::{GearCommand, InitialiseMode};
use std::collections::{HashMap, VecDeque};

const YES: u8 = 0xff;
const MASK: u8 = 0xff;
const MAX_LEVEL: u8 = 254;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum InitialisationState {
    Disabled,
    Enabled,
    Withdrawn,
}

/// One simulated control gear. Every unit keeps its own copy of the
/// latched search address, like real gear does.
pub struct SimGear {
    short_address: Option<Short>,
    random_address: Long,
    /// Values RANDOMISE assigns, in order, instead of fresh random
    /// ones, for deterministic tests
    fixed_randoms: VecDeque<Long>,
    search_address: Long,
    initialisation: InitialisationState,
    actual_level: u8,
    groups: u16,
    dtr0: u8,
    dtr1: u8,
    dtr2: u8,
    memory_banks: HashMap<u8, Vec<u8>>,
    device_types: Vec<u8>,
    device_type_iter: usize,
}

impl SimGear {
    pub fn new() -> SimGear {
        SimGear {
            short_address: None,
            random_address: 0xff_ff_ff,
            fixed_randoms: VecDeque::new(),
            search_address: 0,
            initialisation: InitialisationState::Disabled,
            actual_level: 0,
            groups: 0,
            dtr0: 0,
            dtr1: 0,
            dtr2: 0,
            memory_banks: HashMap::new(),
            device_types: Vec::new(),
            device_type_iter: 0,
        }
    }

    /// Pin the address RANDOMISE will pick. Calling this more than
    /// once queues one address per RANDOMISE.
    pub fn with_random_address(mut self, random: Long) -> SimGear {
        if self.fixed_randoms.is_empty() {
            self.random_address = random;
        }
        self.fixed_randoms.push_back(random);
        self
    }

    pub fn with_short_address(mut self, short: Short) -> SimGear {
        self.short_address = Some(short);
        self
    }

    pub fn with_memory_bank(mut self, bank: u8, bytes: Vec<u8>) -> SimGear {
        self.memory_banks.insert(bank, bytes);
        self
    }

    pub fn with_device_types(mut self, types: Vec<u8>) -> SimGear {
        self.device_types = types;
        self
    }

    pub fn short_address(&self) -> Option<Short> {
        self.short_address
    }

    pub fn random_address(&self) -> Long {
        self.random_address
    }

    pub fn actual_level(&self) -> u8 {
        self.actual_level
    }

    fn addressed(&self, addr: &Address) -> bool {
        match addr {
            Address::Short(a) => self.short_address == Some(*a),
            Address::Group(g) => self.groups >> g.value() & 1 == 1,
            Address::Broadcast => true,
            Address::BroadcastUnaddressed => self.short_address.is_none(),
            Address::Special(_) => false,
        }
    }

    fn in_initialisation(&self) -> bool {
        self.initialisation != InitialisationState::Disabled
    }

    fn selected(&self) -> bool {
        self.in_initialisation() && self.random_address == self.search_address
    }

    /// React to one decoded command, returning the backward frame
    /// byte if this unit answers.
    pub fn react(&mut self, cmd: &GearCommand) -> Option<u8> {
        use GearCommand::*;
        match cmd {
            // Special commands are processed by every unit
            Terminate => {
                self.initialisation = InitialisationState::Disabled;
                None
            }
            Dtr0(b) => {
                self.dtr0 = *b;
                None
            }
            Dtr1(b) => {
                self.dtr1 = *b;
                None
            }
            Dtr2(b) => {
                self.dtr2 = *b;
                None
            }
            Initialise(mode) => {
                let selected = match mode {
                    InitialiseMode::All => true,
                    InitialiseMode::NoAddress => self.short_address.is_none(),
                    InitialiseMode::Address(a) => self.short_address == Some(*a),
                };
                if selected {
                    self.initialisation = InitialisationState::Enabled;
                }
                None
            }
            Randomise => {
                if self.in_initialisation() {
                    self.random_address = match self.fixed_randoms.pop_front() {
                        Some(r) => r,
                        None => rand::random::<u32>() & 0xff_ff_ff,
                    };
                }
                None
            }
            Compare => {
                if self.initialisation == InitialisationState::Enabled
                    && self.random_address <= self.search_address
                {
                    Some(YES)
                } else {
                    None
                }
            }
            Withdraw => {
                if self.selected() {
                    self.initialisation = InitialisationState::Withdrawn;
                }
                None
            }
            SetSearchAddrH(b) => {
                self.search_address = self.search_address & 0x00ffff | Long::from(*b) << 16;
                None
            }
            SetSearchAddrM(b) => {
                self.search_address = self.search_address & 0xff00ff | Long::from(*b) << 8;
                None
            }
            SetSearchAddrL(b) => {
                self.search_address = self.search_address & 0xffff00 | Long::from(*b);
                None
            }
            ProgramShortAddress(short) => {
                if self.selected() {
                    self.short_address = *short;
                }
                None
            }
            VerifyShortAddress(short) => {
                if self.in_initialisation() && self.short_address == Some(*short) {
                    Some(YES)
                } else {
                    None
                }
            }
            QueryShortAddress => {
                if self.selected() {
                    Some(match self.short_address {
                        Some(a) => a.value() << 1 | 1,
                        None => MASK,
                    })
                } else {
                    None
                }
            }
            Ping => None,

            Dapc(addr, level) => {
                if self.addressed(addr) && *level != MASK {
                    self.actual_level = *level;
                }
                None
            }
            Off(addr) => {
                if self.addressed(addr) {
                    self.actual_level = 0;
                }
                None
            }
            RecallMaxLevel(addr) => {
                if self.addressed(addr) {
                    self.actual_level = MAX_LEVEL;
                }
                None
            }
            AddToGroup(addr, group) => {
                if self.addressed(addr) {
                    self.groups |= 1 << group.value();
                }
                None
            }
            RemoveFromGroup(addr, group) => {
                if self.addressed(addr) {
                    self.groups &= !(1 << group.value());
                }
                None
            }
            SetShortAddress(addr) => {
                if self.addressed(addr) {
                    self.short_address = match self.dtr0 {
                        MASK => None,
                        b if b & 1 == 1 && b >> 1 < 64 => Some(Short::new(b >> 1)),
                        _ => self.short_address,
                    };
                }
                None
            }

            QueryStatus(addr) => self.answer(addr, || {
                let mut status = 0;
                if self.actual_level > 0 {
                    status |= 1 << 2;
                }
                if self.short_address.is_none() {
                    status |= 1 << 6;
                }
                Some(status)
            }),
            QueryControlGearPresent(addr) => self.answer(addr, || Some(YES)),
            QueryMissingShortAddress(addr) => self.answer(addr, || {
                if self.short_address.is_none() {
                    Some(YES)
                } else {
                    None
                }
            }),
            QueryActualLevel(addr) => self.answer(addr, || Some(self.actual_level)),
            QueryContentDtr0(addr) => self.answer(addr, || Some(self.dtr0)),
            QueryContentDtr1(addr) => self.answer(addr, || Some(self.dtr1)),
            QueryContentDtr2(addr) => self.answer(addr, || Some(self.dtr2)),
            QueryGroups0_7(addr) => self.answer(addr, || Some(self.groups as u8)),
            QueryGroups8_15(addr) => self.answer(addr, || Some((self.groups >> 8) as u8)),
            QueryRandomAddressH(addr) => {
                self.answer(addr, || Some((self.random_address >> 16) as u8))
            }
            QueryRandomAddressM(addr) => {
                self.answer(addr, || Some((self.random_address >> 8) as u8))
            }
            QueryRandomAddressL(addr) => self.answer(addr, || Some(self.random_address as u8)),
            QueryDeviceType(addr) => {
                if !self.addressed(addr) {
                    return None;
                }
                self.device_type_iter = 0;
                match self.device_types.len() {
                    0 => Some(254),
                    1 => Some(self.device_types[0]),
                    _ => Some(255),
                }
            }
            QueryNextDeviceType(addr) => {
                if !self.addressed(addr) {
                    return None;
                }
                let t = self.device_types.get(self.device_type_iter).copied();
                self.device_type_iter += 1;
                Some(t.unwrap_or(254))
            }
            ReadMemoryLocation(addr) => {
                if !self.addressed(addr) {
                    return None;
                }
                let b = self
                    .memory_banks
                    .get(&self.dtr1)
                    .and_then(|bank| bank.get(usize::from(self.dtr0)))
                    .copied();
                if b.is_some() {
                    self.dtr0 = self.dtr0.wrapping_add(1);
                }
                b
            }

            _ => None,
        }
    }

    fn answer(&self, addr: &Address, value: impl FnOnce() -> Option<u8>) -> Option<u8> {
        if self.addressed(addr) {
            value()
        } else {
            None
        }
    }
}

impl Default for SimGear {
    fn default() -> SimGear {
        SimGear::new()
    }
}
