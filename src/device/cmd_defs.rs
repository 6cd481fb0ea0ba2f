use crate::common::address::Short;
use crate::device::address::{Address, Special};
use crate::frame::Frame;
use crate::response::ResponseKind;

/// Instance byte addressing the device itself rather than one of its
/// instances (IEC 62386-103 section 7.2.2).
const INSTANCE_DEVICE: u8 = 0xfe;

/// Operand of the device INITIALISE special command. Unlike the 16 bit
/// command set the short address operand is carried unshifted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InitialiseMode {
    All,
    NoAddress,
    Address(Short),
}

impl InitialiseMode {
    fn operand(&self) -> u8 {
        match self {
            InitialiseMode::All => 0xff,
            InitialiseMode::NoAddress => 0x7f,
            InitialiseMode::Address(a) => a.value(),
        }
    }

    fn from_operand(b: u8) -> Option<InitialiseMode> {
        match b {
            0xff => Some(InitialiseMode::All),
            0x7f => Some(InitialiseMode::NoAddress),
            0x00..=0x3f => Some(InitialiseMode::Address(Short::new(b))),
            _ => None,
        }
    }
}

/// Control device commands transmitted as 24 bit forward frames
/// (IEC 62386-103 section 11). Same total decode contract as the 16
/// bit catalog.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DeviceCommand {
    IdentifyDevice(Address),
    Reset(Address),
    QueryDeviceStatus(Address),
    QueryContentDtr0(Address),
    QueryVersionNumber(Address),
    QueryRandomAddressH(Address),
    QueryRandomAddressM(Address),
    QueryRandomAddressL(Address),
    ReadMemoryLocation(Address),

    Terminate,
    Initialise(InitialiseMode),
    Randomise,
    Compare,
    Withdraw,
    SetSearchAddrH(u8),
    SetSearchAddrM(u8),
    SetSearchAddrL(u8),
    /// `None` clears the short address (MASK operand)
    ProgramShortAddress(Option<Short>),
    VerifyShortAddress(Short),
    QueryShortAddress,
    WriteMemoryLocation(u8),
    WriteMemoryLocationNoReply(u8),
    Dtr0(u8),
    Dtr1(u8),
    Dtr2(u8),

    /// Write one byte to the memory location addressed by DTR1/DTR0
    /// without a preceding ENABLE WRITE MEMORY, operands offset and
    /// value
    DirectWriteMemory(u8, u8),
    /// Load DTR1 and DTR0 in a single frame
    Dtr1Dtr0(u8, u8),
    /// Load DTR2 and DTR1 in a single frame
    Dtr2Dtr1(u8, u8),

    /// Frame with no matching catalog entry, kept verbatim. This
    /// includes all event messages and instance addressed commands.
    Unknown(Frame),
}

use DeviceCommand::*;

impl DeviceCommand {
    /// Decode a 24 bit forward frame. Total; never fails.
    pub fn decode(frame: Frame) -> DeviceCommand {
        let Frame::Forward24([a, inst, op]) = frame else {
            return Unknown(frame);
        };
        let decoded = match Address::from_address_byte(a) {
            Address::Special(Special::Command) => Self::decode_special(inst, op),
            Address::Special(Special::DirectWriteMemory) => Some(DirectWriteMemory(inst, op)),
            Address::Special(Special::Dtr1Dtr0) => Some(Dtr1Dtr0(inst, op)),
            Address::Special(Special::Dtr2Dtr1) => Some(Dtr2Dtr1(inst, op)),
            Address::Special(Special::Reserved(_)) => None,
            addr if inst == INSTANCE_DEVICE => Self::decode_opcode(addr, op),
            _ => None,
        };
        decoded.unwrap_or(Unknown(frame))
    }

    fn decode_special(cmd: u8, b: u8) -> Option<DeviceCommand> {
        Some(match cmd {
            0x00 => Terminate,
            0x01 => Initialise(InitialiseMode::from_operand(b)?),
            0x02 => Randomise,
            0x03 => Compare,
            0x04 => Withdraw,
            0x05 => SetSearchAddrH(b),
            0x06 => SetSearchAddrM(b),
            0x07 => SetSearchAddrL(b),
            0x08 => match b {
                0xff => ProgramShortAddress(None),
                0x00..=0x3f => ProgramShortAddress(Some(Short::new(b))),
                _ => return None,
            },
            0x09 if b < 64 => VerifyShortAddress(Short::new(b)),
            0x0a => QueryShortAddress,
            0x20 => WriteMemoryLocation(b),
            0x21 => WriteMemoryLocationNoReply(b),
            0x30 => Dtr0(b),
            0x31 => Dtr1(b),
            0x32 => Dtr2(b),
            _ => return None,
        })
    }

    fn decode_opcode(addr: Address, op: u8) -> Option<DeviceCommand> {
        Some(match op {
            0x00 => IdentifyDevice(addr),
            0x10 => Reset(addr),
            0x30 => QueryDeviceStatus(addr),
            0x33 => QueryContentDtr0(addr),
            0x36 => QueryVersionNumber(addr),
            0x39 => QueryRandomAddressH(addr),
            0x3a => QueryRandomAddressM(addr),
            0x3b => QueryRandomAddressL(addr),
            0x3c => ReadMemoryLocation(addr),
            _ => return None,
        })
    }

    pub fn frame(&self) -> Frame {
        let addressed =
            |addr: &Address, op: u8| Frame::Forward24([addr.address_byte().0, INSTANCE_DEVICE, op]);
        let special = |cmd: u8, b: u8| Frame::Forward24([Special::Command.byte(), cmd, b]);
        match self {
            IdentifyDevice(a) => addressed(a, 0x00),
            Reset(a) => addressed(a, 0x10),
            QueryDeviceStatus(a) => addressed(a, 0x30),
            QueryContentDtr0(a) => addressed(a, 0x33),
            QueryVersionNumber(a) => addressed(a, 0x36),
            QueryRandomAddressH(a) => addressed(a, 0x39),
            QueryRandomAddressM(a) => addressed(a, 0x3a),
            QueryRandomAddressL(a) => addressed(a, 0x3b),
            ReadMemoryLocation(a) => addressed(a, 0x3c),
            Terminate => special(0x00, 0x00),
            Initialise(mode) => special(0x01, mode.operand()),
            Randomise => special(0x02, 0x00),
            Compare => special(0x03, 0x00),
            Withdraw => special(0x04, 0x00),
            SetSearchAddrH(b) => special(0x05, *b),
            SetSearchAddrM(b) => special(0x06, *b),
            SetSearchAddrL(b) => special(0x07, *b),
            ProgramShortAddress(short) => {
                special(0x08, short.map(|s| s.value()).unwrap_or(0xff))
            }
            VerifyShortAddress(short) => special(0x09, short.value()),
            QueryShortAddress => special(0x0a, 0x00),
            WriteMemoryLocation(b) => special(0x20, *b),
            WriteMemoryLocationNoReply(b) => special(0x21, *b),
            Dtr0(b) => special(0x30, *b),
            Dtr1(b) => special(0x31, *b),
            Dtr2(b) => special(0x32, *b),
            DirectWriteMemory(offset, value) => {
                Frame::Forward24([Special::DirectWriteMemory.byte(), *offset, *value])
            }
            Dtr1Dtr0(d1, d0) => Frame::Forward24([Special::Dtr1Dtr0.byte(), *d1, *d0]),
            Dtr2Dtr1(d2, d1) => Frame::Forward24([Special::Dtr2Dtr1.byte(), *d2, *d1]),
            Unknown(frame) => *frame,
        }
    }

    pub fn response_kind(&self) -> ResponseKind {
        match self {
            Compare | VerifyShortAddress(_) => ResponseKind::Ack,
            QueryDeviceStatus(_)
            | QueryContentDtr0(_)
            | QueryVersionNumber(_)
            | QueryRandomAddressH(_)
            | QueryRandomAddressM(_)
            | QueryRandomAddressL(_)
            | ReadMemoryLocation(_)
            | QueryShortAddress
            | WriteMemoryLocation(_)
            | DirectWriteMemory(_, _) => ResponseKind::Numeric,
            _ => ResponseKind::NoResponse,
        }
    }

    pub fn send_twice(&self) -> bool {
        matches!(
            self,
            IdentifyDevice(_) | Reset(_) | Initialise(_) | Randomise
        )
    }
}
