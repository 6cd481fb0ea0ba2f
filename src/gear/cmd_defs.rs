use crate::common::address::{AddressError, Short};
use crate::frame::Frame;
use crate::gear::address::{Address, Group, Special};
use crate::response::ResponseKind;

/// Scene number, 0..=15.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Scene(u8);

impl Scene {
    pub fn new(s: u8) -> Scene {
        assert!(s < 16);
        Scene(s)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Scene {
    type Error = AddressError;
    fn try_from(s: u8) -> Result<Self, Self::Error> {
        if s < 16 {
            Ok(Scene(s))
        } else {
            Err(AddressError::NotScene)
        }
    }
}

impl std::fmt::Display for Scene {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.0.fmt(fmt)
    }
}

/// Operand of the INITIALISE special command: which units enter the
/// initialisation state.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InitialiseMode {
    All,
    /// Units without a short address only
    NoAddress,
    Address(Short),
}

impl InitialiseMode {
    fn operand(&self) -> u8 {
        match self {
            InitialiseMode::All => 0x00,
            InitialiseMode::NoAddress => 0xff,
            InitialiseMode::Address(a) => (a.value() << 1) | 1,
        }
    }

    fn from_operand(b: u8) -> Option<InitialiseMode> {
        match b {
            0x00 => Some(InitialiseMode::All),
            0xff => Some(InitialiseMode::NoAddress),
            _ if b & 1 == 1 && b >> 1 < 64 => Some(InitialiseMode::Address(Short::new(b >> 1))),
            _ => None,
        }
    }
}

/// Control gear commands transmitted as 16 bit forward frames
/// (IEC 62386-102 section 11).
///
/// This is the complete catalog known to the decoder. Decoding is
/// total: patterns with no entry here come back as `Unknown` with the
/// original frame preserved, so nothing received off the bus is ever
/// rejected at this layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum GearCommand {
    /// Direct arc power control, selector bit 0 cleared
    Dapc(Address, u8),
    Off(Address),
    Up(Address),
    Down(Address),
    StepUp(Address),
    StepDown(Address),
    RecallMaxLevel(Address),
    RecallMinLevel(Address),
    StepDownAndOff(Address),
    OnAndStepUp(Address),
    GoToLastActiveLevel(Address),
    GoToScene(Address, Scene),

    Reset(Address),
    StoreActualLevelInDtr0(Address),
    IdentifyDevice(Address),
    SetMaxLevel(Address),
    SetMinLevel(Address),
    SetSystemFailureLevel(Address),
    SetPowerOnLevel(Address),
    SetFadeTime(Address),
    SetFadeRate(Address),
    SetScene(Address, Scene),
    RemoveFromScene(Address, Scene),
    AddToGroup(Address, Group),
    RemoveFromGroup(Address, Group),
    SetShortAddress(Address),
    EnableWriteMemory(Address),

    QueryStatus(Address),
    QueryControlGearPresent(Address),
    QueryLampFailure(Address),
    QueryLampPowerOn(Address),
    QueryLimitError(Address),
    QueryResetState(Address),
    QueryMissingShortAddress(Address),
    QueryVersionNumber(Address),
    QueryContentDtr0(Address),
    QueryDeviceType(Address),
    QueryPhysicalMinimum(Address),
    QueryPowerFailure(Address),
    QueryContentDtr1(Address),
    QueryContentDtr2(Address),
    QueryActualLevel(Address),
    QueryMaxLevel(Address),
    QueryMinLevel(Address),
    QueryPowerOnLevel(Address),
    QuerySystemFailureLevel(Address),
    QueryFade(Address),
    QueryNextDeviceType(Address),
    QuerySceneLevel(Address, Scene),
    QueryGroups0_7(Address),
    QueryGroups8_15(Address),
    QueryRandomAddressH(Address),
    QueryRandomAddressM(Address),
    QueryRandomAddressL(Address),
    ReadMemoryLocation(Address),

    Terminate,
    Dtr0(u8),
    Initialise(InitialiseMode),
    Randomise,
    Compare,
    Withdraw,
    Ping,
    SetSearchAddrH(u8),
    SetSearchAddrM(u8),
    SetSearchAddrL(u8),
    /// `None` clears the short address (MASK operand)
    ProgramShortAddress(Option<Short>),
    VerifyShortAddress(Short),
    QueryShortAddress,
    EnableDeviceType(u8),
    Dtr1(u8),
    Dtr2(u8),
    WriteMemoryLocation(u8),
    WriteMemoryLocationNoReply(u8),

    /// Application extended command (opcodes 0xe0..=0xfe), only valid
    /// for the device type transmitted in the preceding ENABLE DEVICE
    /// TYPE frame. Decoding a lone frame leaves `device_type` unset.
    AppExtended {
        addr: Address,
        opcode: u8,
        device_type: Option<u8>,
    },

    /// Frame with no matching catalog entry, kept verbatim
    Unknown(Frame),
}

use GearCommand::*;

impl GearCommand {
    /// Decode a 16 bit forward frame. Total; never fails.
    pub fn decode(frame: Frame) -> GearCommand {
        Self::decode_with_device_type(frame, None)
    }

    /// Decode a 16 bit forward frame in the context of a previously
    /// transmitted ENABLE DEVICE TYPE.
    pub fn decode_with_device_type(frame: Frame, device_type: Option<u8>) -> GearCommand {
        let Frame::Forward16([a, b]) = frame else {
            return Unknown(frame);
        };
        let addr = Address::from_address_byte(a);
        if let Address::Special(special) = addr {
            return match Self::decode_special(special, b) {
                Some(cmd) => cmd,
                None => Unknown(frame),
            };
        }
        if a & 1 == 0 {
            return Dapc(addr, b);
        }
        match Self::decode_opcode(addr, b, device_type) {
            Some(cmd) => cmd,
            None => Unknown(frame),
        }
    }

    fn decode_special(special: Special, b: u8) -> Option<GearCommand> {
        Some(match special {
            Special::Terminate => Terminate,
            Special::Dtr0 => Dtr0(b),
            Special::Initialise => Initialise(InitialiseMode::from_operand(b)?),
            Special::Randomise => Randomise,
            Special::Compare => Compare,
            Special::Withdraw => Withdraw,
            Special::Ping => Ping,
            Special::SearchAddrH => SetSearchAddrH(b),
            Special::SearchAddrM => SetSearchAddrM(b),
            Special::SearchAddrL => SetSearchAddrL(b),
            Special::ProgramShortAddress => match b {
                0xff => ProgramShortAddress(None),
                _ if b & 1 == 1 && b >> 1 < 64 => ProgramShortAddress(Some(Short::new(b >> 1))),
                _ => return None,
            },
            Special::VerifyShortAddress if b & 1 == 1 && b >> 1 < 64 => {
                VerifyShortAddress(Short::new(b >> 1))
            }
            Special::QueryShortAddress => QueryShortAddress,
            Special::EnableDeviceType => EnableDeviceType(b),
            Special::Dtr1 => Dtr1(b),
            Special::Dtr2 => Dtr2(b),
            Special::WriteMemoryLocation => WriteMemoryLocation(b),
            Special::WriteMemoryLocationNoReply => WriteMemoryLocationNoReply(b),
            _ => return None,
        })
    }

    fn decode_opcode(addr: Address, op: u8, device_type: Option<u8>) -> Option<GearCommand> {
        Some(match op {
            0x00 => Off(addr),
            0x01 => Up(addr),
            0x02 => Down(addr),
            0x03 => StepUp(addr),
            0x04 => StepDown(addr),
            0x05 => RecallMaxLevel(addr),
            0x06 => RecallMinLevel(addr),
            0x07 => StepDownAndOff(addr),
            0x08 => OnAndStepUp(addr),
            0x0a => GoToLastActiveLevel(addr),
            0x10..=0x1f => GoToScene(addr, Scene(op & 0x0f)),
            0x20 => Reset(addr),
            0x21 => StoreActualLevelInDtr0(addr),
            0x25 => IdentifyDevice(addr),
            0x2a => SetMaxLevel(addr),
            0x2b => SetMinLevel(addr),
            0x2c => SetSystemFailureLevel(addr),
            0x2d => SetPowerOnLevel(addr),
            0x2e => SetFadeTime(addr),
            0x2f => SetFadeRate(addr),
            0x40..=0x4f => SetScene(addr, Scene(op & 0x0f)),
            0x50..=0x5f => RemoveFromScene(addr, Scene(op & 0x0f)),
            0x60..=0x6f => AddToGroup(addr, Group::new(op & 0x0f)),
            0x70..=0x7f => RemoveFromGroup(addr, Group::new(op & 0x0f)),
            0x80 => SetShortAddress(addr),
            0x81 => EnableWriteMemory(addr),
            0x90 => QueryStatus(addr),
            0x91 => QueryControlGearPresent(addr),
            0x92 => QueryLampFailure(addr),
            0x93 => QueryLampPowerOn(addr),
            0x94 => QueryLimitError(addr),
            0x95 => QueryResetState(addr),
            0x96 => QueryMissingShortAddress(addr),
            0x97 => QueryVersionNumber(addr),
            0x98 => QueryContentDtr0(addr),
            0x99 => QueryDeviceType(addr),
            0x9a => QueryPhysicalMinimum(addr),
            0x9b => QueryPowerFailure(addr),
            0x9c => QueryContentDtr1(addr),
            0x9d => QueryContentDtr2(addr),
            0xa0 => QueryActualLevel(addr),
            0xa1 => QueryMaxLevel(addr),
            0xa2 => QueryMinLevel(addr),
            0xa3 => QueryPowerOnLevel(addr),
            0xa4 => QuerySystemFailureLevel(addr),
            0xa5 => QueryFade(addr),
            0xa7 => QueryNextDeviceType(addr),
            0xb0..=0xbf => QuerySceneLevel(addr, Scene(op & 0x0f)),
            0xc0 => QueryGroups0_7(addr),
            0xc1 => QueryGroups8_15(addr),
            0xc2 => QueryRandomAddressH(addr),
            0xc3 => QueryRandomAddressM(addr),
            0xc4 => QueryRandomAddressL(addr),
            0xc5 => ReadMemoryLocation(addr),
            0xe0..=0xfe => AppExtended {
                addr,
                opcode: op,
                device_type,
            },
            _ => return None,
        })
    }

    /// The exact wire frame for this command. For `AppExtended` this
    /// is the command frame itself; the ENABLE DEVICE TYPE prefix is
    /// reported separately by [`enable_frame`](Self::enable_frame).
    pub fn frame(&self) -> Frame {
        let addressed = |addr: &Address, op: u8| Frame::Forward16([addr.address_byte().0, op]);
        let special = |s: Special, b: u8| Frame::Forward16([s.byte(), b]);
        match self {
            Dapc(addr, level) => Frame::Forward16([addr.address_byte().0 & 0xfe, *level]),
            Off(a) => addressed(a, 0x00),
            Up(a) => addressed(a, 0x01),
            Down(a) => addressed(a, 0x02),
            StepUp(a) => addressed(a, 0x03),
            StepDown(a) => addressed(a, 0x04),
            RecallMaxLevel(a) => addressed(a, 0x05),
            RecallMinLevel(a) => addressed(a, 0x06),
            StepDownAndOff(a) => addressed(a, 0x07),
            OnAndStepUp(a) => addressed(a, 0x08),
            GoToLastActiveLevel(a) => addressed(a, 0x0a),
            GoToScene(a, s) => addressed(a, 0x10 + s.value()),
            Reset(a) => addressed(a, 0x20),
            StoreActualLevelInDtr0(a) => addressed(a, 0x21),
            IdentifyDevice(a) => addressed(a, 0x25),
            SetMaxLevel(a) => addressed(a, 0x2a),
            SetMinLevel(a) => addressed(a, 0x2b),
            SetSystemFailureLevel(a) => addressed(a, 0x2c),
            SetPowerOnLevel(a) => addressed(a, 0x2d),
            SetFadeTime(a) => addressed(a, 0x2e),
            SetFadeRate(a) => addressed(a, 0x2f),
            SetScene(a, s) => addressed(a, 0x40 + s.value()),
            RemoveFromScene(a, s) => addressed(a, 0x50 + s.value()),
            AddToGroup(a, g) => addressed(a, 0x60 + g.value()),
            RemoveFromGroup(a, g) => addressed(a, 0x70 + g.value()),
            SetShortAddress(a) => addressed(a, 0x80),
            EnableWriteMemory(a) => addressed(a, 0x81),
            QueryStatus(a) => addressed(a, 0x90),
            QueryControlGearPresent(a) => addressed(a, 0x91),
            QueryLampFailure(a) => addressed(a, 0x92),
            QueryLampPowerOn(a) => addressed(a, 0x93),
            QueryLimitError(a) => addressed(a, 0x94),
            QueryResetState(a) => addressed(a, 0x95),
            QueryMissingShortAddress(a) => addressed(a, 0x96),
            QueryVersionNumber(a) => addressed(a, 0x97),
            QueryContentDtr0(a) => addressed(a, 0x98),
            QueryDeviceType(a) => addressed(a, 0x99),
            QueryPhysicalMinimum(a) => addressed(a, 0x9a),
            QueryPowerFailure(a) => addressed(a, 0x9b),
            QueryContentDtr1(a) => addressed(a, 0x9c),
            QueryContentDtr2(a) => addressed(a, 0x9d),
            QueryActualLevel(a) => addressed(a, 0xa0),
            QueryMaxLevel(a) => addressed(a, 0xa1),
            QueryMinLevel(a) => addressed(a, 0xa2),
            QueryPowerOnLevel(a) => addressed(a, 0xa3),
            QuerySystemFailureLevel(a) => addressed(a, 0xa4),
            QueryFade(a) => addressed(a, 0xa5),
            QueryNextDeviceType(a) => addressed(a, 0xa7),
            QuerySceneLevel(a, s) => addressed(a, 0xb0 + s.value()),
            QueryGroups0_7(a) => addressed(a, 0xc0),
            QueryGroups8_15(a) => addressed(a, 0xc1),
            QueryRandomAddressH(a) => addressed(a, 0xc2),
            QueryRandomAddressM(a) => addressed(a, 0xc3),
            QueryRandomAddressL(a) => addressed(a, 0xc4),
            ReadMemoryLocation(a) => addressed(a, 0xc5),
            Terminate => special(Special::Terminate, 0x00),
            Dtr0(b) => special(Special::Dtr0, *b),
            Initialise(mode) => special(Special::Initialise, mode.operand()),
            Randomise => special(Special::Randomise, 0x00),
            Compare => special(Special::Compare, 0x00),
            Withdraw => special(Special::Withdraw, 0x00),
            Ping => special(Special::Ping, 0x00),
            SetSearchAddrH(b) => special(Special::SearchAddrH, *b),
            SetSearchAddrM(b) => special(Special::SearchAddrM, *b),
            SetSearchAddrL(b) => special(Special::SearchAddrL, *b),
            ProgramShortAddress(short) => {
                special(Special::ProgramShortAddress, crate::common::address::AddressByte::from(*short).0)
            }
            VerifyShortAddress(short) => {
                special(Special::VerifyShortAddress, (short.value() << 1) | 1)
            }
            QueryShortAddress => special(Special::QueryShortAddress, 0x00),
            EnableDeviceType(t) => special(Special::EnableDeviceType, *t),
            Dtr1(b) => special(Special::Dtr1, *b),
            Dtr2(b) => special(Special::Dtr2, *b),
            WriteMemoryLocation(b) => special(Special::WriteMemoryLocation, *b),
            WriteMemoryLocationNoReply(b) => special(Special::WriteMemoryLocationNoReply, *b),
            AppExtended { addr, opcode, .. } => addressed(addr, *opcode),
            Unknown(frame) => *frame,
        }
    }

    /// ENABLE DEVICE TYPE frame that must precede the command frame,
    /// its reply discarded. Only set for extended commands built with
    /// a known device type.
    pub fn enable_frame(&self) -> Option<Frame> {
        match self {
            AppExtended {
                device_type: Some(t),
                ..
            } => Some(EnableDeviceType(*t).frame()),
            _ => None,
        }
    }

    /// How a reply to this command is to be interpreted.
    pub fn response_kind(&self) -> ResponseKind {
        match self {
            QueryControlGearPresent(_)
            | QueryLampFailure(_)
            | QueryLampPowerOn(_)
            | QueryLimitError(_)
            | QueryResetState(_)
            | QueryMissingShortAddress(_)
            | QueryPowerFailure(_)
            | Compare
            | VerifyShortAddress(_) => ResponseKind::Ack,
            QueryStatus(_)
            | QueryVersionNumber(_)
            | QueryContentDtr0(_)
            | QueryDeviceType(_)
            | QueryPhysicalMinimum(_)
            | QueryContentDtr1(_)
            | QueryContentDtr2(_)
            | QueryActualLevel(_)
            | QueryMaxLevel(_)
            | QueryMinLevel(_)
            | QueryPowerOnLevel(_)
            | QuerySystemFailureLevel(_)
            | QueryFade(_)
            | QueryNextDeviceType(_)
            | QuerySceneLevel(_, _)
            | QueryRandomAddressH(_)
            | QueryRandomAddressM(_)
            | QueryRandomAddressL(_)
            | ReadMemoryLocation(_)
            | QueryShortAddress
            | WriteMemoryLocation(_) => ResponseKind::Numeric,
            QueryGroups0_7(_) | QueryGroups8_15(_) => ResponseKind::BitmapMask,
            // Extension queries answer, the rest of the extension
            // range does not
            AppExtended { opcode, .. } if *opcode >= 0xf0 => ResponseKind::Numeric,
            _ => ResponseKind::NoResponse,
        }
    }

    /// Configuration commands only take effect when received twice
    /// within 100 ms.
    pub fn send_twice(&self) -> bool {
        matches!(
            self,
            Reset(_)
                | StoreActualLevelInDtr0(_)
                | IdentifyDevice(_)
                | SetMaxLevel(_)
                | SetMinLevel(_)
                | SetSystemFailureLevel(_)
                | SetPowerOnLevel(_)
                | SetFadeTime(_)
                | SetFadeRate(_)
                | SetScene(_, _)
                | RemoveFromScene(_, _)
                | AddToGroup(_, _)
                | RemoveFromGroup(_, _)
                | SetShortAddress(_)
                | EnableWriteMemory(_)
                | Initialise(_)
                | Randomise
        )
    }
}
