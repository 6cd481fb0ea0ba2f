use crate::common::address::{AddressByte, AddressImpl, GroupImpl, Short};

pub type Group = GroupImpl<16>;

/// Control gear address, as used in 16 bit forward frames.
pub type Address = AddressImpl<Special, 16>;

/// Special command selectors of the 16 bit gear frame format
/// (IEC 62386-102 section 11.2). They occupy the address byte; the
/// second byte carries the operand.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Special {
    Terminate,
    Dtr0,
    Initialise,
    Randomise,
    Compare,
    Withdraw,
    Ping,
    SearchAddrH,
    SearchAddrM,
    SearchAddrL,
    ProgramShortAddress,
    VerifyShortAddress,
    QueryShortAddress,
    EnableDeviceType,
    Dtr1,
    Dtr2,
    WriteMemoryLocation,
    WriteMemoryLocationNoReply,
    /// Bit pattern with no assigned meaning
    Reserved(u8),
}

impl Special {
    pub fn byte(&self) -> u8 {
        use Special::*;
        match self {
            Terminate => 0xa1,
            Dtr0 => 0xa3,
            Initialise => 0xa5,
            Randomise => 0xa7,
            Compare => 0xa9,
            Withdraw => 0xab,
            Ping => 0xad,
            SearchAddrH => 0xb1,
            SearchAddrM => 0xb3,
            SearchAddrL => 0xb5,
            ProgramShortAddress => 0xb7,
            VerifyShortAddress => 0xb9,
            QueryShortAddress => 0xbb,
            EnableDeviceType => 0xc1,
            Dtr1 => 0xc3,
            Dtr2 => 0xc5,
            WriteMemoryLocation => 0xc7,
            WriteMemoryLocationNoReply => 0xc9,
            Reserved(b) => *b,
        }
    }

    fn from_byte(b: u8) -> Option<Special> {
        use Special::*;
        Some(match b {
            0xa1 => Terminate,
            0xa3 => Dtr0,
            0xa5 => Initialise,
            0xa7 => Randomise,
            0xa9 => Compare,
            0xab => Withdraw,
            0xad => Ping,
            0xb1 => SearchAddrH,
            0xb3 => SearchAddrM,
            0xb5 => SearchAddrL,
            0xb7 => ProgramShortAddress,
            0xb9 => VerifyShortAddress,
            0xbb => QueryShortAddress,
            0xc1 => EnableDeviceType,
            0xc3 => Dtr1,
            0xc5 => Dtr2,
            0xc7 => WriteMemoryLocation,
            0xc9 => WriteMemoryLocationNoReply,
            _ => return None,
        })
    }
}

impl Address {
    /// Decode the address byte of a 16 bit forward frame. Total;
    /// unassigned patterns decode as reserved specials.
    ///
    /// Bit 0 is the DAPC/command selector and is ignored here for
    /// short, group and broadcast addressing.
    pub fn from_address_byte(b: u8) -> Address {
        match b {
            0x00..=0x7f => AddressImpl::Short(Short::new(b >> 1)),
            0x80..=0x9f => AddressImpl::Group(Group::new((b >> 1) & 0x0f)),
            0xfc | 0xfd => AddressImpl::BroadcastUnaddressed,
            0xfe | 0xff => AddressImpl::Broadcast,
            _ => match Special::from_byte(b) {
                Some(s) => AddressImpl::Special(s),
                None => AddressImpl::Special(Special::Reserved(b)),
            },
        }
    }

    /// The bus byte for this address with the command selector bit
    /// set. DAPC frames clear bit 0 instead.
    pub fn address_byte(&self) -> AddressByte {
        match self {
            AddressImpl::Short(a) => (*a).into(),
            AddressImpl::Group(g) => (*g).into(),
            AddressImpl::Broadcast => AddressByte(0xff),
            AddressImpl::BroadcastUnaddressed => AddressByte(0xfd),
            AddressImpl::Special(s) => AddressByte(s.byte()),
        }
    }
}

impl From<Address> for AddressByte {
    fn from(addr: Address) -> AddressByte {
        addr.address_byte()
    }
}
