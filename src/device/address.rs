use crate::common::address::{AddressByte, AddressImpl, GroupImpl, Short};

pub type Group = GroupImpl<32>;

/// Control device address, as used in 24 bit command frames.
pub type Address = AddressImpl<Special, 32>;

/// Address byte patterns of the 24 bit device frame format that do
/// not address a device (IEC 62386-103 section 7.2.1). For special
/// commands the instance byte selects the actual command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Special {
    /// 0xc1, a special command selected by the instance byte
    Command,
    /// 0xc5, direct DTR0 write combined with a memory write
    DirectWriteMemory,
    /// 0xc7, writes DTR1 and DTR0 in one frame
    Dtr1Dtr0,
    /// 0xc9, writes DTR2 and DTR1 in one frame
    Dtr2Dtr1,
    /// Unassigned patterns, including event message addressing which
    /// is not decoded at this layer
    Reserved(u8),
}

impl Special {
    pub fn byte(&self) -> u8 {
        match self {
            Special::Command => 0xc1,
            Special::DirectWriteMemory => 0xc5,
            Special::Dtr1Dtr0 => 0xc7,
            Special::Dtr2Dtr1 => 0xc9,
            Special::Reserved(b) => *b,
        }
    }
}

impl Address {
    /// Decode the address byte of a 24 bit command frame. Total;
    /// event messages (bit 0 clear) and unassigned patterns decode as
    /// reserved specials.
    pub fn from_address_byte(b: u8) -> Address {
        if b & 1 == 0 {
            return AddressImpl::Special(Special::Reserved(b));
        }
        match b {
            0x01..=0x7f => AddressImpl::Short(Short::new(b >> 1)),
            0x81..=0xbf => AddressImpl::Group(Group::new((b >> 1) & 0x1f)),
            0xc1 => AddressImpl::Special(Special::Command),
            0xc5 => AddressImpl::Special(Special::DirectWriteMemory),
            0xc7 => AddressImpl::Special(Special::Dtr1Dtr0),
            0xc9 => AddressImpl::Special(Special::Dtr2Dtr1),
            0xfd => AddressImpl::BroadcastUnaddressed,
            0xff => AddressImpl::Broadcast,
            _ => AddressImpl::Special(Special::Reserved(b)),
        }
    }

    /// The bus byte for this address. Bit 0 is always set for device
    /// command frames.
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
