use core::ops::RangeInclusive;
use core::str::FromStr;

/// Value used for display, normally 1 based
pub trait DisplayValue {
    fn display_value(&self) -> u8;
    fn from_display_value<A>(value: A) -> Result<Self, AddressError>
    where
        A: TryInto<u8>,
        Self: Sized;
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AddressError {
    NotShort,
    NotGroup,
    NotScene,
    InvalidAddress,
}

impl std::fmt::Display for AddressError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        match self {
            AddressError::NotShort => write!(fmt, "Not a short address"),
            AddressError::NotGroup => write!(fmt, "Not a group address"),
            AddressError::NotScene => write!(fmt, "Not a scene number"),
            AddressError::InvalidAddress => write!(fmt, "Invalid address"),
        }
    }
}

impl std::error::Error for AddressError {}

/// The address byte of a forward frame, as it appears on the bus.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AddressByte(pub u8);

/// Short address, 0..=63. The same value range is used for control
/// gear and control devices but the two address spaces are separate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Short(u8);

impl Short {
    const DISPLAY_RANGE: RangeInclusive<u8> = 1..=64;

    pub fn new(a: u8) -> Short {
        assert!(a < 64);
        Short(a)
    }

    fn convert_display_value<A>(a: A) -> Result<u8, AddressError>
    where
        A: TryInto<u8>,
    {
        let Ok(a) = a.try_into() else {
            return Err(AddressError::InvalidAddress);
        };
        if !Self::DISPLAY_RANGE.contains(&a) {
            return Err(AddressError::InvalidAddress);
        }
        Ok(a - Self::DISPLAY_RANGE.start())
    }

    /// Address 0..64
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Short {
    type Error = AddressError;
    fn try_from(a: u8) -> Result<Self, Self::Error> {
        if a < 64 {
            Ok(Short(a))
        } else {
            Err(AddressError::NotShort)
        }
    }
}

impl From<Short> for AddressByte {
    fn from(short: Short) -> Self {
        AddressByte((short.0 << 1) | 1)
    }
}

impl From<Option<Short>> for AddressByte {
    fn from(short_or_mask: Option<Short>) -> AddressByte {
        if let Some(addr) = short_or_mask {
            AddressByte::from(addr)
        } else {
            AddressByte(0xff)
        }
    }
}

impl DisplayValue for Short {
    fn display_value(&self) -> u8 {
        self.0 + Self::DISPLAY_RANGE.start()
    }
    fn from_display_value<A>(a: A) -> Result<Short, AddressError>
    where
        A: TryInto<u8>,
    {
        Self::convert_display_value(a).map(Short)
    }
}

impl std::fmt::Display for Short {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        self.display_value().fmt(fmt)
    }
}

impl FromStr for Short {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u8::from_str(s).map_or(Err(AddressError::InvalidAddress), |a| {
            Self::from_display_value(a)
        })
    }
}

/// 24 bit random address, used as search address while commissioning
pub type Long = u32;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GroupImpl<const MAX: u8>(u8);

impl<const MAX: u8> GroupImpl<MAX> {
    const DISPLAY_RANGE: RangeInclusive<u8> = 1..=MAX;

    pub fn new(a: u8) -> GroupImpl<MAX> {
        assert!(a < MAX);
        GroupImpl(a)
    }

    fn convert_display_value<A>(a: A) -> Result<u8, AddressError>
    where
        A: TryInto<u8>,
    {
        let Ok(a) = a.try_into() else {
            return Err(AddressError::InvalidAddress);
        };
        if !Self::DISPLAY_RANGE.contains(&a) {
            return Err(AddressError::InvalidAddress);
        }
        Ok(a - Self::DISPLAY_RANGE.start())
    }

    /// Group 0..MAX
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl<const MAX: u8> TryFrom<u8> for GroupImpl<MAX> {
    type Error = AddressError;
    fn try_from(a: u8) -> Result<Self, Self::Error> {
        if a < MAX {
            Ok(GroupImpl(a))
        } else {
            Err(AddressError::NotGroup)
        }
    }
}

impl<const MAX: u8> From<GroupImpl<MAX>> for AddressByte {
    fn from(group: GroupImpl<MAX>) -> AddressByte {
        AddressByte((group.0 << 1) | 0x81)
    }
}

impl<const MAX: u8> DisplayValue for GroupImpl<MAX> {
    fn display_value(&self) -> u8 {
        self.0 + Self::DISPLAY_RANGE.start()
    }

    fn from_display_value<A>(a: A) -> Result<GroupImpl<MAX>, AddressError>
    where
        A: TryInto<u8>,
    {
        Self::convert_display_value(a).map(GroupImpl)
    }
}

impl<const MAX: u8> std::fmt::Display for GroupImpl<MAX> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::result::Result<(), std::fmt::Error> {
        self.display_value().fmt(fmt)
    }
}

impl<const MAX: u8> FromStr for GroupImpl<MAX> {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u8::from_str(s).map_or(Err(AddressError::InvalidAddress), |a| {
            Self::from_display_value(a)
        })
    }
}

/// An address as decoded from the address bits of a forward frame.
///
/// `SP` is the set of special command selectors for the address space.
/// Using a distinct selector type (and group count) per space makes
/// gear and device addresses different Rust types, so an address from
/// one space can never end up in the frame format of the other.
///
/// Decoding address bits is total; bit patterns with no assigned
/// meaning come back as `Special` with a reserved selector, never as
/// an error.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AddressImpl<SP, const MAX_GROUP: u8> {
    Short(Short),
    Group(GroupImpl<MAX_GROUP>),
    Broadcast,
    BroadcastUnaddressed,
    Special(SP),
}

impl<SP, const MAX_GROUP: u8> From<Short> for AddressImpl<SP, MAX_GROUP> {
    fn from(a: Short) -> Self {
        AddressImpl::Short(a)
    }
}

impl<SP, const MAX_GROUP: u8> From<GroupImpl<MAX_GROUP>> for AddressImpl<SP, MAX_GROUP> {
    fn from(a: GroupImpl<MAX_GROUP>) -> Self {
        AddressImpl::Group(a)
    }
}

impl<SP, const MAX_GROUP: u8> std::cmp::PartialEq<Short> for AddressImpl<SP, MAX_GROUP> {
    fn eq(&self, other: &Short) -> bool {
        match self {
            AddressImpl::Short(a) => a == other,
            _ => false,
        }
    }
}

impl<SP, const MAX_GROUP: u8> TryFrom<AddressImpl<SP, MAX_GROUP>> for Short {
    type Error = AddressError;
    fn try_from(addr: AddressImpl<SP, MAX_GROUP>) -> Result<Short, Self::Error> {
        if let AddressImpl::Short(s) = addr {
            Ok(s)
        } else {
            Err(AddressError::NotShort)
        }
    }
}

impl<SP, const MAX_GROUP: u8> TryFrom<AddressImpl<SP, MAX_GROUP>> for GroupImpl<MAX_GROUP> {
    type Error = AddressError;
    fn try_from(addr: AddressImpl<SP, MAX_GROUP>) -> Result<GroupImpl<MAX_GROUP>, Self::Error> {
        if let AddressImpl::Group(g) = addr {
            Ok(g)
        } else {
            Err(AddressError::NotGroup)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_display_value() {
        let a = Short::from_display_value(1).unwrap();
        assert_eq!(a.value(), 0);
        assert_eq!(a.display_value(), 1);
        let a = Short::from_display_value(64).unwrap();
        assert_eq!(a.value(), 63);
        assert_eq!(Short::from_display_value(0), Err(AddressError::InvalidAddress));
        assert_eq!(Short::from_display_value(65), Err(AddressError::InvalidAddress));
    }

    #[test]
    fn group_range() {
        assert!(GroupImpl::<16>::try_from(15).is_ok());
        assert_eq!(GroupImpl::<16>::try_from(16), Err(AddressError::NotGroup));
        assert!(GroupImpl::<32>::try_from(31).is_ok());
        assert_eq!(GroupImpl::<32>::try_from(32), Err(AddressError::NotGroup));
    }

    #[test]
    fn address_bytes() {
        assert_eq!(AddressByte::from(Short::new(0)).0, 0x01);
        assert_eq!(AddressByte::from(Short::new(63)).0, 0x7f);
        assert_eq!(AddressByte::from(GroupImpl::<16>::new(0)).0, 0x81);
        assert_eq!(AddressByte::from(GroupImpl::<16>::new(15)).0, 0x9f);
        // MASK means "no address" when programming short addresses
        assert_eq!(AddressByte::from(Option::<Short>::None).0, 0xff);
    }

    #[test]
    fn from_str() {
        assert_eq!(Short::from_str("5").unwrap().value(), 4);
        assert!(Short::from_str("65").is_err());
        assert!(Short::from_str("x").is_err());
    }
}
