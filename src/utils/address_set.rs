use crate::common::address::Short;
use std::fmt;
use std::ops::{Add, Sub};

/// A set of short addresses, one bit each.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct AddressSet(u64);

impl AddressSet {
    pub fn empty() -> AddressSet {
        AddressSet(0)
    }

    /// All 64 short addresses.
    pub fn all() -> AddressSet {
        AddressSet(!0)
    }

    pub fn new(addrs: &[Short]) -> AddressSet {
        let mut bits = 0u64;
        for a in addrs {
            bits |= 1 << a.value();
        }
        AddressSet(bits)
    }

    /// Addresses `first..=last`, inclusive.
    pub fn from_range(first: Short, last: Short) -> AddressSet {
        let mut bits = 0u64;
        for a in first.value()..=last.value() {
            bits |= 1 << a;
        }
        AddressSet(bits)
    }

    pub fn contains(&self, addr: Short) -> bool {
        self.0 >> addr.value() & 1 == 1
    }

    pub fn insert(&mut self, addr: Short) {
        self.0 |= 1 << addr.value();
    }

    pub fn remove(&mut self, addr: Short) {
        self.0 &= !(1 << addr.value());
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// The lowest address in the set, if any.
    pub fn lowest(&self) -> Option<Short> {
        if self.0 == 0 {
            None
        } else {
            Some(Short::new(self.0.trailing_zeros() as u8))
        }
    }

    pub fn to_vec(&self) -> Vec<Short> {
        (0..64)
            .filter(|a| self.0 >> a & 1 == 1)
            .map(Short::new)
            .collect()
    }
}

impl Add for AddressSet {
    type Output = AddressSet;
    fn add(self, other: AddressSet) -> AddressSet {
        AddressSet(self.0 | other.0)
    }
}

impl Sub for AddressSet {
    type Output = AddressSet;
    fn sub(self, other: AddressSet) -> AddressSet {
        AddressSet(self.0 & !other.0)
    }
}

impl fmt::Debug for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.to_vec().iter()).finish()
    }
}
