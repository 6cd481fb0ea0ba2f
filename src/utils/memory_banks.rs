//! Interpretation of the standard contents of memory bank 0
//! (IEC 62386-102 section 9.10.5).

use crate::drivers::driver::DaliDriver;
use crate::drivers::driver_utils::run_sequence;
use crate::error::DynResult;
use crate::gear::address::Address;
use crate::sequence::{MemoryBankDump, MemoryBankRead};
use std::convert::TryInto;
use std::error::Error;
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum MemoryError {
    /// The bank ends before the field being parsed
    TooShort,
    NotBank0,
}

impl Error for MemoryError {}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::TooShort => write!(f, "memory bank too short"),
            MemoryError::NotBank0 => write!(f, "dump is not of bank 0"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MemoryBank0Info {
    pub gtin: u64,
    pub firmware_version: u16,
    pub id_number: u64,
    pub hardware_version: u16,
    pub version_101: u8,
    pub version_102: u8,
    pub version_103: u8,
    pub n_control_devices: u8,
    pub n_control_gears: u8,
    pub control_gear_index: u8,
}

fn version_str(ver: u8) -> String {
    if ver == 0xff {
        String::from("-")
    } else {
        format!("{}.{}", ver >> 2, ver & 3)
    }
}

impl MemoryBank0Info {
    pub fn parse(dump: &MemoryBankDump) -> Result<MemoryBank0Info, MemoryError> {
        if dump.bank != 0 {
            return Err(MemoryError::NotBank0);
        }
        let bytes = &dump.bytes;
        if bytes.len() < 0x1b {
            return Err(MemoryError::TooShort);
        }
        let mut gtin_bytes = [0u8; 8];
        gtin_bytes[2..8].copy_from_slice(&bytes[0x03..=0x08]);
        let info = MemoryBank0Info {
            gtin: u64::from_be_bytes(gtin_bytes),
            firmware_version: u16::from_be_bytes(bytes[0x09..=0x0a].try_into().unwrap()),
            id_number: u64::from_be_bytes(bytes[0x0b..=0x12].try_into().unwrap()),
            hardware_version: u16::from_be_bytes(bytes[0x13..=0x14].try_into().unwrap()),
            version_101: bytes[0x15],
            version_102: bytes[0x16],
            version_103: bytes[0x17],
            n_control_devices: bytes[0x18],
            n_control_gears: bytes[0x19],
            control_gear_index: bytes[0x1a],
        };
        Ok(info)
    }
}

impl fmt::Display for MemoryBank0Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GTIN: {}", self.gtin)?;
        writeln!(
            f,
            "Firmware version: {}.{}",
            self.firmware_version >> 8,
            self.firmware_version & 0xff
        )?;
        writeln!(f, "Identification number: {}", self.id_number)?;
        writeln!(
            f,
            "Hardware version: {}.{}",
            self.hardware_version >> 8,
            self.hardware_version & 0xff
        )?;
        writeln!(f, "101 version number: {}", version_str(self.version_101))?;
        writeln!(f, "102 version number: {}", version_str(self.version_102))?;
        writeln!(f, "103 version number: {}", version_str(self.version_103))?;
        writeln!(
            f,
            "Number of logical control device units: {}",
            self.n_control_devices
        )?;
        writeln!(
            f,
            "Number of logical control gear units: {}",
            self.n_control_gears
        )?;
        writeln!(
            f,
            "Index of this logical control gear unit: {}",
            self.control_gear_index
        )
    }
}

/// Read and interpret bank 0 of a single unit.
pub async fn read_bank0_info(
    driver: &mut dyn DaliDriver,
    addr: Address,
) -> DynResult<MemoryBank0Info> {
    let mut seq = MemoryBankRead::new(addr, 0);
    let dump = run_sequence(driver, &mut seq).await?;
    Ok(MemoryBank0Info::parse(&dump)?)
}
