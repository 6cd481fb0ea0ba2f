//! Bus frames. Three lengths exist on a DALI bus: 8 bit backward
//! frames, 16 bit forward frames for control gear and 24 bit forward
//! frames for control devices. Multi-byte frames travel most
//! significant byte first.

use std::error::Error;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Value does not fit in the requested frame length, or the
    /// length is not one of 8, 16 or 24
    Range { bits: u32, value: u32 },
    /// Byte slice length does not match the frame length
    Length { bits: u32, got: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Range { bits, value } => {
                write!(f, "value {:#x} does not fit in a {} bit frame", value, bits)
            }
            FrameError::Length { bits, got } => {
                write!(f, "{} bytes do not make a {} bit frame", got, bits)
            }
        }
    }
}

impl Error for FrameError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frame {
    Backward(u8),
    Forward16([u8; 2]),
    Forward24([u8; 3]),
}

impl Frame {
    /// Build a frame of the given bit length from an integer value.
    pub fn new(bits: u32, value: u32) -> Result<Frame, FrameError> {
        if bits < 32 && value >> bits != 0 {
            return Err(FrameError::Range { bits, value });
        }
        match bits {
            8 => Ok(Frame::Backward(value as u8)),
            16 => Ok(Frame::Forward16([(value >> 8) as u8, value as u8])),
            24 => Ok(Frame::Forward24([
                (value >> 16) as u8,
                (value >> 8) as u8,
                value as u8,
            ])),
            _ => Err(FrameError::Range { bits, value }),
        }
    }

    /// Build a frame of the given bit length from wire bytes, most
    /// significant first.
    pub fn unpack(bits: u32, bytes: &[u8]) -> Result<Frame, FrameError> {
        match (bits, bytes) {
            (8, &[b]) => Ok(Frame::Backward(b)),
            (16, &[a, b]) => Ok(Frame::Forward16([a, b])),
            (24, &[a, b, c]) => Ok(Frame::Forward24([a, b, c])),
            _ => Err(FrameError::Length {
                bits,
                got: bytes.len(),
            }),
        }
    }

    /// Wire bytes, most significant first.
    pub fn pack(&self) -> Vec<u8> {
        match self {
            Frame::Backward(b) => vec![*b],
            Frame::Forward16(b) => b.to_vec(),
            Frame::Forward24(b) => b.to_vec(),
        }
    }

    pub fn bit_length(&self) -> u32 {
        match self {
            Frame::Backward(_) => 8,
            Frame::Forward16(_) => 16,
            Frame::Forward24(_) => 24,
        }
    }

    /// The frame contents as an integer, first wire byte most
    /// significant.
    pub fn value(&self) -> u32 {
        match self {
            Frame::Backward(b) => u32::from(*b),
            Frame::Forward16([a, b]) => u32::from(*a) << 8 | u32::from(*b),
            Frame::Forward24([a, b, c]) => {
                u32::from(*a) << 16 | u32::from(*b) << 8 | u32::from(*c)
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Backward(b) => write!(f, "{:02x}", b),
            Frame::Forward16([a, b]) => write!(f, "{:02x} {:02x}", a, b),
            Frame::Forward24([a, b, c]) => write!(f, "{:02x} {:02x} {:02x}", a, b, c),
        }
    }
}

/// A 24 bit frame extended with a checksum byte, for transports that
/// may corrupt data between the bus interface and the host. The
/// check byte is the exclusive or of the three data bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Checked24 {
    data: [u8; 3],
    check: u8,
}

fn checksum(data: &[u8; 3]) -> u8 {
    data[0] ^ data[1] ^ data[2]
}

impl Checked24 {
    pub fn new(data: [u8; 3]) -> Checked24 {
        Checked24 {
            data,
            check: checksum(&data),
        }
    }

    /// Rebuild from four wire bytes. The received check byte is kept
    /// verbatim so that [`checksum_valid`](Self::checksum_valid) can
    /// report corruption.
    pub fn unpack(bytes: &[u8]) -> Result<Checked24, FrameError> {
        match bytes {
            &[a, b, c, check] => Ok(Checked24 {
                data: [a, b, c],
                check,
            }),
            _ => Err(FrameError::Length {
                bits: 24,
                got: bytes.len(),
            }),
        }
    }

    pub fn pack(&self) -> [u8; 4] {
        [self.data[0], self.data[1], self.data[2], self.check]
    }

    pub fn frame(&self) -> Frame {
        Frame::Forward24(self.data)
    }

    pub fn checksum_valid(&self) -> bool {
        self.check == checksum(&self.data)
    }
}
