//! Unified view over the 16 bit gear and 24 bit device command sets.

use crate::device::cmd_defs::DeviceCommand;
use crate::frame::Frame;
use crate::gear::cmd_defs::GearCommand;
use crate::response::ResponseKind;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Command {
    Gear(GearCommand),
    Device(DeviceCommand),
    /// A frame neither catalog covers, including backward frames
    Unknown(Frame),
}

impl Command {
    /// Decode any frame. Total; the frame length selects the catalog.
    pub fn decode(frame: Frame) -> Command {
        match frame {
            Frame::Forward16(_) => Command::Gear(GearCommand::decode(frame)),
            Frame::Forward24(_) => Command::Device(DeviceCommand::decode(frame)),
            Frame::Backward(_) => Command::Unknown(frame),
        }
    }

    /// Decode a 16 bit frame with a known preceding ENABLE DEVICE
    /// TYPE.
    pub fn decode_with_device_type(frame: Frame, device_type: Option<u8>) -> Command {
        match frame {
            Frame::Forward16(_) => {
                Command::Gear(GearCommand::decode_with_device_type(frame, device_type))
            }
            _ => Command::decode(frame),
        }
    }

    pub fn frame(&self) -> Frame {
        match self {
            Command::Gear(c) => c.frame(),
            Command::Device(c) => c.frame(),
            Command::Unknown(f) => *f,
        }
    }

    /// ENABLE DEVICE TYPE frame to transmit first, if any.
    pub fn enable_frame(&self) -> Option<Frame> {
        match self {
            Command::Gear(c) => c.enable_frame(),
            _ => None,
        }
    }

    pub fn response_kind(&self) -> ResponseKind {
        match self {
            Command::Gear(c) => c.response_kind(),
            Command::Device(c) => c.response_kind(),
            Command::Unknown(_) => ResponseKind::NoResponse,
        }
    }

    pub fn send_twice(&self) -> bool {
        match self {
            Command::Gear(c) => c.send_twice(),
            Command::Device(c) => c.send_twice(),
            Command::Unknown(_) => false,
        }
    }
}

impl From<GearCommand> for Command {
    fn from(c: GearCommand) -> Command {
        Command::Gear(c)
    }
}

impl From<DeviceCommand> for Command {
    fn from(c: DeviceCommand) -> Command {
        Command::Device(c)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::address::Short;
    use crate::gear;

    #[test]
    fn routes_by_length() {
        let f16 = Frame::Forward16([0xff, 0x90]);
        assert!(matches!(Command::decode(f16), Command::Gear(_)));
        let f24 = Frame::Forward24([0xff, 0xfe, 0x30]);
        assert!(matches!(Command::decode(f24), Command::Device(_)));
        let back = Frame::Backward(0x42);
        assert_eq!(Command::decode(back), Command::Unknown(back));
    }

    #[test]
    fn round_trip_is_identity() {
        for value in [0x0000u32, 0x012a, 0xa301, 0xff90, 0xffff] {
            let frame = Frame::new(16, value).unwrap();
            assert_eq!(Command::decode(frame).frame(), frame);
        }
        for value in [0x000000u32, 0x01fe30, 0xc13042, 0xfffefe] {
            let frame = Frame::new(24, value).unwrap();
            assert_eq!(Command::decode(frame).frame(), frame);
        }
    }

    #[test]
    fn extended_command_context() {
        let cmd = Command::Gear(gear::cmd_defs::GearCommand::AppExtended {
            addr: Short::new(1).into(),
            opcode: 0xf0,
            device_type: Some(8),
        });
        assert!(cmd.enable_frame().is_some());
        assert_eq!(Command::decode_with_device_type(cmd.frame(), Some(8)), cmd);
    }
}
