use crate::frame::Frame;
use std::fmt;

/// How the reply slot after a forward frame is to be interpreted.
/// Derived from the command catalog, never guessed from the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    /// No reply expected; anything received is unsolicited
    NoResponse,
    /// Yes is 0xff, silence is no
    Ack,
    /// One data byte, silence means no answer
    Numeric,
    /// One data byte read bit by bit, with collisions meaningful
    BitmapMask,
}

/// What was observed on the bus in the reply slot, before
/// interpretation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RawResponse {
    Frame(Frame),
    /// Reply window elapsed without a transmission
    Timeout,
    /// A transmission was detected but could not be decoded, usually
    /// several units answering at once
    FramingError,
}

/// A backward frame whose individual bits carry information because
/// several units may have driven the bus at once.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MaskResponse {
    bits: u8,
}

impl MaskResponse {
    pub fn new(bits: u8) -> MaskResponse {
        MaskResponse { bits }
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Check the reply bit by bit against the caller's expectation of
    /// which bits should be set. Per bit: `Some(true)` set as
    /// expected, `Some(false)` clear as expected, `None` the bit
    /// contradicts the mask. Index 0 is the least significant bit.
    pub fn ack_vector(&self, expected: u8) -> [Option<bool>; 8] {
        let mut v = [None; 8];
        for (i, slot) in v.iter_mut().enumerate() {
            let got = self.bits >> i & 1 == 1;
            let want = expected >> i & 1 == 1;
            *slot = if got == want { Some(got) } else { None };
        }
        v
    }
}

/// Interpreted reply to a command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Response {
    /// Nothing expected, nothing received
    None,
    /// Nothing expected but a frame arrived anyway
    Unexpected(Frame),
    Ack,
    /// Silence where an acknowledgement was possible
    NoAck,
    Numeric(u8),
    /// Silence where a data byte was possible
    NoAnswer,
    Mask(MaskResponse),
    /// Framing error, more than one unit answered
    Collision,
}

impl Response {
    /// Interpret a raw bus observation according to the kind of reply
    /// the transmitted command calls for. Total over both inputs.
    pub fn interpret(kind: ResponseKind, raw: RawResponse) -> Response {
        match (kind, raw) {
            (_, RawResponse::FramingError) => Response::Collision,
            (ResponseKind::NoResponse, RawResponse::Timeout) => Response::None,
            (ResponseKind::NoResponse, RawResponse::Frame(f)) => Response::Unexpected(f),
            (ResponseKind::Ack, RawResponse::Timeout) => Response::NoAck,
            (ResponseKind::Ack, RawResponse::Frame(_)) => Response::Ack,
            (ResponseKind::Numeric, RawResponse::Timeout) => Response::NoAnswer,
            (ResponseKind::Numeric, RawResponse::Frame(f)) => match f {
                Frame::Backward(b) => Response::Numeric(b),
                _ => Response::Unexpected(f),
            },
            (ResponseKind::BitmapMask, RawResponse::Timeout) => Response::NoAnswer,
            (ResponseKind::BitmapMask, RawResponse::Frame(f)) => match f {
                Frame::Backward(b) => Response::Mask(MaskResponse::new(b)),
                _ => Response::Unexpected(f),
            },
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::None => write!(f, "(none)"),
            Response::Unexpected(frame) => write!(f, "unexpected {}", frame),
            Response::Ack => write!(f, "ack"),
            Response::NoAck => write!(f, "no ack"),
            Response::Numeric(b) => write!(f, "{:#04x}", b),
            Response::NoAnswer => write!(f, "no answer"),
            Response::Mask(m) => write!(f, "mask {:#010b}", m.bits()),
            Response::Collision => write!(f, "collision"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn framing_is_always_collision() {
        for kind in [
            ResponseKind::NoResponse,
            ResponseKind::Ack,
            ResponseKind::Numeric,
            ResponseKind::BitmapMask,
        ] {
            assert_eq!(
                Response::interpret(kind, RawResponse::FramingError),
                Response::Collision
            );
        }
    }

    #[test]
    fn silence_by_kind() {
        assert_eq!(
            Response::interpret(ResponseKind::NoResponse, RawResponse::Timeout),
            Response::None
        );
        assert_eq!(
            Response::interpret(ResponseKind::Ack, RawResponse::Timeout),
            Response::NoAck
        );
        assert_eq!(
            Response::interpret(ResponseKind::Numeric, RawResponse::Timeout),
            Response::NoAnswer
        );
    }

    #[test]
    fn frames_by_kind() {
        let yes = RawResponse::Frame(Frame::Backward(0xff));
        assert_eq!(
            Response::interpret(ResponseKind::NoResponse, yes),
            Response::Unexpected(Frame::Backward(0xff))
        );
        assert_eq!(Response::interpret(ResponseKind::Ack, yes), Response::Ack);
        assert_eq!(
            Response::interpret(ResponseKind::Numeric, yes),
            Response::Numeric(0xff)
        );
        assert_eq!(
            Response::interpret(ResponseKind::BitmapMask, RawResponse::Frame(Frame::Backward(0x81))),
            Response::Mask(MaskResponse::new(0x81))
        );
    }

    #[test]
    fn mask_ack_vector() {
        let m = MaskResponse::new(0b1010_0001);
        let v = m.ack_vector(0b1010_0011);
        assert_eq!(v[0], Some(true));
        assert_eq!(v[1], None); // expected set, came back clear
        assert_eq!(v[2], Some(false));
        assert_eq!(v[5], Some(true));
        assert_eq!(v[7], Some(true));
    }
}
