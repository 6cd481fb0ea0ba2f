use crate::drivers::send_flags::Flags;
use crate::error::DynFuture;
use crate::frame::Frame;
use crate::response::RawResponse;
use std::error::Error;
use std::fmt;

/// Result of sending one forward frame.
#[derive(Debug)]
pub enum DaliSendResult {
    /// Sent, no answer requested
    Ok,
    /// A backward frame was received in the reply slot
    Answer(Frame),
    /// Reply slot elapsed in silence
    Timeout,
    /// Undecodable transmission in the reply slot
    Framing,
    DriverError(Box<dyn Error + Send + Sync>),
}

impl DaliSendResult {
    /// Fold into the raw response the interpreter understands.
    /// Driver failures are kept as errors.
    pub fn raw_response(self) -> Result<RawResponse, DaliSendResult> {
        match self {
            DaliSendResult::Ok => Ok(RawResponse::Timeout),
            DaliSendResult::Answer(f) => Ok(RawResponse::Frame(f)),
            DaliSendResult::Timeout => Ok(RawResponse::Timeout),
            DaliSendResult::Framing => Ok(RawResponse::FramingError),
            err => Err(err),
        }
    }
}

impl fmt::Display for DaliSendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaliSendResult::Ok => write!(f, "ok"),
            DaliSendResult::Answer(frame) => write!(f, "answer {}", frame),
            DaliSendResult::Timeout => write!(f, "timeout"),
            DaliSendResult::Framing => write!(f, "framing error"),
            DaliSendResult::DriverError(e) => write!(f, "driver error: {}", e),
        }
    }
}

/// A bus transceiver. Implementations transmit the frame, wait out
/// the reply slot when an answer is expected and report what the bus
/// did.
pub trait DaliDriver: Send {
    fn send_frame(&mut self, frame: &Frame, flags: Flags) -> DynFuture<DaliSendResult>;
}
