use crate::command::Command;
use crate::drivers::driver::{DaliDriver, DaliSendResult};
use crate::drivers::send_flags::Flags;
use crate::drivers::simulator::gear::SimGear;
use crate::error::DynFuture;
use crate::frame::Frame;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Driver backed by a set of simulated gear instead of a bus.
///
/// Reply aggregation follows the electrical behavior: exactly one
/// answering unit gives a backward frame, several at once give a
/// framing error, none gives a timeout.
pub struct SimDriver {
    gears: Arc<Mutex<Vec<SimGear>>>,
}

impl SimDriver {
    pub fn new(gears: Vec<SimGear>) -> SimDriver {
        SimDriver {
            gears: Arc::new(Mutex::new(gears)),
        }
    }

    /// Shared handle to the simulated units, for inspecting their
    /// state from tests.
    pub fn gears(&self) -> Arc<Mutex<Vec<SimGear>>> {
        self.gears.clone()
    }
}

impl DaliDriver for SimDriver {
    fn send_frame(&mut self, frame: &Frame, flags: Flags) -> DynFuture<DaliSendResult> {
        let frame = *frame;
        let gears = self.gears.clone();
        Box::pin(async move {
            let mut gears = gears.lock().await;
            let mut replies = Vec::new();
            if let Command::Gear(cmd) = Command::decode(frame) {
                for g in gears.iter_mut() {
                    if let Some(b) = g.react(&cmd) {
                        replies.push(b);
                    }
                }
            }
            match replies[..] {
                [] => {
                    if flags.expect_answer() {
                        DaliSendResult::Timeout
                    } else {
                        DaliSendResult::Ok
                    }
                }
                [b] => DaliSendResult::Answer(Frame::Backward(b)),
                _ => DaliSendResult::Framing,
            }
        })
    }
}
