//! Glue between sequences and a bus driver.

use crate::command::Command;
use crate::drivers::driver::{DaliDriver, DaliSendResult};
use crate::drivers::send_flags::{self, Flags};
use crate::response::{Response, ResponseKind};
use crate::sequence::{
    Assignment, Commissioning, CommissioningOptions, Next, Sequence, SequenceError,
};
use log::debug;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Transmit one command, including a preceding ENABLE DEVICE TYPE if
/// the command needs one, and interpret whatever comes back.
pub async fn send_command(
    driver: &mut dyn DaliDriver,
    cmd: &Command,
    flags: Flags,
) -> Result<Response, SequenceError> {
    if let Some(enable) = cmd.enable_frame() {
        match driver.send_frame(&enable, send_flags::NO_FLAG).await {
            DaliSendResult::DriverError(e) => return Err(SequenceError::Driver(e.to_string())),
            // Nothing answers ENABLE DEVICE TYPE
            _ => (),
        }
    }
    let kind = cmd.response_kind();
    let mut flags = flags;
    if kind != ResponseKind::NoResponse {
        flags |= send_flags::EXPECT_ANSWER;
    }
    if cmd.send_twice() {
        flags |= send_flags::SEND_TWICE;
    }
    let raw = driver
        .send_frame(&cmd.frame(), flags)
        .await
        .raw_response()
        .map_err(|e| SequenceError::Driver(e.to_string()))?;
    Ok(Response::interpret(kind, raw))
}

/// Drive a sequence to completion over a driver.
pub async fn run_sequence<S: Sequence>(
    driver: &mut dyn DaliDriver,
    seq: &mut S,
) -> Result<S::Output, SequenceError> {
    let mut reply = None;
    loop {
        match seq.resume(reply.take()) {
            Next::Done(outcome) => return outcome,
            Next::Send(cmd, flags) => {
                let response = send_command(driver, &cmd, flags).await?;
                debug!("step {}: {:?} => {}", seq.steps_taken(), cmd, response);
                reply = Some(response);
            }
        }
    }
}

/// Progress reports from [`commission_stream`].
#[derive(Debug)]
pub enum CommissioningEvent {
    /// A unit was found and given a short address
    Assigned(Assignment),
    /// The whole run finished
    Done(Result<Vec<Assignment>, SequenceError>),
}

/// Run address assignment in a background task, reporting each found
/// unit as it happens.
pub fn commission_stream(
    mut driver: Box<dyn DaliDriver>,
    options: CommissioningOptions,
) -> ReceiverStream<CommissioningEvent> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut seq = Commissioning::new(options);
        let mut reply = None;
        let mut reported = 0;
        let outcome = loop {
            match seq.resume(reply.take()) {
                Next::Done(outcome) => break outcome,
                Next::Send(cmd, flags) => {
                    match send_command(driver.as_mut(), &cmd, flags).await {
                        Ok(response) => reply = Some(response),
                        Err(e) => break Err(e),
                    }
                }
            }
            for a in &seq.assignments()[reported..] {
                reported += 1;
                if tx.send(CommissioningEvent::Assigned(a.clone())).await.is_err() {
                    // Receiver gone, stop driving the bus
                    return;
                }
            }
        };
        let _ = tx.send(CommissioningEvent::Done(outcome)).await;
    });
    ReceiverStream::new(rx)
}
