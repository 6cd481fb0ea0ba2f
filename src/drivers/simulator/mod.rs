//! In-process bus with simulated control gear, used for testing
//! sequences without hardware.

pub mod gear;
#[allow(clippy::module_inception)]
pub mod simulator;
#[cfg(test)]
mod test;
