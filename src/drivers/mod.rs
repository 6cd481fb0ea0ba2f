pub mod driver;
pub mod driver_utils;
pub mod send_flags;
pub mod simulator;
