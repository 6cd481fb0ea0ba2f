use crate::command::Command;
use crate::common::address::Short;
use crate::drivers::driver::{DaliDriver, DaliSendResult};
use crate::drivers::driver_utils::{
    commission_stream, run_sequence, send_command, CommissioningEvent,
};
use crate::drivers::send_flags::{Flags, NO_FLAG};
use crate::error::DynFuture;
use crate::frame::Frame;
use crate::gear::cmd_defs::GearCommand;
use crate::drivers::simulator::gear::SimGear;
use crate::drivers::simulator::simulator::SimDriver;
use crate::sequence::memory_bank::bank_checksum;
use crate::sequence::{
    Commissioning, CommissioningOptions, MemoryBankRead, QueryDeviceTypes, SequenceError,
};
use crate::utils::address_set::AddressSet;
use crate::utils::memory_banks::read_bank0_info;
use futures::executor::block_on;
use tokio_stream::StreamExt;

fn make_bank(payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0, 0];
    bytes.extend_from_slice(payload);
    bytes[0] = (bytes.len() - 1) as u8;
    bytes[1] = bank_checksum(&bytes);
    bytes
}

#[test]
fn commission_full_bus() {
    let randoms = [0x123456, 0x000001, 0xfffffe, 0x800000, 0x7fffff];
    let gears = randoms
        .iter()
        .map(|r| SimGear::new().with_random_address(*r))
        .collect();
    let mut driver = SimDriver::new(gears);
    let handle = driver.gears();

    let mut seq = Commissioning::new(CommissioningOptions::default());
    let assigned = block_on(run_sequence(&mut driver, &mut seq)).unwrap();

    assert_eq!(assigned.len(), randoms.len());
    // Lowest random address is isolated first
    let mut sorted = randoms;
    sorted.sort();
    for (i, a) in assigned.iter().enumerate() {
        assert_eq!(a.long, sorted[i]);
        assert_eq!(a.short, Short::new(i as u8));
    }
    let gears = handle.try_lock().unwrap();
    for g in gears.iter() {
        let expect = sorted.iter().position(|r| *r == g.random_address()).unwrap();
        assert_eq!(g.short_address(), Some(Short::new(expect as u8)));
    }
}

#[test]
fn commission_empty_bus() {
    let mut driver = SimDriver::new(Vec::new());
    let mut seq = Commissioning::new(CommissioningOptions::default());
    let assigned = block_on(run_sequence(&mut driver, &mut seq)).unwrap();
    assert!(assigned.is_empty());
}

#[test]
fn commission_pool_exhaustion() {
    let gears = vec![
        SimGear::new().with_random_address(0x000100),
        SimGear::new().with_random_address(0x000200),
    ];
    let mut driver = SimDriver::new(gears);
    let options = CommissioningOptions {
        pool: AddressSet::new(&[Short::new(33)]),
        ..Default::default()
    };
    let mut seq = Commissioning::new(options);
    match block_on(run_sequence(&mut driver, &mut seq)) {
        Err(SequenceError::ShortAddressesExhausted { assigned }) => {
            assert_eq!(assigned.len(), 1);
            assert_eq!(assigned[0].long, 0x000100);
            assert_eq!(assigned[0].short, Short::new(33));
        }
        r => panic!("unexpected outcome {:?}", r),
    }
}

#[test]
fn commission_skips_addressed_units() {
    // Default options only initialise unaddressed units; the address
    // the first unit already holds is detected as in use and the new
    // unit gets the next free one
    let gears = vec![
        SimGear::new()
            .with_random_address(0x000010)
            .with_short_address(Short::new(0)),
        SimGear::new().with_random_address(0x000020),
    ];
    let mut driver = SimDriver::new(gears);
    let handle = driver.gears();
    let mut seq = Commissioning::new(CommissioningOptions::default());
    let assigned = block_on(run_sequence(&mut driver, &mut seq)).unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].long, 0x000020);
    assert_eq!(assigned[0].short, Short::new(1));
    let gears = handle.try_lock().unwrap();
    assert_eq!(gears[0].short_address(), Some(Short::new(0)));
    assert_eq!(gears[1].short_address(), Some(Short::new(1)));
}

#[test]
fn commission_random_address_clash() {
    // Both units pick the same random address on the first RANDOMISE;
    // the run recovers by re-randomising and still numbers every unit
    let gears = vec![
        SimGear::new()
            .with_random_address(0x004000)
            .with_random_address(0x200000),
        SimGear::new()
            .with_random_address(0x004000)
            .with_random_address(0x100000),
    ];
    let mut driver = SimDriver::new(gears);
    let handle = driver.gears();
    let mut seq = Commissioning::new(CommissioningOptions::default());
    let assigned = block_on(run_sequence(&mut driver, &mut seq)).unwrap();
    assert_eq!(assigned.len(), 2);
    assert_eq!(assigned[0].long, 0x100000);
    assert_eq!(assigned[1].long, 0x200000);
    let gears = handle.try_lock().unwrap();
    assert_eq!(gears[0].short_address(), Some(Short::new(1)));
    assert_eq!(gears[1].short_address(), Some(Short::new(0)));
}

#[test]
fn commission_readdress() {
    let gears = vec![
        SimGear::new()
            .with_random_address(0x000010)
            .with_short_address(Short::new(55)),
        SimGear::new()
            .with_random_address(0x000020)
            .with_short_address(Short::new(44)),
    ];
    let mut driver = SimDriver::new(gears);
    let options = CommissioningOptions {
        readdress: true,
        ..Default::default()
    };
    let mut seq = Commissioning::new(options);
    let assigned = block_on(run_sequence(&mut driver, &mut seq)).unwrap();
    assert_eq!(assigned.len(), 2);
    assert_eq!(assigned[0].short, Short::new(0));
    assert_eq!(assigned[1].short, Short::new(1));
}

#[test]
fn read_memory_bank() {
    let bytes = make_bank(&[0x11, 0x22, 0x33, 0x44, 0x55]);
    let gear = SimGear::new()
        .with_short_address(Short::new(3))
        .with_memory_bank(0, bytes.clone());
    let mut driver = SimDriver::new(vec![gear]);
    let mut seq = MemoryBankRead::new(Short::new(3).into(), 0);
    let dump = block_on(run_sequence(&mut driver, &mut seq)).unwrap();
    assert_eq!(dump.bytes, bytes);
}

#[test]
fn read_memory_bank_bad_checksum() {
    let mut bytes = make_bank(&[0x11, 0x22]);
    bytes[3] ^= 0x80;
    let gear = SimGear::new()
        .with_short_address(Short::new(3))
        .with_memory_bank(0, bytes.clone());
    let mut driver = SimDriver::new(vec![gear]);
    let mut seq = MemoryBankRead::new(Short::new(3).into(), 0);
    match block_on(run_sequence(&mut driver, &mut seq)) {
        Err(SequenceError::Checksum {
            declared,
            computed,
            bytes: read,
        }) => {
            assert_eq!(declared, bytes[1]);
            assert_eq!(computed, bank_checksum(&bytes));
            assert_eq!(read, bytes);
        }
        r => panic!("unexpected outcome {:?}", r),
    }
}

#[test]
fn read_missing_memory_bank() {
    let gear = SimGear::new().with_short_address(Short::new(3));
    let mut driver = SimDriver::new(vec![gear]);
    let mut seq = MemoryBankRead::new(Short::new(3).into(), 2);
    assert_eq!(
        block_on(run_sequence(&mut driver, &mut seq)),
        Err(SequenceError::Timeout)
    );
}

#[test]
fn bank0_info() {
    let mut bytes = vec![0u8; 0x1b];
    bytes[0] = 0x1a;
    bytes[0x03..=0x08].copy_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x00, 0x02]);
    bytes[0x09] = 1;
    bytes[0x15] = 0x09;
    bytes[0x19] = 1;
    bytes[1] = bank_checksum(&bytes);
    let gear = SimGear::new()
        .with_short_address(Short::new(0))
        .with_memory_bank(0, bytes);
    let mut driver = SimDriver::new(vec![gear]);
    let info = block_on(read_bank0_info(&mut driver, Short::new(0).into())).unwrap();
    assert_eq!(info.gtin, 0x0000_0001_0002);
    assert_eq!(info.firmware_version, 0x0100);
    assert_eq!(info.n_control_gears, 1);
}

#[test]
fn query_device_types() {
    let gears = vec![
        SimGear::new()
            .with_short_address(Short::new(0))
            .with_device_types(vec![6]),
        SimGear::new()
            .with_short_address(Short::new(1))
            .with_device_types(vec![1, 6, 8]),
        SimGear::new().with_short_address(Short::new(2)),
    ];
    let mut driver = SimDriver::new(gears);
    for (addr, expect) in [
        (0u8, vec![6u8]),
        (1, vec![1, 6, 8]),
        (2, vec![]),
    ] {
        let mut seq = QueryDeviceTypes::new(Short::new(addr).into());
        let types = block_on(run_sequence(&mut driver, &mut seq)).unwrap();
        assert_eq!(types, expect, "short address {}", addr);
    }
}

/// Driver that only records what goes over the bus.
struct RecordingDriver {
    frames: Vec<Frame>,
}

impl DaliDriver for RecordingDriver {
    fn send_frame(&mut self, frame: &Frame, flags: Flags) -> DynFuture<DaliSendResult> {
        self.frames.push(*frame);
        Box::pin(async move {
            if flags.expect_answer() {
                DaliSendResult::Timeout
            } else {
                DaliSendResult::Ok
            }
        })
    }
}

#[test]
fn extended_command_sends_enable_device_type_first() {
    let mut driver = RecordingDriver { frames: Vec::new() };
    let cmd: Command = GearCommand::AppExtended {
        addr: Short::new(0).into(),
        opcode: 0xe3,
        device_type: Some(8),
    }
    .into();
    block_on(send_command(&mut driver, &cmd, NO_FLAG)).unwrap();
    assert_eq!(
        driver.frames,
        vec![
            GearCommand::EnableDeviceType(8).frame(),
            Frame::Forward16([0x01, 0xe3])
        ]
    );
}

#[tokio::test]
async fn commission_stream_reports_progress() {
    let gears = vec![
        SimGear::new().with_random_address(0x000003),
        SimGear::new().with_random_address(0x000001),
        SimGear::new().with_random_address(0x000002),
    ];
    let driver = SimDriver::new(gears);
    let mut stream = commission_stream(Box::new(driver), CommissioningOptions::default());
    let mut seen = Vec::new();
    while let Some(event) = stream.next().await {
        match event {
            CommissioningEvent::Assigned(a) => seen.push(a),
            CommissioningEvent::Done(outcome) => {
                let assigned = outcome.unwrap();
                assert_eq!(assigned, seen);
                assert_eq!(assigned.len(), 3);
                assert_eq!(assigned[0].long, 0x000001);
                return;
            }
        }
    }
    panic!("stream ended without a Done event");
}
