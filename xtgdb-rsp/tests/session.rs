mod common;

use common::{FakeBus, FakeHardware, Wire, replies};
use xtgdb_core::frame::{DEBUG_LEVEL, STEP_INTLEVEL};
use xtgdb_core::{DebugCause, ExceptionCause, ExceptionFrame, Reason};
use xtgdb_rsp::{Action, Session, StubError, WatchKind};

const DRAM: u32 = 0x3FFE_8000;

fn session() -> Session<FakeHardware, FakeBus> {
    Session::new(FakeHardware::default(), FakeBus::default())
}

// Runs one command, returning the result and the replies sent
fn run(
    session: &mut Session<FakeHardware, FakeBus>,
    frame: &mut ExceptionFrame,
    payload: &str,
) -> (Result<Action, StubError>, Vec<String>) {
    let mut wire = Wire::default();
    let result = session.dispatch(payload.as_bytes(), frame, &mut wire);
    (result, replies(&wire.tx))
}

#[test]
fn read_registers_in_gdb_order() {
    let mut frame = ExceptionFrame::default();
    for n in 0..16 {
        frame.set_ar(n, 0x1000 + n as u32);
    }
    frame.pc = 0x4010_0A0C;
    frame.sar = 0x11;
    frame.litbase = 0x22;
    frame.sr176 = 0x33;
    frame.sr208 = 0x44;
    frame.ps = 0x0000_0030;

    let (result, replies) = run(&mut session(), &mut frame, "g");
    assert_eq!(result, Ok(Action::Stay));

    let mut expected = String::new();
    for n in 0..16u32 {
        expected += &format!("{:08x}", (0x1000 + n).swap_bytes());
    }
    expected += "0c0a1040"; // pc
    expected += "11000000"; // sar
    expected += "22000000"; // litbase
    expected += "33000000"; // sr176
    expected += "00000000"; // always zero
    expected += "30000000"; // ps
    assert_eq!(replies, [expected]);
}

#[test]
fn write_then_read_registers() {
    let values: Vec<String> = (0..22u32)
        .map(|n| if n == 20 { 0 } else { 0x0101_0101 * (n + 1) })
        .map(|v| format!("{v:08x}"))
        .collect();
    let regs = values.concat();

    let mut session = session();
    let mut frame = ExceptionFrame::default();
    let (result, replies) = run(&mut session, &mut frame, &format!("G{regs}"));
    assert_eq!(result, Ok(Action::Stay));
    assert_eq!(replies, ["OK"]);
    assert_eq!(frame.a0, 0x0101_0101u32.swap_bytes());

    let (_, replies) = run(&mut session, &mut frame, "g");
    assert_eq!(replies, [regs]);
}

#[test]
fn short_write_registers_changes_nothing() {
    let mut frame = ExceptionFrame::default();
    frame.pc = 0x4010_0000;
    let before = frame;

    let (result, replies) = run(&mut session(), &mut frame, &format!("G{}", "ff".repeat(40)));
    assert_eq!(result, Err(StubError::MalformedArgument));
    assert_eq!(replies, ["E01"]);
    assert_eq!(frame, before);
}

#[test]
fn write_then_read_memory() {
    let mut session = session();
    let mut frame = ExceptionFrame::default();

    let (result, replies) = run(&mut session, &mut frame, "M3ffe8001,4:aabbccdd");
    assert_eq!(result, Ok(Action::Stay));
    assert_eq!(replies, ["OK"]);
    assert_eq!(session.hardware().cache_syncs, 2);

    let (_, replies) = run(&mut session, &mut frame, "m3ffe8001,4");
    assert_eq!(replies, ["aabbccdd"]);
    let (_, replies) = run(&mut session, &mut frame, "m3ffe8000,6");
    assert_eq!(replies, ["00aabbccdd00"]);
}

#[test]
fn read_memory_outside_range_is_ff() {
    let (_, replies) = run(&mut session(), &mut ExceptionFrame::default(), "m1ffffffe,4");
    assert_eq!(replies, ["ffff0000"]);
}

#[test]
fn read_memory_of_nothing() {
    let (result, replies) = run(&mut session(), &mut ExceptionFrame::default(), "m3ffe8000,0");
    assert_eq!(result, Ok(Action::Stay));
    assert_eq!(replies, [""]);
}

#[test]
fn write_memory_to_flash_refused() {
    let mut session = session();
    let mut frame = ExceptionFrame::default();

    let (result, replies) = run(&mut session, &mut frame, "M40201000,3:f04100");
    assert_eq!(result, Err(StubError::InvalidMemoryRange));
    assert_eq!(replies, ["E01"]);
    assert!(session.memory().bus().words.is_empty());
    assert_eq!(session.hardware().cache_syncs, 0);
}

#[test]
fn write_memory_ending_outside_window_refused() {
    let mut session = session();
    let (result, replies) = run(
        &mut session,
        &mut ExceptionFrame::default(),
        "M4013fffe,4:01020304",
    );
    assert_eq!(result, Err(StubError::InvalidMemoryRange));
    assert_eq!(replies, ["E01"]);
    assert!(session.memory().bus().words.is_empty());
}

#[test]
fn write_memory_with_bad_data_writes_nothing() {
    let mut session = session();
    let mut frame = ExceptionFrame::default();

    let (result, replies) = run(&mut session, &mut frame, "M3ffe8000,4:aabbzzdd");
    assert_eq!(result, Err(StubError::MalformedArgument));
    assert_eq!(replies, ["E01"]);
    assert!(session.memory().bus().words.is_empty());

    let (result, replies) = run(&mut session, &mut frame, "M3ffe8000,4:aabb");
    assert_eq!(result, Err(StubError::MalformedArgument));
    assert_eq!(replies, ["E01"]);
    assert!(session.memory().bus().words.is_empty());
}

#[test]
fn write_memory_places_software_breakpoint_in_iram() {
    let mut session = session();
    session.memory_mut().bus_mut().load(0x4010_0100, &[0x32, 0x24, 0x02, 0x99]);

    let (result, _) = run(&mut session, &mut ExceptionFrame::default(), "M40100100,3:f04100");
    assert_eq!(result, Ok(Action::Stay));
    assert_eq!(session.memory().bus().words[&0x4010_0100], 0x9900_41F0);
}

#[test]
fn stop_reasons() {
    let cases = [
        (Reason::BreakRequest, "T02"),
        (Reason::Debug(DebugCause::IBREAK), "T05"),
        (Reason::Debug(DebugCause::DBREAK), "T05"),
        (Reason::Exception(ExceptionCause::ILLEGAL_INSTRUCTION), "T04"),
        (Reason::Exception(ExceptionCause::SYSCALL), "T1f"),
        (Reason::Exception(ExceptionCause::LOAD_STORE_ERROR), "T0b"),
        (Reason::Exception(ExceptionCause::INTEGER_DIVIDE_BY_ZERO), "T08"),
        (Reason::Exception(ExceptionCause::LOAD_STORE_ALIGNMENT), "T07"),
        (Reason::Exception(ExceptionCause::from_raw(29)), "T0b"),
    ];
    for (reason, expected) in cases {
        let mut frame = ExceptionFrame::default();
        frame.set_reason(reason);
        let (result, replies) = run(&mut session(), &mut frame, "?");
        assert_eq!(result, Ok(Action::Stay));
        assert_eq!(replies, [expected], "{reason}");
    }
}

#[test]
fn fixed_replies() {
    let mut session = session();
    let mut frame = ExceptionFrame::default();

    let (_, replies) = run(&mut session, &mut frame, "qSupported:multiprocess+;xmlRegisters=i386");
    assert_eq!(replies, ["swbreak+;hwbreak+;PacketSize=255"]);
    let (_, replies) = run(&mut session, &mut frame, "qSupported");
    assert_eq!(replies, ["swbreak+;hwbreak+;PacketSize=255"]);
    let (_, replies) = run(&mut session, &mut frame, "vCont?");
    assert_eq!(replies, ["vCont;c;s"]);
}

#[test]
fn unsupported_commands_get_empty_reply() {
    let mut session = session();
    let mut frame = ExceptionFrame::default();

    let (result, replies) = run(&mut session, &mut frame, "qC");
    assert_eq!(result, Err(StubError::UnsupportedQuery));
    assert_eq!(replies, [""]);

    let (result, replies) = run(&mut session, &mut frame, "Z0,40100100,3");
    assert_eq!(result, Err(StubError::UnrecognizedCommand));
    assert_eq!(replies, [""]);
    assert!(session.hardware().breakpoints.is_empty());
}

#[test]
fn continue_resumes_without_reply() {
    let mut frame = ExceptionFrame::default();
    for cmd in ["c", "vCont;c"] {
        let (result, replies) = run(&mut session(), &mut frame, cmd);
        assert_eq!(result, Ok(Action::Resume));
        assert!(replies.is_empty());
    }
}

#[test]
fn step_masks_interrupts_and_arms_counter() {
    let mut session = session();
    let mut frame = ExceptionFrame {
        ps: 0x0004_0023,
        ..Default::default()
    };

    let (result, replies) = run(&mut session, &mut frame, "s");
    assert_eq!(result, Ok(Action::Resume));
    assert!(replies.is_empty());
    assert_eq!(frame.ps, 0x0004_0021);
    assert_eq!(frame.ps & 0xF, STEP_INTLEVEL);
    assert!(frame.ps & 0xF < DEBUG_LEVEL);
    assert_eq!(session.hardware().steps_armed, 1);
    assert!(session.step_pending());

    // The step traps with the stepped instruction's effects applied
    frame.ps = 0x0004_0031;
    session.complete_step(&mut frame);
    assert_eq!(frame.ps, 0x0004_0033);
    assert!(!session.step_pending());

    // Nothing pending, nothing restored
    session.complete_step(&mut frame);
    assert_eq!(frame.ps, 0x0004_0033);
}

#[test]
fn hardware_breakpoints() {
    let mut session = session();
    let mut frame = ExceptionFrame::default();

    let (result, replies) = run(&mut session, &mut frame, "Z1,40100a0c,3");
    assert_eq!(result, Ok(Action::Stay));
    assert_eq!(replies, ["OK"]);
    let (_, replies) = run(&mut session, &mut frame, "z1,40100a0c,3");
    assert_eq!(replies, ["OK"]);

    assert_eq!(session.hardware().breakpoints, [(0x4010_0A0C, 3)]);
    assert_eq!(session.hardware().cleared_breakpoints, [0x4010_0A0C]);
}

#[test]
fn rejected_breakpoint_is_an_error() {
    let mut session = Session::new(
        FakeHardware {
            reject: true,
            ..Default::default()
        },
        FakeBus::default(),
    );
    let (result, replies) = run(&mut session, &mut ExceptionFrame::default(), "Z1,40100a0c,3");
    assert_eq!(result, Err(StubError::HardwareRejected));
    assert_eq!(replies, ["E01"]);
}

#[test]
fn watchpoint_sizes() {
    let mut session = session();
    let mut frame = ExceptionFrame::default();

    let (result, replies) = run(&mut session, &mut frame, "Z2,3ffe8000,40");
    assert_eq!(result, Ok(Action::Stay));
    assert_eq!(replies, ["OK"]);
    let (_, replies) = run(&mut session, &mut frame, "Z3,3ffe8000,1");
    assert_eq!(replies, ["OK"]);
    let (_, replies) = run(&mut session, &mut frame, "Z4,3ffe8000,4");
    assert_eq!(replies, ["OK"]);

    assert_eq!(
        session.hardware().watchpoints,
        [
            (DRAM, 0x00, WatchKind::Write),
            (DRAM, 0x3F, WatchKind::Read),
            (DRAM, 0x3C, WatchKind::Access),
        ]
    );
}

#[test]
fn unaligned_watchpoint_size_not_requested() {
    let mut session = session();
    let (result, replies) = run(&mut session, &mut ExceptionFrame::default(), "Z2,3ffe8000,3");
    assert_eq!(result, Err(StubError::WatchpointSizeInvalid));
    assert_eq!(replies, ["E01"]);
    assert!(session.hardware().watchpoints.is_empty());
}

#[test]
fn clear_watchpoint() {
    let mut session = session();
    let (result, replies) = run(&mut session, &mut ExceptionFrame::default(), "z4,3ffe8000,4");
    assert_eq!(result, Ok(Action::Stay));
    assert_eq!(replies, ["OK"]);
    assert_eq!(session.hardware().cleared_watchpoints, [DRAM]);
}
