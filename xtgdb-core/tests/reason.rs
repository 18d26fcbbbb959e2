use xtgdb_core::{DebugCause, ExceptionCause, ExceptionFrame, Reason, Signal};

#[test]
fn break_request_sentinel_wins_over_exception_flag() {
    assert_eq!(Reason::from_raw(0xFF), Reason::BreakRequest);
    assert_eq!(Reason::BreakRequest.to_raw(), 0xFF);
    assert_eq!(Reason::BreakRequest.signal(), Signal::SIGINT);
}

#[test]
fn high_bit_selects_exception_cause() {
    let reason = Reason::from_raw(0x80 | 9);
    assert_eq!(reason, Reason::Exception(ExceptionCause::LOAD_STORE_ALIGNMENT));
    assert_eq!(reason.signal(), Signal(7));
    assert_eq!(reason.to_raw(), 0x89);
}

#[test]
fn exception_signals_follow_table() {
    let expected = [4, 31, 11, 11, 2, 6, 8, 0, 6, 7, 0, 0, 7, 7, 7, 7];
    for (code, &sig) in expected.iter().enumerate() {
        let reason = Reason::from_raw(0x80 | code as u32);
        assert_eq!(reason.signal(), Signal(sig), "cause {code}");
    }
}

#[test]
fn exception_beyond_table_is_sigsegv() {
    assert_eq!(Reason::from_raw(0x80 | 16).signal(), Signal::SIGSEGV);
    assert_eq!(Reason::from_raw(0x80 | 0x40).signal(), Signal::SIGSEGV);
}

#[test]
fn debug_causes_are_sigtrap() {
    for raw in [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x00] {
        let reason = Reason::from_raw(raw);
        assert!(matches!(reason, Reason::Debug(_)), "raw {raw:#x}");
        assert_eq!(reason.signal(), Signal::SIGTRAP);
    }
}

#[test]
fn debug_cause_flags() {
    let Reason::Debug(cause) = Reason::from_raw(0x0C) else {
        panic!("expected a debug reason");
    };
    assert!(cause.contains(DebugCause::DBREAK));
    assert!(cause.contains(DebugCause::BREAK));
    assert!(!cause.contains(DebugCause::BREAKN));
    assert_eq!(cause, DebugCause::DBREAK | DebugCause::BREAK);
}

#[test]
fn frame_reason_accessors() {
    let mut frame = ExceptionFrame {
        reason: 0x04,
        ..Default::default()
    };
    assert_eq!(frame.reason(), Reason::Debug(DebugCause::DBREAK));

    frame.set_reason(Reason::Exception(ExceptionCause::from_raw(frame.reason)));
    assert_eq!(frame.reason, 0x84);
}
