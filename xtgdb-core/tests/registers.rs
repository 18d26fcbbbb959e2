use xtgdb_core::ExceptionFrame;
use xtgdb_core::regs::{WIRE_REG_COUNT, WireReg};

#[test]
fn wire_values_are_byte_swapped() {
    let mut frame = ExceptionFrame::default();
    frame.pc = 0x4010_1234;
    frame.set_ar(5, 0x0102_0304);

    assert_eq!(frame.wire_reg(WireReg::Pc), 0x3412_1040);
    assert_eq!(frame.wire_reg(WireReg::Ar(5)), 0x0403_0201);

    frame.set_wire_reg(WireReg::Ar(6), 0x0403_0201);
    assert_eq!(frame.ar(6), 0x0102_0304);
}

#[test]
fn to_wire_order() {
    let mut frame = ExceptionFrame::default();
    for n in 0..16 {
        frame.set_ar(n, n as u32 + 1);
    }
    frame.pc = 0x100;
    frame.sar = 0x200;
    frame.litbase = 0x300;
    frame.sr176 = 0x400;
    frame.sr208 = 0x500;
    frame.ps = 0x600;

    let wire = frame.to_wire();
    for n in 0..16 {
        assert_eq!(wire[n], (n as u32 + 1).swap_bytes());
    }
    assert_eq!(wire[16], 0x100u32.swap_bytes());
    assert_eq!(wire[17], 0x200u32.swap_bytes());
    assert_eq!(wire[18], 0x300u32.swap_bytes());
    assert_eq!(wire[19], 0x400u32.swap_bytes());
    assert_eq!(wire[20], 0);
    assert_eq!(wire[21], 0x600u32.swap_bytes());
}

#[test]
fn load_wire_then_to_wire_round_trips() {
    let mut regs = [0u32; WIRE_REG_COUNT];
    for (n, reg) in regs.iter_mut().enumerate() {
        *reg = 0x1111_1111u32.wrapping_mul(n as u32 + 1);
    }
    regs[20] = 0;

    let mut frame = ExceptionFrame::default();
    frame.load_wire(&regs);
    assert_eq!(frame.to_wire(), regs);
}

#[test]
fn load_wire_ignores_reserved_slot() {
    let mut regs = [0u32; WIRE_REG_COUNT];
    regs[20] = 0xFFFF_FFFF;

    let mut frame = ExceptionFrame::default();
    frame.sr208 = 0x55;
    frame.load_wire(&regs);
    assert_eq!(frame.sr208, 0x55);
    assert_eq!(frame.to_wire()[20], 0);
}
