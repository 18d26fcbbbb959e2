// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-core - Register bridge
//!
//! Maps the [`ExceptionFrame`] onto the register file the lx106 GDB port
//! expects, as described by `gdb/regformats/reg-xtensa.dat` from the lx106
//! crosstool-NG overlay:
//!
//! ```text
//!   a0 a1 a2 .. a15 pc sar litbase sr176 <zero> ps
//! ```
//!
//! GDB wants each value in target (little-endian) byte order, but reads the
//! hex digits as a big-endian number, so every value crossing the wire is
//! byte swapped.  The internal accessors, used by instruction emulation, are
//! not.

use core::fmt;

use crate::frame::{ExceptionFrame, FRAME_AR_COUNT};

/// Number of address registers.
pub const AR_COUNT: usize = FRAME_AR_COUNT + 2;

/// Number of registers sent by a `g` packet, and expected by `G`.
pub const WIRE_REG_COUNT: usize = AR_COUNT + 6;

/// A slot in GDB's register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireReg {
    /// Address register a0 to a15
    Ar(u8),
    Pc,
    Sar,
    Litbase,
    Sr176,
    /// Always sent as zero, and ignored when written
    Reserved,
    Ps,
}

impl WireReg {
    /// Returns the register at `index` in GDB's order.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0..AR_COUNT => Some(WireReg::Ar(index as u8)),
            16 => Some(WireReg::Pc),
            17 => Some(WireReg::Sar),
            18 => Some(WireReg::Litbase),
            19 => Some(WireReg::Sr176),
            20 => Some(WireReg::Reserved),
            21 => Some(WireReg::Ps),
            _ => None,
        }
    }
}

impl fmt::Display for WireReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireReg::Ar(n) => write!(f, "a{n}"),
            WireReg::Pc => write!(f, "pc"),
            WireReg::Sar => write!(f, "sar"),
            WireReg::Litbase => write!(f, "litbase"),
            WireReg::Sr176 => write!(f, "sr176"),
            WireReg::Reserved => write!(f, "reserved"),
            WireReg::Ps => write!(f, "ps"),
        }
    }
}

impl ExceptionFrame {
    /// Returns address register `index` (0 to 15).
    ///
    /// Panics if `index` is out of range.  Instruction fields are 4 bits
    /// wide, so decoded register numbers always are in range.
    pub fn ar(&self, index: usize) -> u32 {
        match index {
            0 => self.a0,
            1 => self.a1,
            _ => self.a[index - 2],
        }
    }

    /// Sets address register `index` (0 to 15).
    pub fn set_ar(&mut self, index: usize, value: u32) {
        match index {
            0 => self.a0 = value,
            1 => self.a1 = value,
            _ => self.a[index - 2] = value,
        }
    }

    /// Returns a register from GDB's register file, byte swapped.
    pub fn wire_reg(&self, reg: WireReg) -> u32 {
        let value = match reg {
            WireReg::Ar(n) => self.ar(n as usize),
            WireReg::Pc => self.pc,
            WireReg::Sar => self.sar,
            WireReg::Litbase => self.litbase,
            WireReg::Sr176 => self.sr176,
            WireReg::Reserved => 0,
            WireReg::Ps => self.ps,
        };
        value.swap_bytes()
    }

    /// Stores a byte swapped value from GDB's register file.
    pub fn set_wire_reg(&mut self, reg: WireReg, value: u32) {
        let value = value.swap_bytes();
        match reg {
            WireReg::Ar(n) => self.set_ar(n as usize, value),
            WireReg::Pc => self.pc = value,
            WireReg::Sar => self.sar = value,
            WireReg::Litbase => self.litbase = value,
            WireReg::Sr176 => self.sr176 = value,
            WireReg::Reserved => (),
            WireReg::Ps => self.ps = value,
        }
    }

    /// Returns the whole register file in GDB's order, byte swapped.
    pub fn to_wire(&self) -> [u32; WIRE_REG_COUNT] {
        let mut regs = [0u32; WIRE_REG_COUNT];
        for (index, slot) in regs.iter_mut().enumerate() {
            if let Some(reg) = WireReg::from_index(index) {
                *slot = self.wire_reg(reg);
            }
        }
        regs
    }

    /// Loads the whole register file from GDB.  The reserved slot is
    /// ignored.
    pub fn load_wire(&mut self, regs: &[u32; WIRE_REG_COUNT]) {
        for (index, &value) in regs.iter().enumerate() {
            if let Some(reg) = WireReg::from_index(index) {
                self.set_wire_reg(reg, value);
            }
        }
    }
}
