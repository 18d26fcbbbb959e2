// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-core - Instructions the stub steps over itself
//!
//! When a watchpoint fires, PC still points at the load or store that
//! triggered it.  Resuming would re-execute the access and immediately trap
//! again, so the stub performs the access on the program's behalf and moves
//! PC past it.  Only the 32-bit load/store forms are handled:
//!
//! ```text
//!   l32i    at, as, imm8   t s 2 0 | imm8 | 0x2 in op1 of byte 1
//!   l32i.n  at, as, imm4   8       | imm4 s
//!   s32i    at, as, imm8   t s 2 0 | imm8 | 0x6 in op1 of byte 1
//!   s32i.n  at, as, imm4   9       | imm4 s
//! ```
//!
//! The same applies to BREAK and BREAK.N, which are skipped over - as long
//! as GDB hasn't already put the original instruction back.

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::frame::ExceptionFrame;
use crate::mem::{Bus, Memory};

/// Direction of a load/store instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Load,
    Store,
}

/// One recognised load/store encoding.
#[derive(Debug)]
pub struct LoadStoreForm {
    pub mnemonic: &'static str,
    pub access: Access,
    /// Encoded length in bytes
    pub width: u32,
    matches: fn(&[u8; 3]) -> bool,
    offset: fn(&[u8; 3]) -> u32,
}

/// The load/store encodings that can be emulated.  Anything else at a
/// watchpoint is left alone.
pub static LOAD_STORE_FORMS: [LoadStoreForm; 4] = [
    LoadStoreForm {
        mnemonic: "l32i",
        access: Access::Load,
        width: 3,
        matches: |b| b[0] & 0x0F == 0x2 && b[1] & 0xF0 == 0x20,
        offset: |b| b[2] as u32,
    },
    LoadStoreForm {
        mnemonic: "l32i.n",
        access: Access::Load,
        width: 2,
        matches: |b| b[0] & 0x0F == 0x8,
        offset: |b| (b[1] >> 4) as u32,
    },
    LoadStoreForm {
        mnemonic: "s32i",
        access: Access::Store,
        width: 3,
        matches: |b| b[0] & 0x0F == 0x2 && b[1] & 0xF0 == 0x60,
        offset: |b| b[2] as u32,
    },
    LoadStoreForm {
        mnemonic: "s32i.n",
        access: Access::Store,
        width: 2,
        matches: |b| b[0] & 0x0F == 0x9,
        offset: |b| (b[1] >> 4) as u32,
    },
];

/// A decoded load/store instruction.
#[derive(Debug, Clone, Copy)]
pub struct LoadStore {
    pub form: &'static LoadStoreForm,
    /// Register loaded into, or stored from
    pub at: usize,
    /// Base address register
    pub base: usize,
    /// Offset in words
    pub offset: u32,
}

impl LoadStore {
    /// Decodes the instruction starting with `bytes`.  Narrow forms only
    /// use the first two bytes.
    pub fn decode(bytes: &[u8; 3]) -> Option<Self> {
        let form = LOAD_STORE_FORMS.iter().find(|form| (form.matches)(bytes))?;
        Some(Self {
            form,
            at: (bytes[0] >> 4) as usize,
            base: (bytes[1] & 0x0F) as usize,
            offset: (form.offset)(bytes),
        })
    }

    /// Returns the address accessed, given the current register values.
    pub fn effective_address(&self, frame: &ExceptionFrame) -> u32 {
        frame.ar(self.base).wrapping_add(self.offset * 4)
    }
}

/// Performs the load or store at `frame.pc` and advances PC past it.
///
/// The access goes straight to the bus - the address is the one the program
/// was about to access anyway.  Returns `None`, changing nothing, if the
/// instruction isn't one of [`LOAD_STORE_FORMS`].
pub fn emulate<B: Bus>(frame: &mut ExceptionFrame, mem: &mut Memory<B>) -> Option<LoadStore> {
    let bytes = mem.read_bytes::<3>(frame.pc);
    let Some(insn) = LoadStore::decode(&bytes) else {
        debug!(
            "Note:  No l32i/s32i at 0x{:08X}: {:02X} {:02X} {:02X}",
            frame.pc, bytes[0], bytes[1], bytes[2]
        );
        return None;
    };

    let addr = insn.effective_address(frame);
    trace!(
        "Exec:  Emulate {} a{}, a{} @ 0x{addr:08X}",
        insn.form.mnemonic, insn.at, insn.base
    );
    match insn.form.access {
        Access::Load => {
            let value = mem.bus().read_word(addr);
            frame.set_ar(insn.at, value);
        }
        Access::Store => {
            let value = frame.ar(insn.at);
            mem.bus_mut().write_word(addr, value);
        }
    }
    frame.pc = frame.pc.wrapping_add(insn.form.width);

    Some(insn)
}

/// Length of a BREAK instruction
pub const BREAK_WIDTH: u32 = 3;

/// Length of a BREAK.N instruction
pub const BREAKN_WIDTH: u32 = 2;

/// Whether `bytes` hold a BREAK s, t instruction (`0000 0000 0100 s t 0000`).
pub fn is_break(bytes: &[u8; 3]) -> bool {
    bytes[2] == 0x00 && bytes[1] & 0xF0 == 0x40 && bytes[0] & 0x0F == 0x00
}

/// Whether `bytes` hold a BREAK.N instruction (`1111 imm 0010 1101`).
pub fn is_break_n(bytes: &[u8; 2]) -> bool {
    bytes[1] & 0xF0 == 0xF0 && bytes[0] == 0x2D
}

/// Moves PC past a BREAK instruction, if there is still one at PC.
/// Returns whether PC was moved.
pub fn skip_break<B: Bus>(frame: &mut ExceptionFrame, mem: &Memory<B>) -> bool {
    if is_break(&mem.read_bytes::<3>(frame.pc)) {
        frame.pc = frame.pc.wrapping_add(BREAK_WIDTH);
        true
    } else {
        false
    }
}

/// Moves PC past a BREAK.N instruction, if there is still one at PC.
/// Returns whether PC was moved.
pub fn skip_break_n<B: Bus>(frame: &mut ExceptionFrame, mem: &Memory<B>) -> bool {
    if is_break_n(&mem.read_bytes::<2>(frame.pc)) {
        frame.pc = frame.pc.wrapping_add(BREAKN_WIDTH);
        true
    } else {
        false
    }
}
