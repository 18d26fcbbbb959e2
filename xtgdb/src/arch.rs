// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb - lx106 special registers, debug hardware and memory bus

use core::arch::asm;
use core::ptr::{read_volatile, write_volatile};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use xtgdb_core::Bus;
use xtgdb_core::frame::DEBUG_LEVEL;
use xtgdb_rsp::{DebugHardware, WatchKind};

// ICOUNT traps when it increments to 0.  One increment is taken by the
// RFE/RFI returning to the program, so -2 stops after one instruction.
const ICOUNT_ONE_INSN: i32 = -2;

// Routines in the entry assembly, which own IBREAKA, DBREAKA and DBREAKC.
// Return non-zero on success.
unsafe extern "C" {
    fn gdbstub_set_hw_breakpoint(addr: u32, len: u32) -> i32;
    fn gdbstub_del_hw_breakpoint(addr: u32) -> i32;
    fn gdbstub_set_hw_watchpoint(addr: u32, mask: u32, access: u32) -> i32;
    fn gdbstub_del_hw_watchpoint(addr: u32) -> i32;
}

/// Returns EPC1, the PC a level 1 interrupt or exception returns to.
#[inline]
pub fn read_epc1() -> u32 {
    let epc: u32;
    // SAFETY: Reading EPC1 has no side effects
    unsafe { asm!("rsr {0}, epc1", out(reg) epc, options(nomem, nostack)) };
    epc
}

/// Sets the PC the current level 1 interrupt returns to.
#[inline]
pub fn write_epc1(epc: u32) {
    // SAFETY: Only called from a level 1 interrupt, just before returning
    unsafe { asm!("wsr {0}, epc1", in(reg) epc, options(nostack)) };
}

/// Enables interrupt `inum` in INTENABLE.
pub fn enable_interrupt(inum: u32) {
    // SAFETY: Read-modify-write of INTENABLE, only adding the one bit
    unsafe {
        asm!(
            "rsr {en}, intenable",
            "or {en}, {en}, {bit}",
            "wsr {en}, intenable",
            en = out(reg) _,
            bit = in(reg) 1u32 << inum,
            options(nostack),
        )
    };
}

/// The lx106's debug registers, programmed through the entry assembly.
#[derive(Debug, Default)]
pub struct Esp8266Debug;

impl DebugHardware for Esp8266Debug {
    fn set_breakpoint(&mut self, addr: u32, len: u32) -> bool {
        // SAFETY: Only writes IBREAKA/IBREAKENABLE
        unsafe { gdbstub_set_hw_breakpoint(addr, len) != 0 }
    }

    fn clear_breakpoint(&mut self, addr: u32) -> bool {
        // SAFETY: Only writes IBREAKENABLE
        unsafe { gdbstub_del_hw_breakpoint(addr) != 0 }
    }

    fn set_watchpoint(&mut self, addr: u32, mask: u8, kind: WatchKind) -> bool {
        // SAFETY: Only writes DBREAKA/DBREAKC
        unsafe {
            gdbstub_set_hw_watchpoint(addr, mask as u32, kind.access_bits() as u32) != 0
        }
    }

    fn clear_watchpoint(&mut self, addr: u32) -> bool {
        // SAFETY: Only writes DBREAKC
        unsafe { gdbstub_del_hw_watchpoint(addr) != 0 }
    }

    fn sync_caches(&mut self) {
        // SAFETY: ISYNC only waits for the pipeline to drain
        unsafe { asm!("isync", options(nomem, nostack)) };
    }

    fn arm_single_step(&mut self) {
        // SAFETY: ICOUNT only counts at levels below ICOUNTLEVEL, so this
        // doesn't fire until the program is resumed
        unsafe {
            asm!(
                "wsr {level}, icountlevel",
                "wsr {count}, icount",
                "isync",
                level = in(reg) DEBUG_LEVEL,
                count = in(reg) ICOUNT_ONE_INSN,
                options(nostack),
            )
        };
    }
}

/// Direct access to the address space.  [`xtgdb_core::Memory`] only passes
/// word aligned addresses in the ranges it allows.
#[derive(Debug, Default)]
pub struct RawBus;

impl Bus for RawBus {
    fn read_word(&self, addr: u32) -> u32 {
        // SAFETY: Aligned, and range checked by the caller
        unsafe { read_volatile(addr as *const u32) }
    }

    fn write_word(&mut self, addr: u32, value: u32) {
        // SAFETY: Aligned, and range checked by the caller
        unsafe { write_volatile(addr as *mut u32, value) }
    }
}
