// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-rsp - Getting the interrupted context into the exception frame
//!
//! Debug and user exceptions enter through assembly which fills in the
//! [`ExceptionFrame`] itself.  A break requested from GDB arrives as a UART
//! interrupt instead, by which point the RTOS's interrupt entry code has
//! already saved the interrupted context in its own places:
//!
//! ```text
//!   EPC1                      pc
//!   debug_saved_ctx[0..2]     a0, a1
//!   a1 - 0x50  word 2         ps
//!              words 5..=15   a2 to a12
//! ```
//!
//! [`InterruptContext`] copies those into the frame for the stop, and back
//! out again afterwards, so changes GDB makes take effect.  a13 to a15 aren't
//! saved by the interrupt entry code, so aren't visible to GDB.

use xtgdb_core::ExceptionFrame;

/// Moves the interrupted context into and out of the exception frame around
/// a stop.
pub trait ContextBridge {
    /// Fills in `frame` before the stop.
    fn capture(&mut self, frame: &mut ExceptionFrame);

    /// Writes back any changes GDB made to `frame` during the stop.
    fn restore(&mut self, frame: &ExceptionFrame);
}

/// Context for exceptions whose entry code fills the frame directly.
/// Nothing to do.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrapContext;

impl ContextBridge for TrapContext {
    fn capture(&mut self, _frame: &mut ExceptionFrame) {}
    fn restore(&mut self, _frame: &ExceptionFrame) {}
}

/// Offset below the interrupted a1 of the interrupt entry code's register
/// save area.
pub const ISR_FRAME_OFFSET: u32 = 0x50;

/// Number of words of the save area the stub uses.
pub const ISR_FRAME_WORDS: usize = 16;

const ISR_PS: usize = 2;
const ISR_A2: usize = 5;

// Highest register saved by the interrupt entry code
const ISR_LAST_AR: usize = 12;

/// Returns the address of the interrupt save area, given the interrupted
/// a1 (stack pointer).
pub const fn isr_frame_address(a1: u32) -> u32 {
    a1.wrapping_sub(ISR_FRAME_OFFSET)
}

/// Context saved by the RTOS's level 1 interrupt entry code.
#[derive(Debug)]
pub struct InterruptContext<'a> {
    epc: u32,
    saved: &'a mut [u32; 2],
    isr_frame: &'a mut [u32; ISR_FRAME_WORDS],
}

impl<'a> InterruptContext<'a> {
    /// `epc` is the interrupt's EPC value, `saved` the a0/a1 pair and
    /// `isr_frame` the save area at [`isr_frame_address()`].
    pub fn new(
        epc: u32,
        saved: &'a mut [u32; 2],
        isr_frame: &'a mut [u32; ISR_FRAME_WORDS],
    ) -> Self {
        Self {
            epc,
            saved,
            isr_frame,
        }
    }

    /// Returns the PC to resume at.  After [`ContextBridge::restore()`] the
    /// caller must write this back to EPC.
    pub fn epc(&self) -> u32 {
        self.epc
    }
}

impl ContextBridge for InterruptContext<'_> {
    fn capture(&mut self, frame: &mut ExceptionFrame) {
        frame.pc = self.epc;
        frame.a0 = self.saved[0];
        frame.a1 = self.saved[1];
        frame.ps = self.isr_frame[ISR_PS];
        for reg in 2..=ISR_LAST_AR {
            frame.set_ar(reg, self.isr_frame[ISR_A2 + reg - 2]);
        }
    }

    fn restore(&mut self, frame: &ExceptionFrame) {
        self.epc = frame.pc;
        self.saved[0] = frame.a0;
        self.saved[1] = frame.a1;
        self.isr_frame[ISR_PS] = frame.ps;
        for reg in 2..=ISR_LAST_AR {
            self.isr_frame[ISR_A2 + reg - 2] = frame.ar(reg);
        }
    }
}
