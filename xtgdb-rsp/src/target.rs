// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-rsp - Debug hardware
//!
//! The lx106 has one instruction breakpoint register (IBREAKA) and one data
//! breakpoint register pair (DBREAKA/DBREAKC).  Programming them needs
//! special register writes, so the platform provides that side and the stub
//! just asks.

use core::fmt;

/// Hardware debug features the stub drives on GDB's behalf.
pub trait DebugHardware {
    /// Sets a hardware breakpoint.  Returns whether one could be set.
    fn set_breakpoint(&mut self, addr: u32, len: u32) -> bool;

    /// Removes the hardware breakpoint at `addr`.  Returns whether there was
    /// one.
    fn clear_breakpoint(&mut self, addr: u32) -> bool;

    /// Sets a watchpoint on `addr`.  `mask` is the DBREAKC mask, which
    /// selects how many low address bits are ignored.  Returns whether the
    /// watchpoint could be set.
    fn set_watchpoint(&mut self, addr: u32, mask: u8, kind: WatchKind) -> bool;

    /// Removes the watchpoint at `addr`.  Returns whether there was one.
    fn clear_watchpoint(&mut self, addr: u32) -> bool;

    /// Makes instruction fetches see memory GDB has just written.
    fn sync_caches(&mut self);

    /// Arms the instruction counter so the target traps back into the stub
    /// after executing one instruction.
    fn arm_single_step(&mut self);
}

/// The accesses that trigger a watchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchKind {
    Write,
    Read,
    Access,
}

impl WatchKind {
    /// Returns the DBREAKC load/store enable bits for this kind.
    pub const fn access_bits(self) -> u8 {
        match self {
            WatchKind::Read => 1,
            WatchKind::Write => 2,
            WatchKind::Access => 3,
        }
    }
}

impl fmt::Display for WatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchKind::Write => write!(f, "write"),
            WatchKind::Read => write!(f, "read"),
            WatchKind::Access => write!(f, "access"),
        }
    }
}

/// Returns the DBREAKC mask covering a naturally aligned region of `len`
/// bytes, or `None` if `len` isn't a power of two from 1 to 64.
pub const fn watch_mask(len: u32) -> Option<u8> {
    match len {
        1 => Some(0x3F),
        2 => Some(0x3E),
        4 => Some(0x3C),
        8 => Some(0x38),
        16 => Some(0x30),
        32 => Some(0x20),
        64 => Some(0x00),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_masks() {
        for shift in 0..=6 {
            let len = 1u32 << shift;
            assert_eq!(watch_mask(len), Some(0x3F & !((len - 1) as u8)), "len {len}");
        }
        for len in [0, 3, 5, 12, 63, 65, 128] {
            assert_eq!(watch_mask(len), None, "len {len}");
        }
    }
}
