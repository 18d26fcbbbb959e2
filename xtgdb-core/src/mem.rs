// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-core - ESP8266 memory map and memory access
//!
//! GDB reads and writes memory a byte at a time, but much of the ESP8266's
//! address space (IRAM, the flash cache, peripherals) only tolerates aligned
//! 32-bit accesses.  [`Memory`] turns byte accesses into masked word
//! accesses on a [`Bus`], and refuses to touch addresses that would fault.

use core::ops::Range;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// Range [`Memory`] will read from and write to.  Anything outside of this
/// reads as [`INVALID_BYTE`].
pub const ACCESSIBLE: Range<u32> = 0x2000_0000..0x6000_0000;

/// DRAM and the DPORT/peripheral registers below it
pub const DRAM: Range<u32> = 0x3FF0_0000..0x4000_0000;

/// Instruction RAM
pub const IRAM: Range<u32> = 0x4010_0000..0x4014_0000;

/// First peripheral block (UART0, SPI, GPIO)
pub const PERIPHERALS: Range<u32> = 0x6000_0000..0x6000_2000;

/// Regions that really are writable memory.  Notably this excludes the
/// flash-mapped code at 0x4020_0000, where GDB can't place software
/// breakpoints.
pub const WRITABLE: [Range<u32>; 3] = [DRAM, IRAM, PERIPHERALS];

/// Value returned when reading outside of [`ACCESSIBLE`].
pub const INVALID_BYTE: u8 = 0xFF;

/// Word access to the target's address space.
///
/// On the target this is a volatile load or store.  Addresses passed in are
/// always word aligned.
pub trait Bus {
    /// Reads the word at `addr`.
    fn read_word(&self, addr: u32) -> u32;

    /// Writes the word at `addr`.
    fn write_word(&mut self, addr: u32, value: u32);
}

/// Byte granular memory access on top of a [`Bus`].
#[derive(Debug)]
pub struct Memory<B: Bus> {
    bus: B,
}

impl<B: Bus> Memory<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Reads the byte at `addr`, or [`INVALID_BYTE`] if the address is not
    /// accessible.
    pub fn read_byte(&self, addr: u32) -> u8 {
        if !ACCESSIBLE.contains(&addr) {
            return INVALID_BYTE;
        }

        let word = self.bus.read_word(addr & !3);
        (word >> lane_shift(addr)) as u8
    }

    /// Writes the byte at `addr`, leaving the rest of the containing word
    /// untouched.  Writes outside of the accessible range are ignored.
    pub fn write_byte(&mut self, addr: u32, data: u8) {
        if !ACCESSIBLE.contains(&addr) {
            trace!("Note:  Ignoring write to 0x{addr:08X}");
            return;
        }

        let aligned = addr & !3;
        let shift = lane_shift(addr);
        let word = self.bus.read_word(aligned);
        let word = (word & !(0xFF << shift)) | ((data as u32) << shift);
        self.bus.write_word(aligned, word);
    }

    /// Reads `N` consecutive bytes starting at `addr`.
    pub fn read_bytes<const N: usize>(&self, addr: u32) -> [u8; N] {
        let mut bytes = [0u8; N];
        for (offset, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read_byte(addr.wrapping_add(offset as u32));
        }
        bytes
    }

    /// Returns whether it makes sense to write to `addr`.  Checked before
    /// GDB is allowed to modify memory.
    pub fn is_writable(addr: u32) -> bool {
        WRITABLE.iter().any(|region| region.contains(&addr))
    }

    /// Returns the underlying bus, for word accesses which have already been
    /// validated.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Returns the underlying bus mutably.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

// Little-endian: byte 0 of a word is its least significant byte
#[inline]
fn lane_shift(addr: u32) -> u32 {
    (addr & 3) * 8
}
