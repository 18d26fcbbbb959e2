// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb - ESP8266 hardware watchdog
//!
//! Enabling and disabling go through the ROM.  Feeding is done directly, by
//! pushing the overflow point out past the current count.

use core::ptr::{read_volatile, write_volatile};

use xtgdb_rsp::Watchdog;

const ROM_WDT_DISABLE: usize = 0x4000_30F0;
const ROM_WDT_ENABLE: usize = 0x4000_2FA0;

// 64-bit counter, and 64-bit overflow point
const WDT_VALUE: u32 = 0x3FF2_1048;
const WDT_OVERFLOW: u32 = 0x3FF2_10CC;
const WDT_CTRL: u32 = 0x3FF2_10C8;
const WDT_CTRL_RELOAD: u32 = 1 << 31;

// How far past the current count the overflow point is pushed on each feed
const WDT_KEEPALIVE_TICKS: u64 = 1_600_000;

/// The watchdog, driven through the ESP8266 ROM routines.
#[derive(Debug, Default)]
pub struct RomWatchdog;

impl RomWatchdog {
    fn call_rom(addr: usize) {
        // SAFETY: Fixed ROM entry points taking no arguments
        let f: extern "C" fn() = unsafe { core::mem::transmute(addr as *const ()) };
        f();
    }
}

impl Watchdog for RomWatchdog {
    fn disable(&mut self) {
        Self::call_rom(ROM_WDT_DISABLE);
    }

    fn enable(&mut self) {
        Self::call_rom(ROM_WDT_ENABLE);
    }

    fn keep_alive(&mut self) {
        let value = read_u64(WDT_VALUE);
        write_u64(WDT_OVERFLOW, value.wrapping_add(WDT_KEEPALIVE_TICKS));

        // SAFETY: Watchdog control register, always mapped
        unsafe {
            let ctrl = WDT_CTRL as *mut u32;
            write_volatile(ctrl, read_volatile(ctrl) | WDT_CTRL_RELOAD);
        }
    }
}

// The overflow register is only word aligned, so 64-bit values are moved as
// two words, low word first.
fn read_u64(addr: u32) -> u64 {
    // SAFETY: Watchdog registers, always mapped and word aligned
    let (lo, hi) = unsafe {
        (
            read_volatile(addr as *const u32),
            read_volatile((addr + 4) as *const u32),
        )
    };
    ((hi as u64) << 32) | lo as u64
}

fn write_u64(addr: u32, value: u64) {
    // SAFETY: Watchdog registers, always mapped and word aligned
    unsafe {
        write_volatile(addr as *mut u32, value as u32);
        write_volatile((addr + 4) as *mut u32, (value >> 32) as u32);
    }
}
