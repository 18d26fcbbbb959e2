// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb is a GDB stub for the ESP8266, running on the target itself.
//!
//! xtgdb - ESP8266 integration
//!
//! Connects the `xtgdb-rsp` protocol engine to the hardware:
//!
//! * UART0's FIFO and interrupt registers, in [`uart`].
//! * The hardware watchdog, via the ROM, in [`wdt`].
//! * The lx106 debug registers and special registers, in [`arch`].
//! * The exception entry assembly and RTOS hooks, in [`entry`].
//!
//! The entry assembly (`gdbstub-entry.S`) is linked in by the application
//! and provides `gdbstub_debug_exception_entry` and the debug register
//! routines.
//!
//! Call [`init()`] once, early in startup:
//!
//! ```ignore
//! xtgdb::init(xtgdb::Config::default()).ok();
//! ```
//!
//! Once GDB is attached, UART0 belongs to it.  Don't route `log` output to
//! UART0 (`os_printf` output is passed through to GDB's console if the
//! `console` feature is enabled).
//!
//! This library is `no_std` and only builds for Xtensa targets.

#![no_std]
#![cfg(target_arch = "xtensa")]
#![cfg_attr(target_arch = "xtensa", feature(asm_experimental_arch))]

pub mod arch;
pub mod config;
pub mod entry;
pub mod uart;
pub mod wdt;

#[doc(inline)]
pub use crate::config::{Config, InitError};
#[doc(inline)]
pub use crate::entry::Esp8266Stub;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// Installs the stub.
///
/// After this, debug and user exceptions stop the program and wait for GDB.
/// Depending on `config`, program output is also sent to GDB's console, and
/// the program can be stopped from GDB with Ctrl-C.
///
/// Returns `Err(InitError::AlreadyInitialized)` if called more than once.
pub fn init(config: Config) -> Result<(), InitError> {
    if !entry::install(entry::new_stub()) {
        warn!("Error: xtgdb already initialized");
        return Err(InitError::AlreadyInitialized);
    }

    if config.console {
        #[cfg(feature = "console")]
        entry::install_console();
        #[cfg(not(feature = "console"))]
        warn!("Note:  Console support not built in");
    }

    if config.break_on_ctrl_c {
        #[cfg(feature = "break-on-ctrl-c")]
        entry::install_break_interrupt();
        #[cfg(not(feature = "break-on-ctrl-c"))]
        warn!("Note:  Ctrl-C support not built in");
    }

    entry::install_exception_handler();
    info!("OK:    xtgdb installed on UART{}", config::GDB_UART);
    Ok(())
}
