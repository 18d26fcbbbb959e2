// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb - Configuration

use core::fmt;

/// UART GDB is attached to.
pub const GDB_UART: u32 = 0;

/// Interrupt number shared by the ESP8266's UARTs.
pub const UART_INUM: u32 = 5;

/// Runtime choices passed to [`crate::init()`].
///
/// Each option only has an effect if the matching crate feature is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Send `os_printf` output to GDB's console.  Needs the `console`
    /// feature.
    pub console: bool,

    /// Stop the running program when GDB is interrupted (Ctrl-C).  Needs the
    /// `break-on-ctrl-c` feature.
    pub break_on_ctrl_c: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            console: true,
            break_on_ctrl_c: true,
        }
    }
}

/// Errors from [`crate::init()`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The stub has already been installed.
    AlreadyInitialized,
}

impl InitError {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitError::AlreadyInitialized => "Already Initialized",
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
