// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-rsp - Byte transport
//!
//! The stub talks to GDB by polling the UART FIFOs directly.  It runs with
//! interrupts masked, so nothing else is going to move bytes for it, and
//! nothing else is going to feed the watchdog either - hence the keepalive
//! on every receive poll.

use core::ops::{Deref, DerefMut};
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

/// The UART TX FIFO holds 128 bytes.  Stop filling it a couple of bytes
/// short of full.
pub const TX_FIFO_HIGH_WATER: u32 = 126;

/// Byte GDB sends, outside of a packet, to interrupt the running target.
pub const BREAK_CHAR: u8 = 0x03;

/// Raw access to a UART's FIFOs and RX interrupt.
pub trait SerialPort {
    /// Number of bytes waiting in the RX FIFO.
    fn rx_fifo_count(&self) -> u32;

    /// Number of bytes waiting to be sent in the TX FIFO.
    fn tx_fifo_count(&self) -> u32;

    /// Pops a byte from the RX FIFO.  Only call when [`Self::rx_fifo_count`]
    /// is non-zero.
    fn read_fifo(&mut self) -> u8;

    /// Pushes a byte onto the TX FIFO.
    fn write_fifo(&mut self, byte: u8);

    /// Acknowledges the RX FIFO full and RX timeout interrupts.
    fn clear_rx_interrupt(&mut self);
}

/// The hardware watchdog.  On the ESP8266 this is driven by ROM routines,
/// which the stub only needs to disarm, rearm and feed.
pub trait Watchdog {
    fn disable(&mut self);
    fn enable(&mut self);

    /// Pushes the watchdog's timeout back out.
    fn keep_alive(&mut self);
}

/// Blocking single byte I/O.  Neither operation can fail - they wait for
/// as long as it takes.
pub trait ByteTransport {
    fn receive_byte(&mut self) -> u8;
    fn send_byte(&mut self, byte: u8);
}

/// A [`ByteTransport`] polling a [`SerialPort`].
#[derive(Debug)]
pub struct Uart<P: SerialPort, W: Watchdog> {
    port: P,
    wdt: W,
}

impl<P: SerialPort, W: Watchdog> Uart<P, W> {
    pub fn new(port: P, wdt: W) -> Self {
        Self { port, wdt }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn watchdog(&self) -> &W {
        &self.wdt
    }

    /// Disables the watchdog until the returned guard is dropped.
    ///
    /// The guard dereferences to this `Uart`, so I/O carries on through it.
    /// Receives still feed the (disabled) watchdog, which is harmless.
    pub fn suspend_watchdog(&mut self) -> WatchdogGuard<'_, P, W> {
        trace!("Exec:  Disable watchdog");
        self.wdt.disable();
        WatchdogGuard { uart: self }
    }

    /// Reads and discards everything waiting in the RX FIFO, then clears the
    /// RX interrupt.  Returns whether GDB's break character was among the
    /// bytes read.
    ///
    /// Called from the UART interrupt, while the target is running.  Any
    /// other bytes are noise as far as the stub is concerned - GDB doesn't
    /// send packets to a running target.
    pub fn take_break_request(&mut self) -> bool {
        let mut requested = false;
        while self.port.rx_fifo_count() != 0 {
            if self.port.read_fifo() == BREAK_CHAR {
                requested = true;
            }
        }
        self.port.clear_rx_interrupt();

        if requested {
            debug!("Value: Break requested");
        }
        requested
    }
}

impl<P: SerialPort, W: Watchdog> ByteTransport for Uart<P, W> {
    fn receive_byte(&mut self) -> u8 {
        while self.port.rx_fifo_count() == 0 {
            self.wdt.keep_alive();
        }
        self.port.read_fifo()
    }

    fn send_byte(&mut self, byte: u8) {
        while self.port.tx_fifo_count() >= TX_FIFO_HIGH_WATER {
            core::hint::spin_loop();
        }
        self.port.write_fifo(byte);
    }
}

/// Keeps the watchdog disabled for as long as it lives.  Returned by
/// [`Uart::suspend_watchdog()`].
///
/// The stub may sit waiting for GDB indefinitely, so the watchdog is off
/// for the whole of a stop.  It is re-enabled however the stop ends.
pub struct WatchdogGuard<'a, P: SerialPort, W: Watchdog> {
    uart: &'a mut Uart<P, W>,
}

impl<P: SerialPort, W: Watchdog> Deref for WatchdogGuard<'_, P, W> {
    type Target = Uart<P, W>;

    fn deref(&self) -> &Self::Target {
        self.uart
    }
}

impl<P: SerialPort, W: Watchdog> DerefMut for WatchdogGuard<'_, P, W> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.uart
    }
}

impl<P: SerialPort, W: Watchdog> Drop for WatchdogGuard<'_, P, W> {
    fn drop(&mut self) {
        trace!("Exec:  Enable watchdog");
        self.uart.wdt.enable();
    }
}
