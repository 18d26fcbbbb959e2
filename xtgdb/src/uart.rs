// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb - ESP8266 UART FIFO access
//!
//! Only the FIFO, status and interrupt registers are touched.  Baud rate and
//! pin setup are left as the application configured them.

use core::ptr::{read_volatile, write_volatile};

use crate::config::GDB_UART;
use xtgdb_rsp::SerialPort;

const UART_BASE: u32 = 0x6000_0000;
const UART_STRIDE: u32 = 0xF00;

const FIFO: u32 = 0x00;
const INT_ENA: u32 = 0x0C;
const INT_CLR: u32 = 0x10;
const STATUS: u32 = 0x1C;

const RXFIFO_CNT_SHIFT: u32 = 0;
const TXFIFO_CNT_SHIFT: u32 = 16;
const FIFO_CNT_MASK: u32 = 0xFF;

const RXFIFO_FULL_INT: u32 = 1 << 0;
const RXFIFO_TOUT_INT: u32 = 1 << 8;

/// The UART GDB is attached to.
#[derive(Debug)]
pub struct GdbUart {
    base: u32,
}

impl GdbUart {
    pub const fn new() -> Self {
        Self {
            base: UART_BASE + GDB_UART * UART_STRIDE,
        }
    }

    /// Enables the RX FIFO full and RX timeout interrupts, so a break from
    /// GDB is noticed while the program runs.
    pub fn enable_rx_interrupt(&mut self) {
        let ena = self.read(INT_ENA);
        self.write(INT_ENA, ena | RXFIFO_FULL_INT | RXFIFO_TOUT_INT);
    }

    fn read(&self, offset: u32) -> u32 {
        // SAFETY: UART registers are always mapped and word aligned
        unsafe { read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&mut self, offset: u32, value: u32) {
        // SAFETY: UART registers are always mapped and word aligned
        unsafe { write_volatile((self.base + offset) as *mut u32, value) }
    }
}

impl SerialPort for GdbUart {
    fn rx_fifo_count(&self) -> u32 {
        (self.read(STATUS) >> RXFIFO_CNT_SHIFT) & FIFO_CNT_MASK
    }

    fn tx_fifo_count(&self) -> u32 {
        (self.read(STATUS) >> TXFIFO_CNT_SHIFT) & FIFO_CNT_MASK
    }

    fn read_fifo(&mut self) -> u8 {
        self.read(FIFO) as u8
    }

    fn write_fifo(&mut self, byte: u8) {
        self.write(FIFO, byte as u32);
    }

    fn clear_rx_interrupt(&mut self) {
        self.write(INT_CLR, RXFIFO_FULL_INT | RXFIFO_TOUT_INT);
    }
}
