// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-rsp - Program output as GDB console packets
//!
//! Once GDB owns the UART, anything else the program prints would corrupt
//! the protocol.  Output is instead buffered and sent as `O` packets, which
//! GDB prints on its console.

use heapless::Vec;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::codec::PacketWriter;
use crate::transport::ByteTransport;

/// Bytes of output buffered before an `O` packet is sent regardless.
pub const CONSOLE_BUFFER_SIZE: usize = 32;

/// Buffers program output a line at a time.
#[derive(Debug, Default)]
pub struct Console {
    buf: Vec<u8, CONSOLE_BUFFER_SIZE>,
}

impl Console {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Buffers `c`, sending the buffer to GDB if it is now full or `c` ends
    /// a line.
    pub fn write_char<T: ByteTransport + ?Sized>(&mut self, c: u8, transport: &mut T) {
        // Can't fail - the buffer is flushed as soon as it fills
        let _ = self.buf.push(c);
        if c == b'\n' || self.buf.is_full() {
            self.flush(transport);
        }
    }

    /// Sends anything buffered.
    pub fn flush<T: ByteTransport + ?Sized>(&mut self, transport: &mut T) {
        if self.buf.is_empty() {
            return;
        }

        let mut packet = PacketWriter::start(transport);
        packet.char(b'O');
        packet.hex_bytes(&self.buf);
        packet.end();
        self.buf.clear();
    }

    /// Number of bytes waiting to be sent.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
