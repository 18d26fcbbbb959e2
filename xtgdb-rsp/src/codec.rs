// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-rsp - Packet framing, escaping and checksums
//!
//! A packet on the wire is
//!
//! ```text
//!   $ <payload> # <checksum as 2 hex digits>
//! ```
//!
//! where the checksum is the 8-bit sum of the payload bytes as transmitted.
//! `#`, `$`, `}` and `*` within the payload are sent as `}` followed by the
//! byte XOR 0x20.  The receiver acknowledges each packet with `+` (checksum
//! OK) or `-` (bad checksum).
//!
//! The stub never retransmits - if GDB sends `-` in response to one of our
//! packets, GDB will time out and repeat its command.

use heapless::Vec;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use static_assertions::const_assert;

use crate::StubError;
use crate::transport::ByteTransport;
use xtgdb_core::regs::WIRE_REG_COUNT;

/// Size of the buffer holding a received packet's (unescaped) payload.
pub const COMMAND_BUFFER_SIZE: usize = 256;

/// Buffer for one received payload.
pub type CommandBuffer = Vec<u8, COMMAND_BUFFER_SIZE>;

// The largest command the stub accepts is `G`, which carries 8 hex digits
// per register.
const_assert!(COMMAND_BUFFER_SIZE >= 1 + WIRE_REG_COUNT * 8);

const PACKET_START: u8 = b'$';
const PACKET_END: u8 = b'#';
const ESCAPE: u8 = b'}';
const ESCAPE_XOR: u8 = 0x20;
const ACK: u8 = b'+';
const NAK: u8 = b'-';

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Unbounded hex values stop after this many digits, whatever follows.
const MAX_UNBOUNDED_DIGITS: usize = 64;

/// Returns whether `byte` has to be escaped within a packet.
pub const fn needs_escape(byte: u8) -> bool {
    matches!(byte, b'#' | b'$' | b'}' | b'*')
}

/// Sends one packet, escaping and checksumming as it goes.
///
/// ```ignore
/// let mut packet = PacketWriter::start(transport);
/// packet.char(b'T');
/// packet.hex(5, 8);
/// packet.end();
/// ```
pub struct PacketWriter<'a, T: ByteTransport + ?Sized> {
    transport: &'a mut T,
    checksum: u8,
}

impl<'a, T: ByteTransport + ?Sized> PacketWriter<'a, T> {
    /// Begins a packet, sending `$`.
    pub fn start(transport: &'a mut T) -> Self {
        transport.send_byte(PACKET_START);
        Self {
            transport,
            checksum: 0,
        }
    }

    /// Sends a payload byte, escaping it if necessary.
    pub fn char(&mut self, c: u8) {
        if needs_escape(c) {
            self.emit(ESCAPE);
            self.emit(c ^ ESCAPE_XOR);
        } else {
            self.emit(c);
        }
    }

    pub fn str(&mut self, s: &str) {
        for &c in s.as_bytes() {
            self.char(c);
        }
    }

    /// Sends the low `bits` bits of `value` as `bits / 4` lowercase hex
    /// digits, most significant first.
    pub fn hex(&mut self, value: u32, bits: u32) {
        debug_assert!(bits <= 32 && bits % 4 == 0);
        let mut shift = bits;
        while shift > 0 {
            shift -= 4;
            self.char(HEX_DIGITS[((value >> shift) & 0xF) as usize]);
        }
    }

    /// Sends each of `bytes` as two hex digits.
    pub fn hex_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hex(byte as u32, 8);
        }
    }

    /// Ends the packet, sending `#` and the checksum.
    pub fn end(self) {
        let checksum = self.checksum;
        self.transport.send_byte(PACKET_END);
        self.transport.send_byte(HEX_DIGITS[(checksum >> 4) as usize]);
        self.transport.send_byte(HEX_DIGITS[(checksum & 0xF) as usize]);
    }

    fn emit(&mut self, byte: u8) {
        self.transport.send_byte(byte);
        self.checksum = self.checksum.wrapping_add(byte);
    }
}

/// Sends a complete packet with `payload` as its contents.
pub fn send_packet<T: ByteTransport + ?Sized>(transport: &mut T, payload: &str) {
    let mut packet = PacketWriter::start(transport);
    packet.str(payload);
    packet.end();
}

/// Result of waiting for a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// A packet with a good checksum was received and acknowledged.  Its
    /// payload is in the command buffer.
    Packet,

    /// A byte arrived outside of any packet - an acknowledgement, a break
    /// character, or line noise.
    Unsolicited(u8),
}

/// Waits for the next packet from GDB and stores its unescaped payload in
/// `buf`.
///
/// A `$` part way through a packet restarts it.
///
/// Returns
/// - `Ok(Received::Packet)` once a packet has been received and `+` sent.
/// - `Ok(Received::Unsolicited(byte))` if the first byte received didn't
///   start a packet.
/// - `Err(StubError::ChecksumMismatch)` if the checksum was wrong (or not
///   hex).  `-` has been sent.
/// - `Err(StubError::FrameTooLong)` if the payload didn't fit in `buf`.
///   Nothing has been sent, and the rest of the packet is still to be read.
pub fn receive_packet<T: ByteTransport + ?Sized>(
    transport: &mut T,
    buf: &mut CommandBuffer,
) -> Result<Received, StubError> {
    let first = transport.receive_byte();
    if first != PACKET_START {
        return Ok(Received::Unsolicited(first));
    }

    buf.clear();
    let mut checksum = 0u8;
    loop {
        let mut byte = transport.receive_byte();
        match byte {
            PACKET_END => break,
            PACKET_START => {
                trace!("Note:  Packet restarted");
                buf.clear();
                checksum = 0;
                continue;
            }
            _ => (),
        }

        checksum = checksum.wrapping_add(byte);
        if byte == ESCAPE {
            let raw = transport.receive_byte();
            checksum = checksum.wrapping_add(raw);
            byte = raw ^ ESCAPE_XOR;
        }

        if buf.push(byte).is_err() {
            warn!("Error: Packet longer than {COMMAND_BUFFER_SIZE} bytes");
            return Err(StubError::FrameTooLong);
        }
    }

    let trailer = [transport.receive_byte(), transport.receive_byte()];
    let sent = HexCursor::new(&trailer).value(Bits::Fixed(8)).ok();
    if sent != Some(checksum as u32) {
        debug!(
            "Error: Checksum mismatch: calculated {checksum:02x}, got {}{}",
            trailer[0] as char, trailer[1] as char
        );
        transport.send_byte(NAK);
        return Err(StubError::ChecksumMismatch);
    }

    transport.send_byte(ACK);
    Ok(Received::Packet)
}

/// How many hex digits [`HexCursor::value()`] should consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bits {
    /// As many as there are, up to the first non-hex byte.
    Unbounded,

    /// Exactly `n / 4` digits for an `n` bit value.
    Fixed(u32),
}

/// Failure to read a fixed width hex value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexError {
    /// The payload ended before all digits were read.
    EndOfPacket,

    /// A byte which isn't a hex digit was found.
    Malformed,
}

/// Reads hex values and separators from a command payload.
#[derive(Debug, Clone)]
pub struct HexCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> HexCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reads a hex value.
    ///
    /// With [`Bits::Unbounded`] this stops before the first byte that isn't
    /// a hex digit (or at the end of the payload) and never fails.  A value
    /// with no digits at all is 0.
    ///
    /// With [`Bits::Fixed`] every digit must be present.  Digits beyond 8
    /// shift the earliest ones out of the 32-bit result.
    pub fn value(&mut self, bits: Bits) -> Result<u32, HexError> {
        let mut value = 0u32;
        match bits {
            Bits::Unbounded => {
                for _ in 0..MAX_UNBOUNDED_DIGITS {
                    let Some(digit) = self.peek().and_then(hex_digit) else {
                        break;
                    };
                    value = (value << 4) | digit;
                    self.pos += 1;
                }
            }
            Bits::Fixed(bits) => {
                for _ in 0..bits / 4 {
                    let byte = match self.peek() {
                        None | Some(PACKET_END) => return Err(HexError::EndOfPacket),
                        Some(byte) => byte,
                    };
                    let digit = hex_digit(byte).ok_or(HexError::Malformed)?;
                    value = (value << 4) | digit;
                    self.pos += 1;
                }
            }
        }
        Ok(value)
    }

    /// Steps over `n` bytes, typically a separator.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.data.len());
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }
}

fn hex_digit(byte: u8) -> Option<u32> {
    (byte as char).to_digit(16)
}
