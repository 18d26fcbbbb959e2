// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb is a GDB stub for the ESP8266, running on the target itself.
//!
//! xtgdb-rsp - GDB remote serial protocol engine
//!
//! The following diagram shows the key `xtgdb-rsp` concepts.
//!
//! ```text
//!   exception vectors  |  Stub  ==  UART0  ==  GDB (xtensa-lx106-elf-gdb)
//! --------------------
//!       Session         \
//! --------------------   |--  StubError
//!   PacketWriter /       |
//!   receive_packet      /
//! --------------------
//!   Uart<SerialPort, Watchdog>
//! ```
//!
//! * [`Stub`] is the debug session.  The platform glue calls one of its
//!   entry points when the target traps, and it talks to GDB until GDB
//!   resumes the target.
//! * [`dispatch::Session`] executes parsed [`Command`]s against the exception
//!   frame, target memory and the [`DebugHardware`].
//! * [`codec`] implements `$payload#cc` framing, escaping and checksums.
//! * [`transport::Uart`] provides blocking byte I/O over a [`SerialPort`],
//!   keeping the [`Watchdog`] fed while it waits.
//!
//! Everything hardware specific sits behind a trait, so the whole protocol
//! engine can be exercised on the host.  The ESP8266 implementations are in
//! the `xtgdb` crate.
//!
//! This library is `no_std` and does not allocate.

#![no_std]

pub mod codec;
pub mod command;
pub mod console;
pub mod context;
pub mod dispatch;
pub mod stub;
pub mod target;
pub mod transport;

#[doc(inline)]
pub use crate::codec::{HexCursor, PacketWriter};
#[doc(inline)]
pub use crate::command::Command;
#[doc(inline)]
pub use crate::context::{ContextBridge, InterruptContext, TrapContext};
#[doc(inline)]
pub use crate::dispatch::{Action, Session};
#[doc(inline)]
pub use crate::stub::Stub;
#[doc(inline)]
pub use crate::target::{DebugHardware, WatchKind};
#[doc(inline)]
pub use crate::transport::{ByteTransport, SerialPort, Uart, Watchdog};

use core::fmt;

/// Reply to a command which succeeded but has nothing else to say.
pub const REPLY_OK: &str = "OK";

/// Reply to a command which failed.  GDB doesn't interpret the number, so
/// every failure uses the same one.
pub const REPLY_ERROR: &str = "E01";

/// Error type used by all xtgdb-rsp objects
///
/// None of these are fatal.  By the time an error is returned the stub has
/// already replied to GDB (or deliberately not replied), and the stop loop
/// carries on reading commands.  Use [`StubError::reply()`] to find out what
/// GDB is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubError {
    /// A packet's checksum didn't match its contents.  GDB has been sent a
    /// `-`.
    ChecksumMismatch,

    /// A packet was longer than the command buffer.  It was not acknowledged
    /// and its remaining bytes are discarded as unsolicited input.
    FrameTooLong,

    /// The command isn't one the stub supports.  Includes software
    /// breakpoints (`Z0`), which GDB implements itself by writing memory.
    UnrecognizedCommand,

    /// A command's arguments could not be parsed.
    MalformedArgument,

    /// GDB tried to write outside of the writable memory regions - most
    /// likely a software breakpoint on code in flash.
    InvalidMemoryRange,

    /// A `q` packet other than `qSupported`.
    UnsupportedQuery,

    /// A watchpoint length which the DBREAK mask can't express.
    WatchpointSizeInvalid,

    /// The breakpoint or watchpoint registers refused the request, for
    /// example because they are all in use.
    HardwareRejected,
}

impl StubError {
    /// Returns a string representation of the error.
    pub fn as_str(&self) -> &'static str {
        match self {
            StubError::ChecksumMismatch => "Checksum Mismatch",
            StubError::FrameTooLong => "Frame Too Long",
            StubError::UnrecognizedCommand => "Unrecognized Command",
            StubError::MalformedArgument => "Malformed Argument",
            StubError::InvalidMemoryRange => "Invalid Memory Range",
            StubError::UnsupportedQuery => "Unsupported Query",
            StubError::WatchpointSizeInvalid => "Invalid Watchpoint Size",
            StubError::HardwareRejected => "Hardware Rejected Request",
        }
    }

    /// Returns the reply packet GDB gets for a command failing with this
    /// error, or `None` for framing errors, which aren't replied to.
    ///
    /// An empty reply tells GDB the command isn't supported.
    pub fn reply(&self) -> Option<&'static str> {
        match self {
            StubError::ChecksumMismatch | StubError::FrameTooLong => None,
            StubError::UnrecognizedCommand | StubError::UnsupportedQuery => Some(""),
            StubError::MalformedArgument
            | StubError::InvalidMemoryRange
            | StubError::WatchpointSizeInvalid
            | StubError::HardwareRejected => Some(REPLY_ERROR),
        }
    }
}

impl fmt::Display for StubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<codec::HexError> for StubError {
    fn from(_error: codec::HexError) -> Self {
        StubError::MalformedArgument
    }
}
