// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-rsp - GDB commands
//!
//! Only the commands needed to read and write registers and memory, resume
//! and step, and manage hardware breakpoints and watchpoints are supported.
//! GDB copes with an empty reply to anything else.

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use strum::AsRefStr;

use crate::StubError;
use crate::codec::{Bits, HexCursor};
use crate::target::WatchKind;
use xtgdb_core::regs::WIRE_REG_COUNT;

/// A parsed command packet.  Borrows from the command buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum Command<'a> {
    /// `g`
    ReadRegisters,

    /// `G` - the register file, as sent (byte swapped)
    WriteRegisters([u32; WIRE_REG_COUNT]),

    /// `m addr,len`
    ReadMemory { addr: u32, len: u32 },

    /// `M addr,len:data` - `data` is still hex encoded, and not yet checked
    WriteMemory { addr: u32, len: u32, data: &'a [u8] },

    /// `?`
    StopReason,

    /// `vCont?`
    ContinueModes,

    /// `c` or `vCont;c`
    Continue,

    /// `s` or `vCont;s`
    Step,

    /// `qSupported`, with any features GDB lists ignored
    Supported,

    /// `Z1,addr,len`
    SetBreakpoint { addr: u32, len: u32 },

    /// `z1,addr,len`
    ClearBreakpoint { addr: u32 },

    /// `Z2`, `Z3` or `Z4`, `addr,len`
    SetWatchpoint { kind: WatchKind, addr: u32, len: u32 },

    /// `z2`, `z3` or `z4`, `addr,len`
    ClearWatchpoint { kind: WatchKind, addr: u32 },
}

impl<'a> Command<'a> {
    /// Parses a received payload.
    ///
    /// Returns
    /// - `Err(StubError::UnrecognizedCommand)` for anything unsupported,
    ///   including software breakpoints (`Z0`).
    /// - `Err(StubError::UnsupportedQuery)` for `q` packets other than
    ///   `qSupported`.
    /// - `Err(StubError::MalformedArgument)` if a `G` packet doesn't hold a
    ///   complete register file.
    pub fn parse(payload: &'a [u8]) -> Result<Self, StubError> {
        let Some((&cmd, args)) = payload.split_first() else {
            return Err(StubError::UnrecognizedCommand);
        };

        if payload.starts_with(b"vCont?") {
            return Ok(Command::ContinueModes);
        }
        if payload.starts_with(b"vCont;c") {
            return Ok(Command::Continue);
        }
        if payload.starts_with(b"vCont;s") {
            return Ok(Command::Step);
        }

        match cmd {
            b'g' => Ok(Command::ReadRegisters),
            b'G' => Self::parse_registers(args),
            b'm' => {
                let mut cursor = HexCursor::new(args);
                let (addr, len) = Self::addr_len(&mut cursor)?;
                Ok(Command::ReadMemory { addr, len })
            }
            b'M' => {
                let mut cursor = HexCursor::new(args);
                let (addr, len) = Self::addr_len(&mut cursor)?;
                cursor.skip(1);
                Ok(Command::WriteMemory {
                    addr,
                    len,
                    data: cursor.remaining(),
                })
            }
            b'?' => Ok(Command::StopReason),
            b'c' => Ok(Command::Continue),
            b's' => Ok(Command::Step),
            b'q' if args.starts_with(b"Supported") => Ok(Command::Supported),
            b'q' => Err(StubError::UnsupportedQuery),
            b'Z' | b'z' => Self::parse_point(cmd == b'Z', args),
            _ => Err(StubError::UnrecognizedCommand),
        }
    }

    // `type,addr,len`
    fn parse_point(set: bool, args: &'a [u8]) -> Result<Self, StubError> {
        let kind = match args.first() {
            Some(b'1') => None,
            Some(b'2') => Some(WatchKind::Write),
            Some(b'3') => Some(WatchKind::Read),
            Some(b'4') => Some(WatchKind::Access),
            _ => return Err(StubError::UnrecognizedCommand),
        };

        let mut cursor = HexCursor::new(args);
        cursor.skip(2);
        let (addr, len) = Self::addr_len(&mut cursor)?;

        Ok(match (set, kind) {
            (true, None) => Command::SetBreakpoint { addr, len },
            (false, None) => Command::ClearBreakpoint { addr },
            (true, Some(kind)) => Command::SetWatchpoint { kind, addr, len },
            (false, Some(kind)) => Command::ClearWatchpoint { kind, addr },
        })
    }

    // `addr,len`, leaving the cursor after len
    fn addr_len(cursor: &mut HexCursor<'_>) -> Result<(u32, u32), StubError> {
        let addr = cursor.value(Bits::Unbounded)?;
        cursor.skip(1);
        let len = cursor.value(Bits::Unbounded)?;
        Ok((addr, len))
    }

    fn parse_registers(args: &[u8]) -> Result<Self, StubError> {
        let mut cursor = HexCursor::new(args);
        let mut regs = [0u32; WIRE_REG_COUNT];
        for reg in regs.iter_mut() {
            *reg = cursor.value(Bits::Fixed(32)).inspect_err(|e| {
                debug!("Error: Bad register file: {e:?}");
            })?;
        }
        Ok(Command::WriteRegisters(regs))
    }
}
