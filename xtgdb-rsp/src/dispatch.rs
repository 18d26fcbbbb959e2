// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-rsp - Command execution
//!
//! [`Session`] owns the target side state a command can touch - memory, the
//! debug hardware and any pending single step - and executes commands
//! against the exception frame of the current stop.  Every command gets
//! exactly one reply, apart from those resuming the target, which get none.

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::codec::{Bits, HexCursor, PacketWriter, send_packet};
use crate::command::Command;
use crate::target::{DebugHardware, watch_mask};
use crate::transport::ByteTransport;
use crate::{REPLY_OK, StubError};
use xtgdb_core::frame::STEP_INTLEVEL;
use xtgdb_core::{Bus, ExceptionFrame, Memory};

/// Capabilities reported in reply to `qSupported`.
pub const SUPPORTED: &str = "swbreak+;hwbreak+;PacketSize=255";

/// Reply to `vCont?`.
pub const CONTINUE_MODES: &str = "vCont;c;s";

// PS.INTLEVEL is the low nibble of PS
const PS_INTLEVEL_MASK: u32 = 0xF;

/// What the stop loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Wait for another command.
    Stay,

    /// Return to the program.
    Resume,
}

/// State commands operate on, beyond the exception frame.
#[derive(Debug)]
pub struct Session<H: DebugHardware, B: Bus> {
    hw: H,
    mem: Memory<B>,
    step_ps: Option<u32>,
}

impl<H: DebugHardware, B: Bus> Session<H, B> {
    pub fn new(hw: H, bus: B) -> Self {
        Self {
            hw,
            mem: Memory::new(bus),
            step_ps: None,
        }
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn memory(&self) -> &Memory<B> {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut Memory<B> {
        &mut self.mem
    }

    /// Whether the target was resumed by a single step which hasn't yet
    /// completed.
    pub fn step_pending(&self) -> bool {
        self.step_ps.is_some()
    }

    /// Called on entry to a debug exception.  If a single step was pending,
    /// puts back the interrupt level it overrode.
    pub fn complete_step(&mut self, frame: &mut ExceptionFrame) {
        if let Some(saved) = self.step_ps.take() {
            trace!("Exec:  Restore PS.INTLEVEL {}", saved & PS_INTLEVEL_MASK);
            frame.ps = (frame.ps & !PS_INTLEVEL_MASK) | (saved & PS_INTLEVEL_MASK);
        }
    }

    /// Sends the `T` stop reply for the current stop.
    pub fn send_stop_reason<T: ByteTransport + ?Sized>(
        &self,
        frame: &ExceptionFrame,
        transport: &mut T,
    ) {
        let reason = frame.reason();
        let signal = reason.signal();
        debug!("Value: Stopped: {reason}, signal {signal}");

        let mut packet = PacketWriter::start(transport);
        packet.char(b'T');
        packet.hex(signal.number() as u32, 8);
        packet.end();
    }

    /// Parses and executes one command payload, replying to GDB.
    ///
    /// Errors have been replied to (if a reply is due) before being
    /// returned.
    pub fn dispatch<T: ByteTransport + ?Sized>(
        &mut self,
        payload: &[u8],
        frame: &mut ExceptionFrame,
        transport: &mut T,
    ) -> Result<Action, StubError> {
        let result = Command::parse(payload).and_then(|cmd| {
            let name: &str = cmd.as_ref();
            trace!("Exec:  {name}");
            self.execute(&cmd, frame, transport)
        });

        if let Err(e) = result {
            debug!("Error: {e} handling {:?}", Payload(payload));
            if let Some(reply) = e.reply() {
                send_packet(transport, reply);
            }
        }
        result
    }

    /// Executes a command.  On success the reply has been sent.  On error
    /// nothing has been sent - see [`Self::dispatch()`].
    pub fn execute<T: ByteTransport + ?Sized>(
        &mut self,
        cmd: &Command<'_>,
        frame: &mut ExceptionFrame,
        transport: &mut T,
    ) -> Result<Action, StubError> {
        match *cmd {
            Command::ReadRegisters => {
                let mut packet = PacketWriter::start(transport);
                for reg in frame.to_wire() {
                    packet.hex(reg, 32);
                }
                packet.end();
            }
            Command::WriteRegisters(regs) => {
                frame.load_wire(&regs);
                send_packet(transport, REPLY_OK);
            }
            Command::ReadMemory { addr, len } => {
                let mut packet = PacketWriter::start(transport);
                for offset in 0..len {
                    packet.hex(self.mem.read_byte(addr.wrapping_add(offset)) as u32, 8);
                }
                packet.end();
            }
            Command::WriteMemory { addr, len, data } => {
                self.write_memory(addr, len, data)?;
                send_packet(transport, REPLY_OK);
            }
            Command::StopReason => self.send_stop_reason(frame, transport),
            Command::ContinueModes => send_packet(transport, CONTINUE_MODES),
            Command::Continue => return Ok(Action::Resume),
            Command::Step => {
                self.step_ps = Some(frame.ps);
                frame.ps = (frame.ps & !PS_INTLEVEL_MASK) | STEP_INTLEVEL;
                self.hw.arm_single_step();
                return Ok(Action::Resume);
            }
            Command::Supported => send_packet(transport, SUPPORTED),
            Command::SetBreakpoint { addr, len } => {
                Self::check(self.hw.set_breakpoint(addr, len))?;
                send_packet(transport, REPLY_OK);
            }
            Command::ClearBreakpoint { addr } => {
                Self::check(self.hw.clear_breakpoint(addr))?;
                send_packet(transport, REPLY_OK);
            }
            Command::SetWatchpoint { kind, addr, len } => {
                let mask = watch_mask(len).ok_or(StubError::WatchpointSizeInvalid)?;
                debug!("Exec:  Watch {kind} 0x{addr:08X} mask 0x{mask:02X}");
                Self::check(self.hw.set_watchpoint(addr, mask, kind))?;
                send_packet(transport, REPLY_OK);
            }
            Command::ClearWatchpoint { addr, .. } => {
                Self::check(self.hw.clear_watchpoint(addr))?;
                send_packet(transport, REPLY_OK);
            }
        }
        Ok(Action::Stay)
    }

    // Writes only once the range has been checked and all of the data has
    // decoded, so a bad packet leaves memory untouched.
    fn write_memory(&mut self, addr: u32, len: u32, data: &[u8]) -> Result<(), StubError> {
        if !Memory::<B>::is_writable(addr) || !Memory::<B>::is_writable(addr.wrapping_add(len)) {
            debug!("Error: Write to 0x{addr:08X}, length {len} refused");
            return Err(StubError::InvalidMemoryRange);
        }

        let mut check = HexCursor::new(data);
        for _ in 0..len {
            check.value(Bits::Fixed(8))?;
        }

        let mut cursor = HexCursor::new(data);
        for offset in 0..len {
            let byte = cursor.value(Bits::Fixed(8))? as u8;
            self.mem.write_byte(addr.wrapping_add(offset), byte);
        }

        // The ISA requires two ISYNCs before modified code is fetched
        self.hw.sync_caches();
        self.hw.sync_caches();
        Ok(())
    }

    fn check(accepted: bool) -> Result<(), StubError> {
        if accepted {
            Ok(())
        } else {
            Err(StubError::HardwareRejected)
        }
    }
}

// Logs a payload as text, without trusting it to be UTF-8
struct Payload<'a>(&'a [u8]);

impl core::fmt::Debug for Payload<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for &byte in self.0 {
            write!(f, "{}", core::ascii::escape_default(byte))?;
        }
        Ok(())
    }
}
