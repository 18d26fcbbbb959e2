// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-rsp - The debug session
//!
//! [`Stub`] brings the transport, command execution and console together,
//! and provides the entry points the platform calls when the target stops:
//!
//! * [`Stub::handle_debug_exception()`] - breakpoint, watchpoint, single
//!   step, or BREAK instruction.
//! * [`Stub::handle_user_exception()`] - the program faulted.
//! * [`Stub::handle_break_request()`] - GDB asked the running program to
//!   stop.
//!
//! Each reports the stop to GDB, then serves commands until GDB resumes the
//! target.  The watchdog is disabled throughout.

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::StubError;
use crate::codec::{CommandBuffer, Received, receive_packet};
use crate::console::Console;
use crate::context::{ContextBridge, TrapContext};
use crate::dispatch::{Action, Session};
use crate::target::DebugHardware;
use crate::transport::{ByteTransport, SerialPort, Uart, Watchdog};
use xtgdb_core::insn;
use xtgdb_core::{Bus, DebugCause, ExceptionCause, ExceptionFrame, Reason};

/// A GDB debug session on the target.
pub struct Stub<P, W, H, B>
where
    P: SerialPort,
    W: Watchdog,
    H: DebugHardware,
    B: Bus,
{
    uart: Uart<P, W>,
    session: Session<H, B>,
    buf: CommandBuffer,
    console: Console,
}

impl<P, W, H, B> Stub<P, W, H, B>
where
    P: SerialPort,
    W: Watchdog,
    H: DebugHardware,
    B: Bus,
{
    pub fn new(uart: Uart<P, W>, hw: H, bus: B) -> Self {
        Self {
            uart,
            session: Session::new(hw, bus),
            buf: CommandBuffer::new(),
            console: Console::new(),
        }
    }

    pub fn uart(&self) -> &Uart<P, W> {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut Uart<P, W> {
        &mut self.uart
    }

    pub fn session(&self) -> &Session<H, B> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<H, B> {
        &mut self.session
    }

    /// Handles a debug exception.
    ///
    /// After GDB resumes the target, steps over whatever caused the stop
    /// where re-executing it would just stop again:
    /// - the load or store that hit a watchpoint is emulated
    /// - a BREAK or BREAK.N is skipped, unless GDB has already replaced it
    ///   with the original instruction
    pub fn handle_debug_exception(&mut self, frame: &mut ExceptionFrame) {
        self.session.complete_step(frame);
        self.stop(frame, &mut TrapContext);

        let Reason::Debug(cause) = frame.reason() else {
            return;
        };
        let mem = self.session.memory_mut();
        if cause.contains(DebugCause::DBREAK) {
            if insn::emulate(frame, mem).is_none() {
                warn!("Note:  Watchpoint at 0x{:08X} not stepped over", frame.pc);
            }
        } else if cause.contains(DebugCause::BREAK) {
            insn::skip_break(frame, mem);
        } else if cause.contains(DebugCause::BREAKN) {
            insn::skip_break_n(frame, mem);
        }
    }

    /// Handles an exception raised by the program.  The frame's reason holds
    /// the exception cause.
    pub fn handle_user_exception(&mut self, frame: &mut ExceptionFrame) {
        frame.set_reason(Reason::Exception(ExceptionCause::from_raw(frame.reason)));
        self.stop(frame, &mut TrapContext);
    }

    /// Handles the UART interrupt while the target is running.
    ///
    /// Drains the RX FIFO.  Only if GDB sent a break is `context` called, to
    /// get at the interrupted context, which is then captured into `frame`
    /// for the stop and restored from it afterwards.
    ///
    /// Returns the context after the stop, or `None` if there was no break.
    pub fn handle_break_request<C, F>(
        &mut self,
        frame: &mut ExceptionFrame,
        context: F,
    ) -> Option<C>
    where
        C: ContextBridge,
        F: FnOnce() -> C,
    {
        if !self.uart.take_break_request() {
            return None;
        }

        let mut ctx = context();
        frame.set_reason(Reason::BreakRequest);
        self.stop(frame, &mut ctx);
        Some(ctx)
    }

    /// Reads one command from GDB and executes it.
    pub fn read_command(&mut self, frame: &mut ExceptionFrame) -> Result<Action, StubError> {
        read_command(&mut self.uart, &mut self.session, &mut self.buf, frame)
    }

    /// Sends a byte of program output to GDB's console.
    pub fn console_write(&mut self, c: u8) {
        self.console.write_char(c, &mut self.uart);
    }

    // A stop, from capture to restore, with the watchdog off throughout
    fn stop<C: ContextBridge>(&mut self, frame: &mut ExceptionFrame, ctx: &mut C) {
        let Self {
            uart,
            session,
            buf,
            console,
        } = self;
        let mut link = uart.suspend_watchdog();
        console.flush(&mut *link);

        ctx.capture(frame);
        serve(&mut *link, session, buf, frame);
        ctx.restore(frame);
    }
}

// Reports the stop then serves commands until one resumes the target
fn serve<T, H, B>(
    transport: &mut T,
    session: &mut Session<H, B>,
    buf: &mut CommandBuffer,
    frame: &mut ExceptionFrame,
) where
    T: ByteTransport + ?Sized,
    H: DebugHardware,
    B: Bus,
{
    session.send_stop_reason(frame, transport);
    // Errors have already been replied to, if needed
    while read_command(transport, session, buf, frame) != Ok(Action::Resume) {}
    debug!("OK:    Resuming at 0x{:08X}", frame.pc);
}

fn read_command<T, H, B>(
    transport: &mut T,
    session: &mut Session<H, B>,
    buf: &mut CommandBuffer,
    frame: &mut ExceptionFrame,
) -> Result<Action, StubError>
where
    T: ByteTransport + ?Sized,
    H: DebugHardware,
    B: Bus,
{
    match receive_packet(transport, buf)? {
        Received::Packet => session.dispatch(buf, frame, transport),
        Received::Unsolicited(byte) => {
            trace!("Note:  Ignoring 0x{byte:02X}");
            Ok(Action::Stay)
        }
    }
}
