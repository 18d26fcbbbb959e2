// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb - Entry points from the exception vectors and the RTOS
//!
//! The debug and user exception entry assembly saves the trapping context to
//! `gdbstub_savedRegs`, switches to `exceptionStack`, and calls the matching
//! `gdbstub_handle_*` function.  On return it restores the context from
//! `gdbstub_savedRegs`, so changes made by GDB take effect.
//!
//! The UART interrupt handler and console hook are called by the RTOS as
//! ordinary functions.

use core::cell::RefCell;
#[cfg(feature = "console")]
use core::ffi::c_char;

use critical_section::Mutex;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};

use crate::arch::{Esp8266Debug, RawBus};
use crate::uart::GdbUart;
use crate::wdt::RomWatchdog;
use xtgdb_core::ExceptionFrame;
#[cfg(feature = "break-on-ctrl-c")]
use xtgdb_rsp::context::{ISR_FRAME_WORDS, InterruptContext, isr_frame_address};
use xtgdb_rsp::{Stub, Uart};

/// The stub, specialised for the ESP8266.
pub type Esp8266Stub = Stub<GdbUart, RomWatchdog, Esp8266Debug, RawBus>;

const EXCEPTION_STACK_WORDS: usize = 256;

// Written and read by the entry assembly.  Not touched from Rust outside of
// the handlers below, which run with the program stopped.
#[unsafe(export_name = "gdbstub_savedRegs")]
static mut SAVED_FRAME: ExceptionFrame = ExceptionFrame::new();

#[unsafe(export_name = "exceptionStack")]
static mut EXCEPTION_STACK: [u32; EXCEPTION_STACK_WORDS] = [0; EXCEPTION_STACK_WORDS];

static STUB: Mutex<RefCell<Option<Esp8266Stub>>> = Mutex::new(RefCell::new(None));

unsafe extern "C" {
    // Provided by the entry assembly
    fn gdbstub_debug_exception_entry();

    // Provided by the RTOS
    static mut debug_exception_handler: Option<unsafe extern "C" fn()>;
    #[cfg(feature = "break-on-ctrl-c")]
    static mut debug_saved_ctx: [u32; 2];
    #[cfg(feature = "break-on-ctrl-c")]
    fn _xt_isr_attach(inum: u32, handler: extern "C" fn());
    #[cfg(feature = "console")]
    fn sdk_os_install_putc1(putc: extern "C" fn(c: c_char));
}

/// Stores the stub.  Returns false if there already was one.
pub(crate) fn install(stub: Esp8266Stub) -> bool {
    critical_section::with(|cs| {
        let mut slot = STUB.borrow_ref_mut(cs);
        if slot.is_some() {
            return false;
        }
        *slot = Some(stub);
        true
    })
}

pub(crate) fn new_stub() -> Esp8266Stub {
    Stub::new(
        Uart::new(GdbUart::new(), RomWatchdog),
        Esp8266Debug,
        RawBus,
    )
}

/// Points the RTOS's debug exception vector at the entry assembly.
pub(crate) fn install_exception_handler() {
    // SAFETY: Single word store to the RTOS's handler pointer
    unsafe {
        (&raw mut debug_exception_handler).write(Some(gdbstub_debug_exception_entry));
    }
}

#[cfg(feature = "console")]
pub(crate) fn install_console() {
    // SAFETY: Registers a plain function with the SDK
    unsafe { sdk_os_install_putc1(console_putc) };
}

#[cfg(feature = "break-on-ctrl-c")]
pub(crate) fn install_break_interrupt() {
    with_stub(|stub, _| stub.uart_mut().port_mut().enable_rx_interrupt());
    // SAFETY: Registers a plain function with the RTOS
    unsafe { _xt_isr_attach(crate::config::UART_INUM, gdbstub_handle_uart_int) };
    crate::arch::enable_interrupt(crate::config::UART_INUM);
}

// Runs `f` with the stub and the saved frame.  Does nothing if the stub isn't
// installed, or is already in use further up the stack (say a breakpoint in
// code the console hook calls).
fn with_stub<R>(f: impl FnOnce(&mut Esp8266Stub, &mut ExceptionFrame) -> R) -> Option<R> {
    critical_section::with(|cs| {
        let mut slot = STUB.borrow(cs).try_borrow_mut().ok()?;
        let stub = slot.as_mut()?;
        // SAFETY: The entry assembly only touches the frame before and after
        // the handlers, and the borrow above stops the handlers nesting
        let frame = unsafe { &mut *(&raw mut SAVED_FRAME) };
        Some(f(stub, frame))
    })
}

/// Called by the entry assembly on a debug exception.
#[unsafe(no_mangle)]
pub extern "C" fn gdbstub_handle_debug_exception() {
    with_stub(|stub, frame| stub.handle_debug_exception(frame));
}

/// Called by the entry assembly on a user exception.
#[unsafe(no_mangle)]
pub extern "C" fn gdbstub_handle_user_exception() {
    with_stub(|stub, frame| stub.handle_user_exception(frame));
}

/// UART interrupt handler.  Stops the program if GDB sent a break.
#[cfg(feature = "break-on-ctrl-c")]
#[unsafe(no_mangle)]
pub extern "C" fn gdbstub_handle_uart_int() {
    with_stub(|stub, frame| {
        // SAFETY: Only called once a break has been seen, so within this
        // interrupt, after the RTOS's entry code has saved the context
        let ctx = stub.handle_break_request(frame, || unsafe { interrupted_context() });
        if let Some(ctx) = ctx {
            crate::arch::write_epc1(ctx.epc());
        }
    });
}

// The context the RTOS's level 1 interrupt entry saved.
//
// Safety: must only be called from the UART interrupt, as the save area is
// only valid (and a1 only points at it) for the interrupt's duration.
#[cfg(feature = "break-on-ctrl-c")]
unsafe fn interrupted_context() -> InterruptContext<'static> {
    // SAFETY: The RTOS's two word save area, not touched again until this
    // interrupt returns
    let saved = unsafe { &mut *(&raw mut debug_saved_ctx) };
    let isr_frame = isr_frame_address(saved[1]) as *mut [u32; ISR_FRAME_WORDS];
    // SAFETY: The entry code's register save area sits just below the
    // interrupted a1
    let isr_frame = unsafe { &mut *isr_frame };
    InterruptContext::new(crate::arch::read_epc1(), saved, isr_frame)
}

#[cfg(feature = "console")]
extern "C" fn console_putc(c: c_char) {
    with_stub(|stub, _| stub.console_write(c as u8));
}
