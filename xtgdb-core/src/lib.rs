// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb is a GDB stub for the ESP8266, running on the target itself.
//!
//! xtgdb-core - The Xtensa lx106 concepts used by the stub.
//!
//! Designed to be used in conjunction with the `xtgdb-rsp` library, which
//! implements the GDB remote serial protocol on top of the objects here.
//!
//! * [`frame::ExceptionFrame`] is the register snapshot written by the
//!   exception entry sequence, and [`frame::Reason`] decodes why the target
//!   stopped.
//! * [`regs`] maps the exception frame onto the register file GDB expects.
//! * [`mem::Memory`] provides byte granular, bounds checked access to the
//!   address space, over a word-only [`mem::Bus`].
//! * [`insn`] recognises the handful of instructions the stub has to step
//!   over itself.
//!
//! This library is `no_std` compatible and does not allocate.

#![no_std]

pub mod frame;
pub mod insn;
pub mod mem;
pub mod regs;

#[doc(inline)]
pub use crate::frame::{DebugCause, ExceptionCause, ExceptionFrame, Reason, Signal};
#[doc(inline)]
pub use crate::mem::{Bus, Memory};
