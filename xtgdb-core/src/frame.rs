// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! xtgdb-core - Exception frame and stop reasons

use core::fmt;
use core::mem::size_of;
use static_assertions::const_assert_eq;

/// Number of address registers held in [`ExceptionFrame::a`] (a2 to a15).
pub const FRAME_AR_COUNT: usize = 14;

/// Interrupt level debug exceptions are taken at (DEBUGLEVEL on the lx106).
pub const DEBUG_LEVEL: u32 = 2;

/// PS.INTLEVEL a single step runs at.  Running just below [`DEBUG_LEVEL`]
/// keeps pending interrupts (a task switch in particular) from swallowing
/// the step.
pub const STEP_INTLEVEL: u32 = DEBUG_LEVEL - 1;

/// Register snapshot taken when the target traps into the stub.
///
/// The layout is shared with the exception entry assembly, which saves the
/// interrupted context here before calling into the stub and restores it
/// (including any changes made by GDB) afterwards.  Do not reorder.
///
/// `a0` and `a1` are stored outside of the `a` array, which starts at a2.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionFrame {
    pub pc: u32,
    pub ps: u32,
    pub sar: u32,
    pub vpri: u32,
    pub a0: u32,
    /// a2 to a15
    pub a: [u32; FRAME_AR_COUNT],
    // The following are saved by the entry sequence - the HAL doesn't save
    // them on an exception.
    pub litbase: u32,
    pub sr176: u32,
    pub sr208: u32,
    pub a1: u32,
    /// Raw stop reason.  Use [`Self::reason()`] to interpret it.
    pub reason: u32,
}

// 24 words, as laid out by the entry assembly
const_assert_eq!(size_of::<ExceptionFrame>(), 24 * 4);

impl ExceptionFrame {
    /// Returns an all zero frame.  Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            pc: 0,
            ps: 0,
            sar: 0,
            vpri: 0,
            a0: 0,
            a: [0; FRAME_AR_COUNT],
            litbase: 0,
            sr176: 0,
            sr208: 0,
            a1: 0,
            reason: 0,
        }
    }

    /// Returns the decoded stop reason.
    pub fn reason(&self) -> Reason {
        Reason::from_raw(self.reason)
    }

    /// Replaces the stop reason.
    pub fn set_reason(&mut self, reason: Reason) {
        self.reason = reason.to_raw();
    }
}

/// Why the target stopped.
///
/// The hardware defined `reason` word is overloaded: with bit 7 set the
/// remaining bits are an exception cause, with bit 7 clear they are the
/// debug cause bitmap.  0xFF is reserved for a break requested by the
/// operator (Ctrl-C in GDB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// A debug exception - breakpoint, watchpoint, single step or BREAK
    /// instruction.
    Debug(DebugCause),

    /// A (non-debug) exception was raised by the program.
    Exception(ExceptionCause),

    /// The operator asked the running program to stop.
    BreakRequest,
}

impl Reason {
    const EXCEPTION_FLAG: u32 = 0x80;
    const BREAK_REQUEST: u32 = 0xFF;

    /// Decodes a raw `reason` word.
    pub const fn from_raw(raw: u32) -> Self {
        if raw == Self::BREAK_REQUEST {
            Reason::BreakRequest
        } else if raw & Self::EXCEPTION_FLAG != 0 {
            Reason::Exception(ExceptionCause::from_raw(raw))
        } else {
            Reason::Debug(DebugCause::from_raw(raw))
        }
    }

    /// Encodes this reason as a raw `reason` word.
    ///
    /// Note that [`ExceptionCause`] 0x7F encodes to the same value as
    /// [`Reason::BreakRequest`].
    pub const fn to_raw(self) -> u32 {
        match self {
            Reason::Debug(cause) => cause.bits() as u32,
            Reason::Exception(cause) => Self::EXCEPTION_FLAG | cause.code() as u32,
            Reason::BreakRequest => Self::BREAK_REQUEST,
        }
    }

    /// Returns the signal reported to GDB for this stop.
    ///
    /// Fine grained debug causes (watch, hwbreak, swbreak) are not reported -
    /// current Xtensa GDB versions don't ask for them - so every debug stop
    /// is a `SIGTRAP`.
    pub fn signal(&self) -> Signal {
        match self {
            Reason::BreakRequest => Signal::SIGINT,
            Reason::Exception(cause) => cause.signal(),
            Reason::Debug(_) => Signal::SIGTRAP,
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Debug(cause) => write!(f, "debug {cause}"),
            Reason::Exception(cause) => write!(f, "exception {cause}"),
            Reason::BreakRequest => write!(f, "break request"),
        }
    }
}

/// Xtensa DEBUGCAUSE bitmap.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DebugCause(u8);

impl DebugCause {
    const MASK: u32 = 0x7F;

    /// ICOUNT expired - a single step completed
    pub const ICOUNT: Self = Self(1 << 0);
    /// Instruction breakpoint register matched
    pub const IBREAK: Self = Self(1 << 1);
    /// Data breakpoint (watchpoint) register matched
    pub const DBREAK: Self = Self(1 << 2);
    /// BREAK instruction
    pub const BREAK: Self = Self(1 << 3);
    /// BREAK.N instruction
    pub const BREAKN: Self = Self(1 << 4);
    /// Debug interrupt
    pub const DEBUGINT: Self = Self(1 << 5);

    pub const fn from_raw(raw: u32) -> Self {
        Self((raw & Self::MASK) as u8)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl core::ops::BitOr for DebugCause {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for DebugCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Xtensa EXCCAUSE value, as stored in the low 7 bits of the reason word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionCause(u8);

impl ExceptionCause {
    const MASK: u32 = 0x7F;

    // Signal for each of the first 16 exception causes
    const SIGNALS: [u8; 16] = [4, 31, 11, 11, 2, 6, 8, 0, 6, 7, 0, 0, 7, 7, 7, 7];

    pub const ILLEGAL_INSTRUCTION: Self = Self(0);
    pub const SYSCALL: Self = Self(1);
    pub const INSTRUCTION_FETCH_ERROR: Self = Self(2);
    pub const LOAD_STORE_ERROR: Self = Self(3);
    pub const LEVEL1_INTERRUPT: Self = Self(4);
    pub const ALLOCA: Self = Self(5);
    pub const INTEGER_DIVIDE_BY_ZERO: Self = Self(6);
    pub const PRIVILEGED: Self = Self(8);
    pub const LOAD_STORE_ALIGNMENT: Self = Self(9);

    pub const fn from_raw(raw: u32) -> Self {
        Self((raw & Self::MASK) as u8)
    }

    pub const fn code(self) -> u8 {
        self.0
    }

    /// Returns the signal GDB is told about for this exception.  Causes
    /// beyond the table are reported as `SIGSEGV`.
    pub fn signal(&self) -> Signal {
        Self::SIGNALS
            .get(self.0 as usize)
            .map(|&sig| Signal(sig))
            .unwrap_or(Signal::SIGSEGV)
    }
}

impl fmt::Display for ExceptionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// GDB signal number, as sent in a stop reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal(pub u8);

impl Signal {
    pub const SIGINT: Self = Self(2);
    pub const SIGTRAP: Self = Self(5);
    pub const SIGSEGV: Self = Self(11);

    pub const fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
