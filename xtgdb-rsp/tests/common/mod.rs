#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};

use xtgdb_core::Bus;
use xtgdb_rsp::{ByteTransport, DebugHardware, SerialPort, Stub, Uart, WatchKind, Watchdog};

/// Keepalives tolerated while waiting for input that never comes.
const STARVED: usize = 10_000;

/// Builds `$payload#cc`, escaping as GDB does.
pub fn packet(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![b'$'];
    let mut sum = 0u8;
    for &byte in payload {
        if matches!(byte, b'#' | b'$' | b'}' | b'*') {
            out.push(b'}');
            out.push(byte ^ 0x20);
            sum = sum.wrapping_add(b'}').wrapping_add(byte ^ 0x20);
        } else {
            out.push(byte);
            sum = sum.wrapping_add(byte);
        }
    }
    out.extend(format!("#{sum:02x}").bytes());
    out
}

/// Concatenates packets for each of `payloads`.
pub fn packets(payloads: &[&str]) -> Vec<u8> {
    payloads.iter().flat_map(|p| packet(p.as_bytes())).collect()
}

/// What the stub sent: acknowledgements and unescaped packet payloads, in
/// order.  Panics on a bad checksum.
#[derive(Debug, PartialEq, Eq)]
pub enum Sent {
    Ack,
    Nak,
    Packet(String),
}

pub fn decode(tx: &[u8]) -> Vec<Sent> {
    let mut sent = Vec::new();
    let mut bytes = tx.iter().copied();
    while let Some(byte) = bytes.next() {
        match byte {
            b'+' => sent.push(Sent::Ack),
            b'-' => sent.push(Sent::Nak),
            b'$' => {
                let mut payload = Vec::new();
                let mut sum = 0u8;
                loop {
                    let byte = bytes.next().expect("packet truncated");
                    if byte == b'#' {
                        break;
                    }
                    sum = sum.wrapping_add(byte);
                    if byte == b'}' {
                        let raw = bytes.next().expect("escape truncated");
                        sum = sum.wrapping_add(raw);
                        payload.push(raw ^ 0x20);
                    } else {
                        payload.push(byte);
                    }
                }
                let trailer: String = [bytes.next().unwrap(), bytes.next().unwrap()]
                    .iter()
                    .map(|&b| b as char)
                    .collect();
                assert_eq!(trailer, format!("{sum:02x}"), "bad checksum sent");
                sent.push(Sent::Packet(String::from_utf8(payload).unwrap()));
            }
            other => panic!("unexpected byte {other:#04x} outside packet"),
        }
    }
    sent
}

/// Just the packet payloads from [`decode`].
pub fn replies(tx: &[u8]) -> Vec<String> {
    decode(tx)
        .into_iter()
        .filter_map(|s| match s {
            Sent::Packet(p) => Some(p),
            _ => None,
        })
        .collect()
}

/// In-memory byte pipe.  Receiving from an empty pipe panics.
#[derive(Debug, Default)]
pub struct Wire {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
}

impl Wire {
    pub fn with_input(input: &[u8]) -> Self {
        Self {
            rx: input.iter().copied().collect(),
            tx: Vec::new(),
        }
    }
}

impl ByteTransport for Wire {
    fn receive_byte(&mut self) -> u8 {
        self.rx.pop_front().expect("wire ran out of input")
    }

    fn send_byte(&mut self, byte: u8) {
        self.tx.push(byte);
    }
}

/// UART FIFOs.  `tx_busy_polls` makes the TX FIFO report full for that many
/// polls.  `later` arrives once the RX interrupt has been cleared, like GDB's
/// commands following a break.
#[derive(Debug, Default)]
pub struct FakePort {
    pub rx: VecDeque<u8>,
    pub later: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub rx_interrupt_clears: usize,
    pub tx_busy_polls: Cell<u32>,
}

impl FakePort {
    pub fn with_input(input: &[u8]) -> Self {
        Self {
            rx: input.iter().copied().collect(),
            ..Default::default()
        }
    }
}

impl SerialPort for FakePort {
    fn rx_fifo_count(&self) -> u32 {
        self.rx.len() as u32
    }

    fn tx_fifo_count(&self) -> u32 {
        let busy = self.tx_busy_polls.get();
        if busy > 0 {
            self.tx_busy_polls.set(busy - 1);
            126
        } else {
            0
        }
    }

    fn read_fifo(&mut self) -> u8 {
        self.rx.pop_front().expect("read from empty RX FIFO")
    }

    fn write_fifo(&mut self, byte: u8) {
        self.tx.push(byte);
    }

    fn clear_rx_interrupt(&mut self) {
        self.rx_interrupt_clears += 1;
        self.rx.append(&mut self.later);
    }
}

#[derive(Debug)]
pub struct FakeWatchdog {
    pub enabled: bool,
    pub disables: usize,
    pub enables: usize,
    pub keep_alives: usize,
}

impl Default for FakeWatchdog {
    fn default() -> Self {
        Self {
            enabled: true,
            disables: 0,
            enables: 0,
            keep_alives: 0,
        }
    }
}

impl Watchdog for FakeWatchdog {
    fn disable(&mut self) {
        self.enabled = false;
        self.disables += 1;
    }

    fn enable(&mut self) {
        self.enabled = true;
        self.enables += 1;
    }

    fn keep_alive(&mut self) {
        self.keep_alives += 1;
        assert!(self.keep_alives < STARVED, "stub starved of input");
    }
}

/// Records requests, accepting them unless `reject` is set.
#[derive(Debug, Default)]
pub struct FakeHardware {
    pub reject: bool,
    pub breakpoints: Vec<(u32, u32)>,
    pub watchpoints: Vec<(u32, u8, WatchKind)>,
    pub cleared_breakpoints: Vec<u32>,
    pub cleared_watchpoints: Vec<u32>,
    pub cache_syncs: usize,
    pub steps_armed: usize,
}

impl DebugHardware for FakeHardware {
    fn set_breakpoint(&mut self, addr: u32, len: u32) -> bool {
        self.breakpoints.push((addr, len));
        !self.reject
    }

    fn clear_breakpoint(&mut self, addr: u32) -> bool {
        self.cleared_breakpoints.push(addr);
        !self.reject
    }

    fn set_watchpoint(&mut self, addr: u32, mask: u8, kind: WatchKind) -> bool {
        self.watchpoints.push((addr, mask, kind));
        !self.reject
    }

    fn clear_watchpoint(&mut self, addr: u32) -> bool {
        self.cleared_watchpoints.push(addr);
        !self.reject
    }

    fn sync_caches(&mut self) {
        self.cache_syncs += 1;
    }

    fn arm_single_step(&mut self) {
        self.steps_armed += 1;
    }
}

/// Sparse word addressed memory.  Unwritten words read as zero.
#[derive(Debug, Default)]
pub struct FakeBus {
    pub words: BTreeMap<u32, u32>,
}

impl FakeBus {
    pub fn load(&mut self, addr: u32, bytes: &[u8]) {
        for (offset, &byte) in bytes.iter().enumerate() {
            let addr = addr + offset as u32;
            let shift = (addr & 3) * 8;
            let word = self.words.entry(addr & !3).or_insert(0);
            *word = (*word & !(0xFF << shift)) | ((byte as u32) << shift);
        }
    }
}

impl Bus for FakeBus {
    fn read_word(&self, addr: u32) -> u32 {
        assert_eq!(addr & 3, 0, "unaligned read at {addr:#x}");
        self.words.get(&addr).copied().unwrap_or(0)
    }

    fn write_word(&mut self, addr: u32, value: u32) {
        assert_eq!(addr & 3, 0, "unaligned write at {addr:#x}");
        self.words.insert(addr, value);
    }
}

pub type TestStub = Stub<FakePort, FakeWatchdog, FakeHardware, FakeBus>;

/// A stub which will receive `input` from GDB.
pub fn stub_with_input(input: &[u8]) -> TestStub {
    Stub::new(
        Uart::new(FakePort::with_input(input), FakeWatchdog::default()),
        FakeHardware::default(),
        FakeBus::default(),
    )
}

/// Everything the stub has sent so far, as packets and acks.
pub fn sent(stub: &TestStub) -> Vec<Sent> {
    decode(&stub.uart().port().tx)
}

/// Input for a stub which has been given more of it.
pub fn push_input(stub: &mut TestStub, input: &[u8]) {
    stub.uart_mut().port_mut().rx.extend(input.iter().copied());
}
