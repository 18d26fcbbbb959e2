use std::cell::Cell;
use std::collections::BTreeMap;

use xtgdb_core::Bus;

/// Sparse word addressed memory.  Unwritten words read as zero.
#[derive(Debug, Default)]
pub struct FakeBus {
    pub words: BTreeMap<u32, u32>,
    pub reads: Cell<usize>,
}

impl FakeBus {
    pub fn with_bytes(addr: u32, bytes: &[u8]) -> Self {
        let mut bus = Self::default();
        bus.load(addr, bytes);
        bus
    }

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
        self.reads.set(self.reads.get() + 1);
        self.words.get(&addr).copied().unwrap_or(0)
    }

    fn write_word(&mut self, addr: u32, value: u32) {
        assert_eq!(addr & 3, 0, "unaligned write at {addr:#x}");
        self.words.insert(addr, value);
    }
}
