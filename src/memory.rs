use std::ops::Range;

use crate::hardware::MEMORY_SIZE;

/// The flat 64 KiB address space shared by the CPU, the loader and the
/// peripheral scanners.
///
/// Raw [`write`](Self::write) always lands. [`bus_write`](Self::bus_write) is
/// the path the CPU takes and honors the write-protect flag for regions that a
/// cartridge was loaded into.
#[derive(Clone)]
pub struct MemoryImage {
    bytes: Box<[u8]>,
    rom: Vec<Range<usize>>,
    write_protect: bool,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self {
            bytes: vec![0u8; MEMORY_SIZE].into_boxed_slice(),
            rom: Vec::new(),
            write_protect: false,
        }
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    #[inline]
    pub fn write(&mut self, addr: u16, val: u8) {
        self.bytes[addr as usize] = val;
    }

    /// CPU-side write. Returns `false` when the write was dropped because the
    /// address is ROM and write-protect is on.
    pub fn bus_write(&mut self, addr: u16, val: u8) -> bool {
        if self.write_protect && self.is_rom(addr) {
            return false;
        }
        self.write(addr, val);
        true
    }

    /// Little-endian word read; the high byte wraps to 0x0000 at the top.
    pub fn read_u16(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    pub fn write_u16(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write(addr, lo);
        self.write(addr.wrapping_add(1), hi);
    }

    /// Borrow `len` bytes starting at `addr`. Panics if the window runs past
    /// the end of the address space.
    pub fn slice(&self, addr: u16, len: usize) -> &[u8] {
        let a = addr as usize;
        &self.bytes[a..a + len]
    }

    pub fn slice_mut(&mut self, addr: u16, len: usize) -> &mut [u8] {
        let a = addr as usize;
        &mut self.bytes[a..a + len]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Record `len` bytes at `addr` as ROM for write-protect purposes.
    ///
    /// Overlapping and touching regions are merged, so the list stays sorted
    /// and disjoint however often the same range is loaded.
    pub fn mark_rom(&mut self, addr: u16, len: usize) {
        if len == 0 {
            return;
        }
        let start = addr as usize;
        let mut merged = start..(start + len).min(MEMORY_SIZE);
        self.rom.retain(|r| {
            if r.start <= merged.end && merged.start <= r.end {
                merged.start = merged.start.min(r.start);
                merged.end = merged.end.max(r.end);
                false
            } else {
                true
            }
        });
        self.rom.push(merged);
        self.rom.sort_unstable_by_key(|r| r.start);
    }

    /// Forget every ROM region. The bytes themselves are left in place.
    pub fn clear_rom(&mut self) {
        self.rom.clear();
    }

    pub fn is_rom(&self, addr: u16) -> bool {
        let a = addr as usize;
        self.rom.iter().any(|r| r.contains(&a))
    }

    pub fn rom_regions(&self) -> &[Range<usize>] {
        &self.rom
    }

    pub fn set_write_protect(&mut self, on: bool) {
        self.write_protect = on;
    }

    pub fn write_protect(&self) -> bool {
        self.write_protect
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImage")
            .field("rom", &self.rom)
            .field("write_protect", &self.write_protect)
            .finish_non_exhaustive()
    }
}
