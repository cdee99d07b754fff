use std::fmt::Write;

use crate::hardware::{SPRITE_TABLE, TABLE_COLS, TABLE_ROWS, TILE_TABLE, VDU_REGS, VDU_REGS_LEN};
use crate::memory::MemoryImage;

/// Hex dump of the VDU registers and the sprite and tile tables, in the
/// layout the console prints for ^D.
pub fn memory_dump(memory: &MemoryImage) -> String {
    let mut out = String::from("VDU: ");
    push_row(&mut out, memory.slice(VDU_REGS, VDU_REGS_LEN));

    out.push_str("\nSPRITE:\n");
    push_table(&mut out, memory, SPRITE_TABLE);
    out.push('\n');

    out.push_str("\nTILE:\n");
    push_table(&mut out, memory, TILE_TABLE);
    out.push('\n');
    out
}

fn push_table(out: &mut String, memory: &MemoryImage, base: u16) {
    for row in memory.slice(base, TABLE_ROWS * TABLE_COLS).chunks(TABLE_COLS) {
        push_row(out, row);
        out.push('\n');
    }
}

fn push_row(out: &mut String, bytes: &[u8]) {
    for b in bytes {
        let _ = write!(out, "{b:02X} ");
    }
}
