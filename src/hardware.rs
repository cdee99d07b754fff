//! Fixed addresses of the NEO6502 memory map.
//!
//! The board runs a 65C02 with an Apple-1 style PIA for the console and a
//! memory-mapped VDU. Everything the firmware touches by address is named here
//! so the rest of the crate never carries raw literals.

/// Size of the flat address space.
pub const MEMORY_SIZE: usize = 0x1_0000;

/// NMI vector (low byte first).
pub const NMI_VECTOR: u16 = 0xFFFA;
/// RESET vector (low byte first).
pub const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRK vector (low byte first).
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Keyboard data latch. Zero means "no key waiting"; the program clears it
/// after reading.
pub const KBD: u16 = 0xD010;
/// Keyboard control register.
pub const KBDCR: u16 = 0xD011;
/// Terminal output register. Bit 7 set means a character is waiting.
pub const DSP: u16 = 0xD012;
/// Terminal control register.
pub const DSPCR: u16 = 0xD013;

/// Value of [`KBD`] while the latch is empty.
pub const KBD_EMPTY: u8 = 0x00;
/// Bit the Apple-1 monitor expects on every incoming character.
pub const KBD_STROBE: u8 = 0x80;
/// Bit 7 of [`DSP`]: set by the program when a character is waiting, cleared
/// by the terminal once it has been printed.
pub const DSP_STROBE: u8 = 0x80;

/// VDU register window dumped by the diagnostics command.
pub const VDU_REGS: u16 = 0xD020;
pub const VDU_REGS_LEN: usize = 18;

/// Sprite attribute table, 16 rows of 16 bytes.
pub const SPRITE_TABLE: u16 = 0xD100;
/// Tile map window, 16 rows of 16 bytes.
pub const TILE_TABLE: u16 = 0xD200;
pub const TABLE_ROWS: usize = 16;
pub const TABLE_COLS: usize = 16;

/// One of the three hardware interrupt vectors a cartridge may install.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vector {
    Nmi,
    Reset,
    Irq,
}

impl Vector {
    pub const ALL: [Vector; 3] = [Vector::Nmi, Vector::Reset, Vector::Irq];

    /// Address of the low byte of this vector.
    #[inline]
    pub const fn address(self) -> u16 {
        match self {
            Vector::Nmi => NMI_VECTOR,
            Vector::Reset => RESET_VECTOR,
            Vector::Irq => IRQ_VECTOR,
        }
    }

    /// Bit in the cartridge type mask that requests this vector.
    #[inline]
    pub const fn type_bit(self) -> u8 {
        match self {
            Vector::Nmi => 0x01,
            Vector::Reset => 0x02,
            Vector::Irq => 0x04,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Vector::Nmi => "NMI",
            Vector::Reset => "RESET",
            Vector::Irq => "IRQ",
        }
    }
}
