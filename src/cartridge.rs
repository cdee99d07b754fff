//! NEO6502 ROM package format and loader.
//!
//! A package is a 16 byte header followed by the payload:
//!
//! ```text
//! 0x00  SOH            fixed 0x5A
//! 0x01  VERSION_MINOR
//! 0x02  VERSION_MAJOR  must be 0x01
//! 0x03  START (lo, hi) load address
//! 0x05  SIZE  (lo, hi) payload length
//! 0x07  TYPE           bit0 NMI, bit1 RESET, bit2 IRQ vector present
//! 0x08  NMI   (lo, hi)
//! 0x0A  RESET (lo, hi)
//! 0x0C  IRQ   (lo, hi)
//! 0x0E  CSUM           sum of bytes 0x03..=0x0D, mod 256
//! 0x0F  EOH            fixed 0xA5
//! ```

use std::{fmt, fs, io, path::Path};

use log::{debug, info};
use thiserror::Error;

use crate::hardware::{MEMORY_SIZE, Vector};
use crate::memory::MemoryImage;

pub const HEADER_LEN: usize = 16;
pub const HEADER_SOH: u8 = 0x5A;
pub const HEADER_EOH: u8 = 0xA5;
pub const SUPPORTED_VERSION_MAJOR: u8 = 0x01;
pub const DEFAULT_VERSION_MINOR: u8 = 0x01;

const SOH: usize = 0x00;
const VERSION_MINOR: usize = 0x01;
const VERSION_MAJOR: usize = 0x02;
const START: usize = 0x03;
const SIZE: usize = 0x05;
const TYPE: usize = 0x07;
const NMI: usize = 0x08;
const RESET: usize = 0x0A;
const IRQ: usize = 0x0C;
const CSUM: usize = 0x0E;
const EOH: usize = 0x0F;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    #[error("invalid ROM header")]
    InvalidHeader,

    #[error("unsupported ROM version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("invalid checksum (header {stored:#04x}, computed {computed:#04x})")]
    ChecksumMismatch { stored: u8, computed: u8 },

    #[error("ROM image truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("payload at {start:#06x} with size {size:#06x} runs past the address space")]
    OutOfRange { start: u16, size: u16 },
}

/// Decoded package header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RomHeader {
    pub version_minor: u8,
    pub version_major: u8,
    pub start_address: u16,
    pub size: u16,
    pub rom_type: u8,
    pub nmi: u16,
    pub reset: u16,
    pub irq: u16,
    pub checksum: u8,
}

impl RomHeader {
    /// A current-version header with no vectors.
    pub fn new(start_address: u16, size: u16) -> Self {
        Self {
            version_minor: DEFAULT_VERSION_MINOR,
            version_major: SUPPORTED_VERSION_MAJOR,
            start_address,
            size,
            rom_type: 0,
            nmi: 0,
            reset: 0,
            irq: 0,
            checksum: 0,
        }
    }

    pub fn with_vector(mut self, vector: Vector, target: u16) -> Self {
        self.rom_type |= vector.type_bit();
        match vector {
            Vector::Nmi => self.nmi = target,
            Vector::Reset => self.reset = target,
            Vector::Irq => self.irq = target,
        }
        self
    }

    /// Field decode only; no magic, version or checksum checks.
    pub fn decode(raw: &[u8; HEADER_LEN]) -> Self {
        let word = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);
        Self {
            version_minor: raw[VERSION_MINOR],
            version_major: raw[VERSION_MAJOR],
            start_address: word(START),
            size: word(SIZE),
            rom_type: raw[TYPE],
            nmi: word(NMI),
            reset: word(RESET),
            irq: word(IRQ),
            checksum: raw[CSUM],
        }
    }

    /// Decode and validate the header at the front of `data`.
    ///
    /// Checks run in a fixed order and the first failure is reported: length,
    /// magic bytes, major version, checksum.
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        let raw: &[u8; HEADER_LEN] = data
            .get(..HEADER_LEN)
            .and_then(|s| s.try_into().ok())
            .ok_or(CartridgeError::Truncated {
                needed: HEADER_LEN,
                available: data.len(),
            })?;

        if raw[SOH] != HEADER_SOH || raw[EOH] != HEADER_EOH {
            return Err(CartridgeError::InvalidHeader);
        }

        if raw[VERSION_MAJOR] != SUPPORTED_VERSION_MAJOR {
            return Err(CartridgeError::UnsupportedVersion {
                major: raw[VERSION_MAJOR],
                minor: raw[VERSION_MINOR],
            });
        }

        let computed = Self::checksum_of(raw);
        if computed != raw[CSUM] {
            return Err(CartridgeError::ChecksumMismatch {
                stored: raw[CSUM],
                computed,
            });
        }

        Ok(Self::decode(raw))
    }

    /// Modulo-256 sum of the eleven bytes from START through IRQ high.
    pub fn checksum_of(raw: &[u8; HEADER_LEN]) -> u8 {
        raw[START..CSUM]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_add(b))
    }

    /// Encode with magic bytes and a freshly computed checksum. The stored
    /// `checksum` field is ignored.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut raw = [0u8; HEADER_LEN];
        raw[SOH] = HEADER_SOH;
        raw[VERSION_MINOR] = self.version_minor;
        raw[VERSION_MAJOR] = self.version_major;
        raw[START..START + 2].copy_from_slice(&self.start_address.to_le_bytes());
        raw[SIZE..SIZE + 2].copy_from_slice(&self.size.to_le_bytes());
        raw[TYPE] = self.rom_type;
        raw[NMI..NMI + 2].copy_from_slice(&self.nmi.to_le_bytes());
        raw[RESET..RESET + 2].copy_from_slice(&self.reset.to_le_bytes());
        raw[IRQ..IRQ + 2].copy_from_slice(&self.irq.to_le_bytes());
        raw[CSUM] = Self::checksum_of(&raw);
        raw[EOH] = HEADER_EOH;
        raw
    }

    /// Vector value if the type mask asks for it to be installed.
    pub fn vector(&self, vector: Vector) -> Option<u16> {
        if self.rom_type & vector.type_bit() == 0 {
            return None;
        }
        Some(match vector {
            Vector::Nmi => self.nmi,
            Vector::Reset => self.reset,
            Vector::Irq => self.irq,
        })
    }

    /// One past the last byte the payload occupies.
    pub fn end(&self) -> usize {
        self.start_address as usize + self.size as usize
    }
}

/// What a successful load did to memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub name: String,
    pub start: u16,
    pub size: u16,
    pub vectors: Vec<(Vector, u16)>,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>16}\t{:04X}: [{:04X}]", self.name, self.start, self.size)
    }
}

/// A named ROM package, header included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    pub name: String,
    pub image: Vec<u8>,
}

impl Cartridge {
    pub fn new(name: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            image,
        }
    }

    /// Assemble a package from a header and payload.
    pub fn build(name: impl Into<String>, header: &RomHeader, payload: &[u8]) -> Self {
        let mut image = Vec::with_capacity(HEADER_LEN + payload.len());
        image.extend_from_slice(&header.to_bytes());
        image.extend_from_slice(payload);
        Self::new(name, image)
    }

    /// Read a package from disk. The file stem becomes the cartridge name.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let image = fs::read(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Read {} bytes of ROM package {}", image.len(), path.display());
        Ok(Self::new(name, image))
    }

    pub fn header(&self) -> Result<RomHeader, CartridgeError> {
        RomHeader::parse(&self.image)
    }

    pub fn payload(&self) -> &[u8] {
        self.image.get(HEADER_LEN..).unwrap_or_default()
    }

    pub fn install(&self, memory: &mut MemoryImage) -> Result<LoadReport, CartridgeError> {
        load(&self.name, &self.image, memory)
    }
}

/// Validate `image` and install it into `memory`.
///
/// Nothing in `memory` changes unless every check passes. On success the
/// requested vectors are written first, then `size` payload bytes are copied
/// to the start address and the range is recorded as ROM.
pub fn load(
    name: &str,
    image: &[u8],
    memory: &mut MemoryImage,
) -> Result<LoadReport, CartridgeError> {
    let header = RomHeader::parse(image)?;

    if header.end() > MEMORY_SIZE {
        return Err(CartridgeError::OutOfRange {
            start: header.start_address,
            size: header.size,
        });
    }

    let needed = HEADER_LEN + header.size as usize;
    let payload = image
        .get(HEADER_LEN..needed)
        .ok_or(CartridgeError::Truncated {
            needed,
            available: image.len(),
        })?;

    let mut vectors = Vec::new();
    for vector in Vector::ALL {
        if let Some(target) = header.vector(vector) {
            memory.write_u16(vector.address(), target);
            debug!("{}:\t0x{target:04x}", vector.label());
            vectors.push((vector, target));
        }
    }

    memory
        .slice_mut(header.start_address, payload.len())
        .copy_from_slice(payload);
    memory.mark_rom(header.start_address, payload.len());

    let report = LoadReport {
        name: name.to_string(),
        start: header.start_address,
        size: header.size,
        vectors,
    };
    info!("{report}");
    Ok(report)
}
