//! Peripheral collaborators serviced by the scheduler, and the headless
//! implementations the binary and tests use.

use std::time::Instant;

use log::trace;

use crate::hardware::{DSP, DSP_STROBE};
use crate::memory::MemoryImage;
use crate::serial::SerialPort;

pub trait Display {
    fn init(&mut self);

    fn reset(&mut self);

    /// Pick up VDU register writes made by the program.
    fn scan(&mut self, memory: &mut MemoryImage);

    /// Present the back buffer.
    fn swap(&mut self);

    fn set_text_color(&mut self, color: u8);
}

pub trait Sound {
    fn init(&mut self);

    fn scan(&mut self, memory: &mut MemoryImage, enabled: bool);
}

/// Character output device polled alongside the console.
pub trait CharDevice {
    fn scan(&mut self, memory: &mut MemoryImage, console: &mut dyn SerialPort);
}

/// Monotonic millisecond time source.
pub trait Clock {
    fn millis(&self) -> u64;
}

/// Display with no output surface; it only keeps counters.
#[derive(Debug, Default, Clone)]
pub struct HeadlessDisplay {
    pub frames: u64,
    pub resets: u32,
    pub text_color: u8,
}

impl Display for HeadlessDisplay {
    fn init(&mut self) {
        self.frames = 0;
    }

    fn reset(&mut self) {
        self.resets += 1;
    }

    fn scan(&mut self, _memory: &mut MemoryImage) {}

    fn swap(&mut self) {
        self.frames += 1;
        trace!("frame {}", self.frames);
    }

    fn set_text_color(&mut self, color: u8) {
        self.text_color = color;
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MuteSound;

impl Sound for MuteSound {
    fn init(&mut self) {}

    fn scan(&mut self, _memory: &mut MemoryImage, _enabled: bool) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullCharDevice;

impl CharDevice for NullCharDevice {
    fn scan(&mut self, _memory: &mut MemoryImage, _console: &mut dyn SerialPort) {}
}

/// Apple-1 style terminal on the display register.
///
/// The program stores a character with bit 7 set into [`DSP`]; the terminal
/// prints it and clears bit 7 to signal it is ready for the next one.
#[derive(Debug, Default, Clone, Copy)]
pub struct Apple1Terminal;

impl CharDevice for Apple1Terminal {
    fn scan(&mut self, memory: &mut MemoryImage, console: &mut dyn SerialPort) {
        let dsp = memory.read(DSP);
        if dsp & DSP_STROBE == 0 {
            return;
        }
        let ch = dsp & !DSP_STROBE;
        memory.write(DSP, ch);
        match ch {
            b'\r' => console.write_str("\n"),
            0x20..=0x7E => {
                let mut buf = [0u8; 4];
                console.write_str((ch as char).encode_utf8(&mut buf));
            }
            _ => {}
        }
    }
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}
