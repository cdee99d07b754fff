use log::{info, warn};

use crate::cartridge::{Cartridge, CartridgeError, LoadReport};
use crate::config::Preset;
use crate::cpu::{Cpu, IdleCpu};
use crate::devices::{
    CharDevice, Clock, Display, HeadlessDisplay, MuteSound, NullCharDevice, Sound, SystemClock,
};
use crate::memory::MemoryImage;
use crate::scheduler::{Scheduler, StepEvents, Timing};
use crate::serial::{BufferedSerial, SerialPort};

pub const DEFAULT_TEXT_COLOR: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeFlags {
    /// Periodic clock-rate reports on the console.
    pub logging: bool,
    pub sound: bool,
    pub trace: bool,
    /// Fold keyboard input to upper case with bit 7 set, as the Apple-1
    /// monitor expects.
    pub ucase: bool,
    /// Present frames automatically from the main loop.
    pub auto_update: bool,
}

impl Default for ModeFlags {
    fn default() -> Self {
        Self {
            logging: false,
            sound: true,
            trace: false,
            ucase: false,
            auto_update: true,
        }
    }
}

/// Mode flags and counters shared by the loop and everything it calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineState {
    pub flags: ModeFlags,
    pub text_color: u8,
    /// Ticks since the last clock-rate report.
    pub clock_count: u64,
}

/// The collaborators the firmware drives.
pub struct Board {
    pub cpu: Box<dyn Cpu>,
    pub display: Box<dyn Display>,
    pub sound: Box<dyn Sound>,
    pub chars: Box<dyn CharDevice>,
    pub serial: Box<dyn SerialPort>,
    pub clock: Box<dyn Clock>,
}

impl Default for Board {
    /// Headless board: idle CPU, no display or sound, in-memory console.
    fn default() -> Self {
        Self {
            cpu: Box::new(IdleCpu::new()),
            display: Box::new(HeadlessDisplay::default()),
            sound: Box::new(MuteSound),
            chars: Box::new(NullCharDevice),
            serial: Box::new(BufferedSerial::new()),
            clock: Box::new(SystemClock::new()),
        }
    }
}

/// Outcome of applying a preset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigureReport {
    pub loaded: Vec<LoadReport>,
    pub failed: Vec<(String, CartridgeError)>,
}

/// High-level facade that owns the memory image, the machine state, the
/// board and the scheduler.
pub struct Neo6502 {
    pub memory: MemoryImage,
    pub state: MachineState,
    pub board: Board,
    scheduler: Scheduler,
}

impl Neo6502 {
    pub fn new(board: Board) -> Self {
        Self::with_timing(board, Timing::default())
    }

    pub fn with_timing(board: Board, timing: Timing) -> Self {
        Self {
            memory: MemoryImage::new(),
            state: MachineState {
                text_color: DEFAULT_TEXT_COLOR,
                ..MachineState::default()
            },
            board,
            scheduler: Scheduler::new(timing),
        }
    }

    /// Bring the peripherals up and reset the CPU.
    pub fn init(&mut self) {
        self.board.sound.init();
        self.board.cpu.reset(&mut self.memory);
        self.board.display.init();
        self.board.display.set_text_color(self.state.text_color);

        self.state.clock_count = 0;
        let now = self.board.clock.millis();
        self.scheduler.restart_clock(now);
        info!("NEO6502 initialized");
    }

    pub fn add_rom(&mut self, cart: &Cartridge) -> Result<LoadReport, CartridgeError> {
        cart.install(&mut self.memory).inspect_err(|e| {
            warn!("*ERROR: {}: {e}", cart.name);
        })
    }

    pub fn set_ucase(&mut self, on: bool) {
        self.state.flags.ucase = on;
    }

    pub fn set_rom_protect(&mut self, on: bool) {
        self.memory.set_write_protect(on);
    }

    pub fn set_text_color(&mut self, color: u8) {
        self.state.text_color = color;
        self.board.display.set_text_color(color);
    }

    pub fn set_auto_update(&mut self, on: bool) {
        self.state.flags.auto_update = on;
    }

    pub fn set_logging(&mut self, on: bool) {
        self.state.flags.logging = on;
        self.state.clock_count = 0;
    }

    /// Apply a preset: flags and text color first, then each cartridge in
    /// order. A cartridge that fails to load is skipped and reported; the rest
    /// of the batch still loads. The CPU is reset afterwards so freshly
    /// installed vectors take effect.
    ///
    /// The preset's cartridges replace the ROM layout of any earlier preset.
    pub fn configure(&mut self, preset: &Preset, cartridges: &[Cartridge]) -> ConfigureReport {
        info!("Applying preset {}", preset.name);
        self.memory.clear_rom();
        self.set_ucase(preset.ucase);
        self.set_rom_protect(preset.write_protect);
        self.set_text_color(preset.text_color);
        self.set_auto_update(preset.auto_update);

        let mut report = ConfigureReport::default();
        for cart in cartridges {
            match self.add_rom(cart) {
                Ok(loaded) => report.loaded.push(loaded),
                Err(e) => report.failed.push((cart.name.clone(), e)),
            }
        }

        self.board.cpu.reset(&mut self.memory);
        report
    }

    pub fn step(&mut self) -> StepEvents {
        self.scheduler
            .step(&mut self.memory, &mut self.state, &mut self.board)
    }

    pub fn run_for(&mut self, iterations: u64) {
        self.scheduler
            .run_for(iterations, &mut self.memory, &mut self.state, &mut self.board);
    }

    pub fn run(&mut self) -> ! {
        self.scheduler
            .run(&mut self.memory, &mut self.state, &mut self.board)
    }

    pub fn ticks(&self) -> u64 {
        self.scheduler.ticks()
    }

    pub fn timing(&self) -> Timing {
        self.scheduler.timing()
    }
}

impl Default for Neo6502 {
    fn default() -> Self {
        Self::new(Board::default())
    }
}
