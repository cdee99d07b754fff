#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use neo6502::cpu::Cpu;
use neo6502::devices::{CharDevice, Clock, Display, Sound};
use neo6502::machine::{Board, Neo6502};
use neo6502::memory::MemoryImage;
use neo6502::scheduler::Timing;
use neo6502::serial::{BufferedSerial, SerialPort};

pub type EventLog = Rc<RefCell<Vec<&'static str>>>;

/// Clock that only moves when the test says so.
pub struct ManualClock(pub Rc<Cell<u64>>);

impl Clock for ManualClock {
    fn millis(&self) -> u64 {
        self.0.get()
    }
}

pub struct RecordingCpu {
    log: EventLog,
    ticks: Rc<Cell<u64>>,
}

impl Cpu for RecordingCpu {
    fn reset(&mut self, _memory: &mut MemoryImage) {
        self.log.borrow_mut().push("cpu.reset");
    }

    fn tick(&mut self, _memory: &mut MemoryImage) {
        self.ticks.set(self.ticks.get() + 1);
        self.log.borrow_mut().push("cpu.tick");
    }
}

pub struct RecordingDisplay {
    log: EventLog,
    color: Rc<Cell<u8>>,
}

impl Display for RecordingDisplay {
    fn init(&mut self) {
        self.log.borrow_mut().push("display.init");
    }

    fn reset(&mut self) {
        self.log.borrow_mut().push("display.reset");
    }

    fn scan(&mut self, _memory: &mut MemoryImage) {
        self.log.borrow_mut().push("display.scan");
    }

    fn swap(&mut self) {
        self.log.borrow_mut().push("display.swap");
    }

    fn set_text_color(&mut self, color: u8) {
        self.color.set(color);
    }
}

pub struct RecordingSound {
    log: EventLog,
}

impl Sound for RecordingSound {
    fn init(&mut self) {
        self.log.borrow_mut().push("sound.init");
    }

    fn scan(&mut self, _memory: &mut MemoryImage, enabled: bool) {
        self.log
            .borrow_mut()
            .push(if enabled { "sound.scan" } else { "sound.scan.muted" });
    }
}

pub struct RecordingChars {
    log: EventLog,
}

impl CharDevice for RecordingChars {
    fn scan(&mut self, _memory: &mut MemoryImage, _console: &mut dyn SerialPort) {
        self.log.borrow_mut().push("chars.scan");
    }
}

/// A machine wired to recording devices, plus handles to observe them.
pub struct Rig {
    pub neo: Neo6502,
    pub log: EventLog,
    pub console: BufferedSerial,
    pub now: Rc<Cell<u64>>,
    pub cpu_ticks: Rc<Cell<u64>>,
    pub text_color: Rc<Cell<u8>>,
}

impl Rig {
    pub fn new(timing: Timing) -> Self {
        let log = EventLog::default();
        let console = BufferedSerial::new();
        let now = Rc::new(Cell::new(0));
        let cpu_ticks = Rc::new(Cell::new(0));
        let text_color = Rc::new(Cell::new(0));

        let board = Board {
            cpu: Box::new(RecordingCpu {
                log: log.clone(),
                ticks: cpu_ticks.clone(),
            }),
            display: Box::new(RecordingDisplay {
                log: log.clone(),
                color: text_color.clone(),
            }),
            sound: Box::new(RecordingSound { log: log.clone() }),
            chars: Box::new(RecordingChars { log: log.clone() }),
            serial: Box::new(console.clone()),
            clock: Box::new(ManualClock(now.clone())),
        };

        let mut neo = Neo6502::with_timing(board, timing);
        neo.init();
        log.borrow_mut().clear();

        Self {
            neo,
            log,
            console,
            now,
            cpu_ticks,
            text_color,
        }
    }

    pub fn count(&self, event: &str) -> usize {
        self.log.borrow().iter().filter(|e| **e == event).count()
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.log.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Default for Rig {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}
