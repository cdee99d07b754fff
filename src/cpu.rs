use crate::hardware::RESET_VECTOR;
use crate::memory::MemoryImage;

/// The instruction-set core the scheduler drives.
///
/// One [`tick`](Cpu::tick) advances emulation by a single clock; the
/// scheduler calls it exactly once per loop iteration.
pub trait Cpu {
    /// Reload the program counter from the RESET vector and clear CPU state.
    fn reset(&mut self, memory: &mut MemoryImage);

    fn tick(&mut self, memory: &mut MemoryImage);
}

/// Placeholder core that executes nothing.
///
/// It latches the RESET vector on reset and counts ticks, which is enough to
/// exercise loading, dispatch and scheduling without an instruction set.
#[derive(Debug, Default, Clone)]
pub struct IdleCpu {
    pub pc: u16,
    pub cycles: u64,
    pub resets: u32,
}

impl IdleCpu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cpu for IdleCpu {
    fn reset(&mut self, memory: &mut MemoryImage) {
        self.pc = memory.read_u16(RESET_VECTOR);
        self.cycles = 0;
        self.resets += 1;
    }

    fn tick(&mut self, _memory: &mut MemoryImage) {
        self.cycles += 1;
    }
}
