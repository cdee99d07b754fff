//! Console command dispatch.
//!
//! Control codes share the stream with ordinary keyboard input. Each service
//! slot looks at one pending byte: reserved codes are consumed and acted on,
//! anything else is handed to the emulated keyboard latch if the program has
//! drained it.

use log::{debug, info, trace};

use crate::diagnostics::memory_dump;
use crate::hardware::{KBD, KBD_EMPTY, KBD_STROBE};
use crate::machine::{Board, MachineState};
use crate::memory::MemoryImage;

pub const CTRL_RESET: u8 = 0x12; // ^R
pub const CTRL_LOGGING: u8 = 0x0C; // ^L
pub const CTRL_DUMP: u8 = 0x04; // ^D
pub const CTRL_SOUND: u8 = 0x13; // ^S
pub const CTRL_TRACE: u8 = 0x14; // ^T

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Reset the display and the CPU.
    Reset,
    /// Toggle rate logging and restart the tick accumulator.
    ToggleLogging,
    /// Print the VDU, sprite and tile windows.
    DumpMemory,
    ToggleSound,
    ToggleTrace,
    /// Anything else is keyboard input.
    Key(u8),
}

impl Command {
    pub fn decode(byte: u8) -> Self {
        match byte {
            CTRL_RESET => Command::Reset,
            CTRL_LOGGING => Command::ToggleLogging,
            CTRL_DUMP => Command::DumpMemory,
            CTRL_SOUND => Command::ToggleSound,
            CTRL_TRACE => Command::ToggleTrace,
            other => Command::Key(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Command::Reset => CTRL_RESET,
            Command::ToggleLogging => CTRL_LOGGING,
            Command::DumpMemory => CTRL_DUMP,
            Command::ToggleSound => CTRL_SOUND,
            Command::ToggleTrace => CTRL_TRACE,
            Command::Key(b) => b,
        }
    }

    pub fn is_control(self) -> bool {
        !matches!(self, Command::Key(_))
    }

    /// Run a control command. The byte must already be consumed.
    fn execute(self, memory: &mut MemoryImage, state: &mut MachineState, board: &mut Board) {
        match self {
            Command::Reset => {
                board.serial.write_line("RESET");
                info!("Console: reset");
                board.display.reset();
                board.cpu.reset(memory);
            }
            Command::ToggleLogging => {
                board.serial.write_line("LOGGING");
                state.flags.logging = !state.flags.logging;
                state.clock_count = 0;
                info!("Console: logging {}", on_off(state.flags.logging));
            }
            Command::DumpMemory => {
                board.serial.write_str(&memory_dump(memory));
                debug!("Console: memory dump");
            }
            Command::ToggleSound => {
                board.serial.write_line("SOUND");
                state.flags.sound = !state.flags.sound;
                info!("Console: sound {}", on_off(state.flags.sound));
            }
            Command::ToggleTrace => {
                board.serial.write_line("TRACE");
                state.flags.trace = !state.flags.trace;
                info!("Console: trace {}", on_off(state.flags.trace));
            }
            Command::Key(_) => {}
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// Handle at most one pending console byte.
///
/// Returns the command that consumed a byte, or `None` when nothing was
/// pending or a key is held back because the keyboard latch is still full.
pub fn dispatch_pending_input(
    memory: &mut MemoryImage,
    state: &mut MachineState,
    board: &mut Board,
) -> Option<Command> {
    let byte = board.serial.peek()?;

    match Command::decode(byte) {
        Command::Key(_) => {
            if memory.read(KBD) != KBD_EMPTY {
                return None;
            }
            let ch = board.serial.read()?;
            let latched = if state.flags.ucase {
                ch.to_ascii_uppercase() | KBD_STROBE
            } else {
                ch
            };
            memory.write(KBD, latched);
            if state.flags.trace {
                let shown = if state.flags.ucase {
                    ch.to_ascii_uppercase()
                } else {
                    ch
                };
                board.serial.write_line(&format!("IN: [{shown:02X}]"));
            }
            trace!("KBD <- {latched:02X}");
            Some(Command::Key(latched))
        }
        command => {
            board.serial.read();
            command.execute(memory, state, board);
            Some(command)
        }
    }
}
