//! NEO6502 firmware core.
//!
//! A single-threaded machine: the [`scheduler`] ticks the CPU once per loop
//! iteration and interleaves console dispatch, peripheral scans, frame
//! presentation and clock-rate reporting by counting ticks. ROM packages are
//! validated and installed by [`cartridge`]. The CPU, display, sound and
//! console are collaborators behind traits so hosts and tests can swap them.

/// ROM package header, validation and loading.
pub mod cartridge;

/// System presets and cartridge slots.
pub mod config;

/// CPU collaborator interface.
pub mod cpu;

/// Display, sound, character output and clock collaborators.
pub mod devices;

/// Memory window dumps for the console.
pub mod diagnostics;

/// Console control codes and keyboard latch handshake.
pub mod dispatch;

/// Named addresses of the memory map.
pub mod hardware;

/// Machine state, board wiring and the top-level facade.
pub mod machine;

/// The 64 KiB address space.
pub mod memory;

/// Tick-gated cooperative main loop.
pub mod scheduler;

/// Console byte stream.
pub mod serial;
