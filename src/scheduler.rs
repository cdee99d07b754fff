//! Cooperative main loop.
//!
//! There is no preemption: every iteration ticks the CPU once, then checks
//! three periodic tasks. Each task is gated on the monotonic tick count; the
//! frame and stats tasks additionally confirm against the wall clock, so the
//! clock is only read once per few thousand ticks.

use log::info;
use serde::{Deserialize, Serialize};

use crate::dispatch::{Command, dispatch_pending_input};
use crate::machine::{Board, MachineState};
use crate::memory::MemoryImage;

pub const SERVICE_PERIOD: u64 = 500;
pub const FRAME_PERIOD: u64 = 5_000;
pub const STATS_PERIOD: u64 = 20_000;
/// Minimum wall time between presented frames (~60 Hz).
pub const FRAME_INTERVAL_MS: u64 = 16;
pub const STATS_INTERVAL_MS: u64 = 5_000;

/// Loop cadence. Periods are in CPU ticks, intervals in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub service_period: u64,
    pub frame_period: u64,
    pub stats_period: u64,
    pub frame_interval_ms: u64,
    pub stats_interval_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            service_period: SERVICE_PERIOD,
            frame_period: FRAME_PERIOD,
            stats_period: STATS_PERIOD,
            frame_interval_ms: FRAME_INTERVAL_MS,
            stats_interval_ms: STATS_INTERVAL_MS,
        }
    }
}

/// A task that becomes due every `period` ticks.
///
/// Firing moves the deadline to `tick + period`, so a task fires at most once
/// per period no matter how long it was left unpolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTask {
    period: u64,
    next_due: u64,
}

impl PeriodicTask {
    pub fn new(period: u64) -> Self {
        let period = period.max(1);
        Self {
            period,
            next_due: period,
        }
    }

    pub fn poll(&mut self, tick: u64) -> bool {
        if tick < self.next_due {
            return false;
        }
        self.next_due = tick + self.period;
        true
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn next_due(&self) -> u64 {
        self.next_due
    }
}

/// What one iteration did besides ticking the CPU.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepEvents {
    pub serviced: bool,
    pub command: Option<Command>,
    pub swapped: bool,
    pub rate_khz: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    timing: Timing,
    ticks: u64,
    service: PeriodicTask,
    frame: PeriodicTask,
    stats: PeriodicTask,
    last_stats_ms: u64,
    last_frame_ms: u64,
}

impl Scheduler {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            ticks: 0,
            service: PeriodicTask::new(timing.service_period),
            frame: PeriodicTask::new(timing.frame_period),
            stats: PeriodicTask::new(timing.stats_period),
            last_stats_ms: 0,
            last_frame_ms: 0,
        }
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Total iterations since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Restart both wall-clock windows at `now_ms`.
    pub fn restart_clock(&mut self, now_ms: u64) {
        self.last_stats_ms = now_ms;
        self.last_frame_ms = now_ms;
    }

    /// One loop iteration: tick the CPU, then run whichever tasks are due, in
    /// the order service, frame, stats.
    pub fn step(
        &mut self,
        memory: &mut MemoryImage,
        state: &mut MachineState,
        board: &mut Board,
    ) -> StepEvents {
        board.cpu.tick(memory);
        self.ticks += 1;
        state.clock_count += 1;

        let mut events = StepEvents::default();

        if self.service.poll(self.ticks) {
            events.serviced = true;
            events.command = dispatch_pending_input(memory, state, board);
            board.sound.scan(memory, state.flags.sound);
            board.chars.scan(memory, board.serial.as_mut());
            board.display.scan(memory);
        }

        if state.flags.auto_update && self.frame.poll(self.ticks) {
            let now = board.clock.millis();
            if now.saturating_sub(self.last_frame_ms) >= self.timing.frame_interval_ms {
                board.display.swap();
                self.last_frame_ms = now;
                events.swapped = true;
            }
        }

        if state.flags.logging && self.stats.poll(self.ticks) {
            let now = board.clock.millis();
            let elapsed = now.saturating_sub(self.last_stats_ms);
            if elapsed >= self.timing.stats_interval_ms {
                let khz = state.clock_count as f64 / elapsed.max(1) as f64;
                board.serial.write_line(&format!("kHz = {khz:.1}"));
                info!("CPU clock {khz:.1} kHz over {elapsed} ms");
                state.clock_count = 0;
                self.last_stats_ms = now;
                events.rate_khz = Some(khz);
            }
        }

        events
    }

    pub fn run_for(
        &mut self,
        iterations: u64,
        memory: &mut MemoryImage,
        state: &mut MachineState,
        board: &mut Board,
    ) {
        for _ in 0..iterations {
            self.step(memory, state, board);
        }
    }

    /// The firmware main loop. Never returns.
    pub fn run(
        &mut self,
        memory: &mut MemoryImage,
        state: &mut MachineState,
        board: &mut Board,
    ) -> ! {
        loop {
            self.step(memory, state, board);
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}
