mod common;

use common::Rig;
use neo6502::dispatch::{CTRL_RESET, Command};
use neo6502::hardware::KBD;
use neo6502::scheduler::Timing;

fn quiet(timing: Timing) -> Timing {
    Timing {
        frame_period: u64::MAX / 2,
        stats_period: u64::MAX / 2,
        ..timing
    }
}

#[test]
fn service_fires_floor_n_over_p_times() {
    for (iterations, period) in [(0, 5), (4, 5), (5, 5), (1_234, 100), (999, 1), (20_000, 500)] {
        let mut rig = Rig::new(quiet(Timing {
            service_period: period,
            ..Timing::default()
        }));
        rig.neo.run_for(iterations);

        let expected = (iterations / period) as usize;
        assert_eq!(rig.count("sound.scan"), expected, "N={iterations} P={period}");
        assert_eq!(rig.count("chars.scan"), expected);
        assert_eq!(rig.count("display.scan"), expected);
    }
}

#[test]
fn cpu_ticks_once_per_iteration() {
    let mut rig = Rig::default();
    rig.neo.run_for(12_345);
    assert_eq!(rig.cpu_ticks.get(), 12_345);
    assert_eq!(rig.neo.ticks(), 12_345);
    assert_eq!(rig.neo.state.clock_count, 12_345);
}

#[test]
fn service_slot_runs_after_tick_in_fixed_order() {
    let mut rig = Rig::new(quiet(Timing {
        service_period: 3,
        ..Timing::default()
    }));
    rig.neo.run_for(3);
    assert_eq!(
        rig.events(),
        vec![
            "cpu.tick",
            "cpu.tick",
            "cpu.tick",
            "sound.scan",
            "chars.scan",
            "display.scan",
        ]
    );
}

#[test]
fn sound_scan_sees_mute_flag() {
    let mut rig = Rig::new(quiet(Timing {
        service_period: 1,
        ..Timing::default()
    }));
    rig.neo.state.flags.sound = false;
    rig.neo.step();
    assert_eq!(rig.count("sound.scan.muted"), 1);
    assert_eq!(rig.count("sound.scan"), 0);
}

#[test]
fn key_is_latched_only_on_a_service_slot() {
    let mut rig = Rig::new(quiet(Timing {
        service_period: 50,
        ..Timing::default()
    }));
    rig.console.push_input(b"a");

    rig.neo.run_for(49);
    assert_eq!(rig.neo.memory.read(KBD), 0);
    assert_eq!(rig.console.pending_input(), 1);

    let events = rig.neo.step();
    assert!(events.serviced);
    assert_eq!(events.command, Some(Command::Key(b'a')));
    assert_eq!(rig.neo.memory.read(KBD), b'a');
}

#[test]
fn reset_from_console_runs_before_device_scans() {
    let mut rig = Rig::new(quiet(Timing {
        service_period: 2,
        ..Timing::default()
    }));
    rig.console.push_input(&[CTRL_RESET]);
    rig.neo.run_for(2);

    assert_eq!(
        rig.events(),
        vec![
            "cpu.tick",
            "cpu.tick",
            "display.reset",
            "cpu.reset",
            "sound.scan",
            "chars.scan",
            "display.scan",
        ]
    );
    assert_eq!(rig.console.take_output(), "RESET\n");
}

fn frame_timing() -> Timing {
    Timing {
        service_period: u64::MAX / 2,
        frame_period: 10,
        frame_interval_ms: 16,
        stats_period: u64::MAX / 2,
        ..Timing::default()
    }
}

#[test]
fn frame_swaps_only_when_wall_clock_has_moved() {
    let mut rig = Rig::new(frame_timing());

    rig.neo.run_for(10);
    assert_eq!(rig.count("display.swap"), 0);

    rig.now.set(16);
    rig.neo.run_for(9);
    assert_eq!(rig.count("display.swap"), 0);
    assert!(rig.neo.step().swapped);
    assert_eq!(rig.count("display.swap"), 1);

    rig.now.set(20);
    rig.neo.run_for(10);
    assert_eq!(rig.count("display.swap"), 1);
}

#[test]
fn late_frame_does_not_catch_up() {
    let mut rig = Rig::new(frame_timing());
    rig.now.set(10_000);
    rig.neo.run_for(10);
    assert_eq!(rig.count("display.swap"), 1);

    rig.neo.run_for(50);
    assert_eq!(rig.count("display.swap"), 1);
}

#[test]
fn no_frames_without_auto_update() {
    let mut rig = Rig::new(frame_timing());
    rig.neo.set_auto_update(false);
    rig.now.set(10_000);
    rig.neo.run_for(1_000);
    assert_eq!(rig.count("display.swap"), 0);
}

fn stats_timing() -> Timing {
    Timing {
        service_period: u64::MAX / 2,
        frame_period: u64::MAX / 2,
        stats_period: 100,
        stats_interval_ms: 10,
        ..Timing::default()
    }
}

#[test]
fn no_rate_report_while_logging_is_off() {
    let mut rig = Rig::new(stats_timing());
    rig.now.set(100_000);
    rig.neo.run_for(1_000);
    assert_eq!(rig.console.take_output(), "");
    assert_eq!(rig.neo.state.clock_count, 1_000);
}

#[test]
fn rate_report_after_interval() {
    let mut rig = Rig::new(stats_timing());
    rig.neo.set_logging(true);

    rig.now.set(10);
    rig.neo.run_for(99);
    let events = rig.neo.step();
    assert_eq!(events.rate_khz, Some(10.0));
    assert_eq!(rig.console.take_output(), "kHz = 10.0\n");
    assert_eq!(rig.neo.state.clock_count, 0);
}

#[test]
fn rate_report_waits_for_wall_clock() {
    let mut rig = Rig::new(stats_timing());
    rig.neo.set_logging(true);

    rig.now.set(5);
    rig.neo.run_for(100);
    assert_eq!(rig.console.take_output(), "");
    assert_eq!(rig.neo.state.clock_count, 100);

    rig.now.set(20);
    rig.neo.run_for(100);
    assert_eq!(rig.console.take_output(), "kHz = 10.0\n");
    assert_eq!(rig.neo.state.clock_count, 0);
}
