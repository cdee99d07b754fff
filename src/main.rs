use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};
use neo6502::cartridge::Cartridge;
use neo6502::config::{self, ConfigError, SystemConfig};
use neo6502::cpu::IdleCpu;
use neo6502::devices::{Apple1Terminal, HeadlessDisplay, MuteSound, SystemClock};
use neo6502::machine::{Board, Neo6502};
use neo6502::serial::StdioSerial;

#[derive(Parser)]
#[command(version, about = "NEO6502 firmware emulator")]
struct Args {
    /// ROM packages to load after the preset's cartridges
    roms: Vec<PathBuf>,

    /// Path to the system config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Preset to apply instead of the one named in the config
    #[arg(long)]
    preset: Option<String>,

    /// Start with clock-rate logging on (same as pressing ^L)
    #[arg(long)]
    log_stats: bool,

    /// Stop after this many CPU ticks instead of running forever
    #[arg(long)]
    ticks: Option<u64>,

    /// List the configured presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn load_config(args: &Args) -> Result<SystemConfig, ConfigError> {
    if let Some(path) = &args.config {
        return config::load_from_file(path);
    }

    let path = config::default_config_path();
    if path.exists() {
        config::load_from_file(&path)
    } else {
        Ok(SystemConfig::default())
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if args.list_presets {
        for p in &cfg.presets {
            println!(
                "{:<12} ucase={} protect={} color={:#04x} cartridges={:?}",
                p.name, p.ucase, p.write_protect, p.text_color, p.cartridges
            );
        }
        return ExitCode::SUCCESS;
    }

    if args.print_config {
        print!("{}", config::to_toml(&cfg));
        return ExitCode::SUCCESS;
    }

    let preset_name = args.preset.as_deref().unwrap_or(&cfg.preset);
    let (preset, cartridges) = match cfg
        .preset(preset_name)
        .and_then(|p| Ok((p, cfg.cartridges_for(p)?)))
    {
        Ok(found) => found,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let serial = match StdioSerial::spawn() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to start console reader: {e}");
            return ExitCode::FAILURE;
        }
    };

    let board = Board {
        cpu: Box::new(IdleCpu::new()),
        display: Box::new(HeadlessDisplay::default()),
        sound: Box::new(MuteSound),
        chars: Box::new(Apple1Terminal),
        serial: Box::new(serial),
        clock: Box::new(SystemClock::new()),
    };
    let mut neo = Neo6502::with_timing(board, cfg.timing);
    neo.init();

    let report = neo.configure(preset, &cartridges);
    info!(
        "Preset {}: {} cartridge(s) loaded, {} failed",
        preset.name,
        report.loaded.len(),
        report.failed.len()
    );

    if !args.roms.is_empty() {
        for path in &args.roms {
            match Cartridge::from_file(path) {
                Ok(cart) => {
                    let _ = neo.add_rom(&cart);
                }
                Err(e) => warn!("Failed to read ROM {}: {e}", path.display()),
            }
        }
        neo.board.cpu.reset(&mut neo.memory);
    }

    if args.log_stats {
        neo.set_logging(true);
    }

    match args.ticks {
        Some(n) => {
            neo.run_for(n);
            info!("Stopped after {} ticks", neo.ticks());
            ExitCode::SUCCESS
        }
        None => neo.run(),
    }
}
