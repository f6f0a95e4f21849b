mod audio;
mod keymap;
mod terminal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use chip8::{disassemble, Chip8, Config, ROM_ADDR};
use clap::{Parser, Subcommand};
use log::{debug, error, info};

use crate::audio::Tone;
use crate::keymap::KeyBindings;
use crate::terminal::Terminal;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Log more (repeat for trace output)")]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a ROM in the terminal. Esc quits.
    Run {
        #[arg(value_name = "PATH", help = "ROM to load at 0x200", value_hint = clap::ValueHint::FilePath)]
        rom: PathBuf,
        #[arg(long, value_name = "PATH", help = "JSON key bindings, e.g. {\"q\": 4}", value_hint = clap::ValueHint::FilePath)]
        keymap: Option<PathBuf>,
        #[arg(long, value_name = "MICROS", default_value_t = 2000, help = "Pause after every instruction")]
        cycle_delay_us: u64,
        #[arg(long, help = "Treat 0nnn as a jump instead of ignoring it")]
        sys_jump: bool,
        #[arg(long, help = "Log every executed instruction at trace level")]
        trace: bool,
        #[arg(long, help = "Seed for the random number instruction")]
        seed: Option<u64>,
        #[arg(long, help = "Don't open an audio device")]
        mute: bool,
    },
    /// Print a listing of a ROM
    Disasm {
        #[arg(value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
        rom: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match args.command {
        Command::Run {
            rom,
            keymap,
            cycle_delay_us,
            sys_jump,
            trace,
            seed,
            mute,
        } => {
            let config = Config {
                cycle_delay: Duration::from_micros(cycle_delay_us),
                sys_jump,
                trace_operations: trace,
                seed,
                ..Config::default()
            };
            run(rom, keymap, config, mute)
        }
        Command::Disasm { rom } => disasm(rom),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(rom: PathBuf, keymap: Option<PathBuf>, config: Config, mute: bool) -> anyhow::Result<()> {
    let bindings = match keymap {
        Some(path) => KeyBindings::from_file(&path)?,
        None => KeyBindings::default(),
    };

    let terminal = Terminal::new(bindings, Tone::new(mute)).context("set up terminal")?;
    let mut chip8 = Chip8::with_config(terminal, config).context("construct new chip8 instance")?;
    chip8.load_rom_from_file(&rom)?;
    let stop = chip8.stop_token();
    chip8.adapter_mut().set_stop_token(stop);

    let result = chip8.run();
    if result.is_err() {
        debug!("machine state at halt:\n{}", chip8);
    }
    chip8.shutdown();
    // restores the terminal before anything is reported
    drop(chip8);

    match result {
        Ok(()) => {
            info!("stopped");
            Ok(())
        }
        Err(fault) => {
            error!("{}", fault);
            Err(fault).context("emulation halted")
        }
    }
}

fn disasm(rom: PathBuf) -> anyhow::Result<()> {
    let bytes = std::fs::read(&rom).with_context(|| format!("read rom file {}", rom.display()))?;
    for line in disassemble(&bytes, ROM_ADDR as u16) {
        println!("{}", line);
    }
    Ok(())
}
