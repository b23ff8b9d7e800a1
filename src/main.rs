//! FP11 diagnostic-tape replay harness.
//!
//! Loads a TOML config and a line-delimited-JSON diagnostic tape, replays
//! each record through [`execute_fpp`](fp11_fpp::fpp::execute_fpp) against
//! a fresh [`FlatBus`](fp11_fpp::sim::FlatBus), and prints the resulting
//! FPS/FEC/FEA trajectory alongside a final statistics summary. This is the
//! concrete "surrounding boot loader... REPL over a console device" the
//! distilled core specification defers to an external collaborator
//! (SPEC_FULL.md §6) — present in the repository, outside the core.

use clap::Parser;
use std::{fs, process};

extern crate fp11_fpp;

use fp11_fpp::common::Trap;
use fp11_fpp::config::Config;
use fp11_fpp::fpp::{execute_fpp, Fpp};
use fp11_fpp::sim::{load_tape, FlatBus};
use fp11_fpp::stats::DiagnosticStats;

/// Command-line arguments for the FP11 diagnostic-tape replay harness.
#[derive(Parser, Debug)]
#[command(author, version, about = "FP11 Floating-Point Coprocessor Diagnostic Harness")]
struct Args {
    #[arg(short, long, default_value = "harness/config/default.toml")]
    config: String,

    #[arg(short, long)]
    tape: Option<String>,

    #[arg(long)]
    trace: bool,
}

fn family(instruction: u16) -> u16 {
    (instruction >> 8) & 0xF
}

/// Main entry point for the FP11 diagnostic-tape replay harness.
///
/// 1. **Configuration**: parses CLI args and the TOML config file.
/// 2. **Tape load**: reads the line-delimited JSON tape named by
///    `--tape`, falling back to the config's `general.tape_path`.
/// 3. **Replay**: for each record, seeds a fresh `FlatBus` and `Fpp`
///    (config-driven initial FPS, overridden per-record), calls
///    `execute_fpp` once, and prints the resulting FPS/FEC/FEA.
/// 4. **Report**: prints the accumulated `DiagnosticStats` summary.
fn main() {
    let args = Args::parse();
    let config_content = fs::read_to_string(&args.config).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: Could not read config '{}': {}", args.config, e);
        process::exit(1);
    });
    let config: Config = toml::from_str(&config_content).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: Could not parse config '{}': {}", args.config, e);
        process::exit(1);
    });

    let trace = args.trace || config.general.trace;
    let tape_path = args.tape.unwrap_or_else(|| config.general.tape_path.clone());

    println!("FP11 Diagnostic Harness");
    println!("-----------------------");
    println!("Config:  {}", args.config);
    println!("Tape:    {}", tape_path);
    println!("Trace:   {}", trace);
    println!("-----------------------");

    let records = load_tape(&tape_path);
    let mut stats = DiagnosticStats::default();

    for record in &records {
        let mut bus = FlatBus::from_record(record);
        let mut fpp = Fpp::with_trace(trace);
        fpp.fps = config.fps.initial_fps();
        if record.fps != 0 {
            fpp.fps.0 = record.fps;
        }

        stats.record_family(family(record.instruction));

        match execute_fpp(&mut fpp, record.instruction, &mut bus) {
            Ok(()) => {
                if fpp.fps.fer() {
                    if let Some(trap) = trap_from_fec(fpp.fec) {
                        stats.record_trap(trap);
                    }
                }
                if trace || fpp.fps.fer() {
                    println!(
                        "[{}] instr={:#06o} fps={:#06o} fec={} fea={:#o} trap_mask={:#x}",
                        record.label, record.instruction, fpp.fps.raw(), fpp.fec, fpp.fea, bus.trap_mask
                    );
                }
            }
            Err(fault) => {
                stats.record_memory_fault();
                println!("[{}] instr={:#06o} FAULT: {:?}", record.label, record.instruction, fault);
            }
        }
    }

    stats.print();
}

fn trap_from_fec(fec: u16) -> Option<Trap> {
    match fec {
        2 => Some(Trap::IllegalOpcode),
        4 => Some(Trap::DivideByZero),
        6 => Some(Trap::IntegerConversionOverflow),
        8 => Some(Trap::Overflow),
        10 => Some(Trap::Underflow),
        12 => Some(Trap::UndefinedVariable),
        14 => Some(Trap::Maintenance),
        _ => None,
    }
}
