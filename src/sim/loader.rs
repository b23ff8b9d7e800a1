//! Diagnostic tape loading and the harness's `AddressSpace` collaborator.
//!
//! A "tape" is the harness's stand-in for the "surrounding boot loader...
//! REPL over a console device" that the distilled spec defers to an
//! external collaborator (§6, SPEC_FULL.md §6): a line-delimited JSON file,
//! one [`TapeRecord`] per line, each naming an instruction word to feed
//! `execute_fpp` plus whatever memory/registers it needs preloaded. This
//! mirrors this repository's own `sim::loader` (load a binary, seed initial
//! CPU state) scaled down to the FPP core's actual collaborator contract
//! instead of a full RAM image.
//!
//! [`FlatBus`] implements [`crate::fpp::AddressSpace`] directly: a sparse
//! word-addressed memory plus an 8-register file, with no virtual-to-
//! physical translation of its own (the distilled spec places the MMU
//! firmly out of the core's scope — §1, §6) and an optional set of
//! addresses the tape marks as unbacked, letting a record exercise the
//! fault path (§4.C: "Faults propagate upward and cancel the instruction").

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader};
use std::process;

use serde::Deserialize;

use crate::common::{Fault, FppResult};
use crate::fpp::AddressSpace;

/// One line of a diagnostic tape.
#[derive(Debug, Deserialize)]
pub struct TapeRecord {
    /// Human-readable label, echoed by the harness's trace output.
    #[serde(default)]
    pub label: String,
    /// Program counter to seed into general register 7 before executing.
    #[serde(default)]
    pub pc: u32,
    /// The 16-bit instruction word passed to `execute_fpp`.
    pub instruction: u16,
    /// Initial FPS raw value, applied before the instruction executes.
    #[serde(default)]
    pub fps: u16,
    /// `(address, word)` pairs to preload into memory before executing.
    #[serde(default)]
    pub memory: Vec<(u32, u16)>,
    /// Initial values for general registers 0..=7; `pc` above still wins
    /// for register 7 if both are present.
    #[serde(default)]
    pub gprs: Option<[u32; 8]>,
    /// Addresses that should fault (as [`Fault::BadAddress`]) rather than
    /// resolve, for exercising the fault-aborts-the-instruction path.
    #[serde(default)]
    pub unbacked: Vec<u32>,
}

/// Reads and parses a line-delimited JSON tape file.
///
/// Exits the process on a missing file or malformed line, matching this
/// repository's existing `load_binary` convention of treating a bad input
/// path as a fatal harness error rather than a recoverable one.
pub fn load_tape(path: &str) -> Vec<TapeRecord> {
    let file = fs::File::open(path).unwrap_or_else(|e| {
        eprintln!("\n[!] FATAL: Could not read tape '{}': {}", path, e);
        process::exit(1);
    });
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.unwrap_or_else(|e| {
            eprintln!("\n[!] FATAL: Could not read line {} of '{}': {}", lineno + 1, path, e);
            process::exit(1);
        });
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: TapeRecord = serde_json::from_str(trimmed).unwrap_or_else(|e| {
            eprintln!(
                "\n[!] FATAL: Malformed tape record at line {} of '{}': {}",
                lineno + 1,
                path,
                e
            );
            process::exit(1);
        });
        records.push(record);
    }
    records
}

/// A minimal in-memory `AddressSpace`: eight general registers and a
/// sparse word-addressed memory, with no page translation of its own.
///
/// This is the harness's concrete implementation of the collaborator
/// contract (§6) — the core never constructs or depends on this type
/// directly, only on the [`AddressSpace`] trait it implements.
#[derive(Debug, Default)]
pub struct FlatBus {
    gprs: [u32; 8],
    memory: HashMap<u32, u16>,
    unbacked: HashSet<u32>,
    pub cpu_flags: u8,
    pub trap_mask: u32,
}

impl FlatBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares a bus from a tape record: seeds registers, preloads
    /// memory, and records which addresses should fault on access.
    pub fn from_record(record: &TapeRecord) -> Self {
        let mut bus = Self::new();
        if let Some(gprs) = record.gprs {
            bus.gprs = gprs;
        }
        bus.gprs[7] = record.pc;
        for &(addr, word) in &record.memory {
            bus.memory.insert(addr, word);
        }
        bus.unbacked = record.unbacked.iter().copied().collect();
        bus
    }
}

impl AddressSpace for FlatBus {
    fn gpr(&self, reg: u8) -> u32 {
        self.gprs[reg as usize & 0x7]
    }

    fn set_gpr(&mut self, reg: u8, value: u32) {
        self.gprs[reg as usize & 0x7] = value;
    }

    fn read_word(&mut self, vaddr: u32) -> FppResult<u16> {
        if self.unbacked.contains(&vaddr) {
            return Err(Fault::BadAddress(vaddr));
        }
        Ok(*self.memory.get(&vaddr).unwrap_or(&0))
    }

    fn write_word(&mut self, vaddr: u32, value: u16) -> FppResult<()> {
        if self.unbacked.contains(&vaddr) {
            return Err(Fault::BadAddress(vaddr));
        }
        self.memory.insert(vaddr, value);
        Ok(())
    }

    fn set_cpu_flags(&mut self, nzvc: u8) {
        self.cpu_flags = nzvc & 0xF;
    }

    fn raise_trap_mask(&mut self, bit: u8) {
        self.trap_mask |= 1 << bit;
    }
}
