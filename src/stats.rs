//! Diagnostic-run statistics collection and reporting.
//!
//! Mirrors this repository's own performance-statistics convention (a
//! plain counter struct plus a human-readable `print()`), scaled down from
//! cycle/IPC/cache metrics to what a per-opcode FPP diagnostic run actually
//! has: an instruction-family mix and a trap tally. Nothing here feeds back
//! into the core — `execute_fpp` never sees this type — it is purely the
//! harness's own bookkeeping (SPEC_FULL.md component G).

use std::time::Instant;

/// Per-run counters for the FPP diagnostic harness.
pub struct DiagnosticStats {
    start_time: Instant,

    pub records_replayed: u64,

    pub op_load: u64,
    pub op_store: u64,
    pub op_single_operand: u64,
    pub op_add_sub: u64,
    pub op_mul: u64,
    pub op_div: u64,
    pub op_modf: u64,
    pub op_convert: u64,
    pub op_control: u64,

    pub traps_illegal_opcode: u64,
    pub traps_divide_by_zero: u64,
    pub traps_integer_overflow: u64,
    pub traps_overflow: u64,
    pub traps_underflow: u64,
    pub traps_undefined_variable: u64,
    pub traps_maintenance: u64,

    pub memory_faults: u64,
}

impl Default for DiagnosticStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            records_replayed: 0,
            op_load: 0,
            op_store: 0,
            op_single_operand: 0,
            op_add_sub: 0,
            op_mul: 0,
            op_div: 0,
            op_modf: 0,
            op_convert: 0,
            op_control: 0,
            traps_illegal_opcode: 0,
            traps_divide_by_zero: 0,
            traps_integer_overflow: 0,
            traps_overflow: 0,
            traps_underflow: 0,
            traps_undefined_variable: 0,
            traps_maintenance: 0,
            memory_faults: 0,
        }
    }
}

impl DiagnosticStats {
    /// Bumps the family counter matching the high nibble of a decoded
    /// instruction (§4.F's opcode-family table).
    pub fn record_family(&mut self, family: u16) {
        match family {
            0x0 => self.op_control += 1,
            0x1 => self.op_single_operand += 1,
            0x2 | 0x9 => {
                if family == 0x2 {
                    self.op_mul += 1
                } else {
                    self.op_div += 1
                }
            }
            0x3 => self.op_modf += 1,
            0x4 | 0x6 | 0x7 => self.op_add_sub += 1,
            0x5 => self.op_load += 1,
            0x8 | 0xA => self.op_store += 1,
            0xB..=0xF => self.op_convert += 1,
            _ => {}
        }
        self.records_replayed += 1;
    }

    /// Bumps the matching trap counter for a raised [`crate::common::Trap`].
    pub fn record_trap(&mut self, trap: crate::common::Trap) {
        use crate::common::Trap::*;
        match trap {
            IllegalOpcode => self.traps_illegal_opcode += 1,
            DivideByZero => self.traps_divide_by_zero += 1,
            IntegerConversionOverflow => self.traps_integer_overflow += 1,
            Overflow => self.traps_overflow += 1,
            Underflow => self.traps_underflow += 1,
            UndefinedVariable => self.traps_undefined_variable += 1,
            Maintenance => self.traps_maintenance += 1,
        }
    }

    pub fn record_memory_fault(&mut self) {
        self.memory_faults += 1;
    }

    /// Prints a formatted summary of the replay, in the same tabular style
    /// as this repository's other statistics report.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let total_traps = self.traps_illegal_opcode
            + self.traps_divide_by_zero
            + self.traps_integer_overflow
            + self.traps_overflow
            + self.traps_underflow
            + self.traps_undefined_variable
            + self.traps_maintenance;

        println!("\n==========================================================");
        println!("FP11 DIAGNOSTIC REPLAY STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("records_replayed         {}", self.records_replayed);
        println!("----------------------------------------------------------");
        println!("INSTRUCTION MIX");
        println!("  op.load                {}", self.op_load);
        println!("  op.store               {}", self.op_store);
        println!("  op.single_operand      {}", self.op_single_operand);
        println!("  op.add_sub_cmp         {}", self.op_add_sub);
        println!("  op.mul                 {}", self.op_mul);
        println!("  op.div                 {}", self.op_div);
        println!("  op.modf                {}", self.op_modf);
        println!("  op.convert             {}", self.op_convert);
        println!("  op.control             {}", self.op_control);
        println!("----------------------------------------------------------");
        println!("TRAPS (FEC)");
        println!("  fec.2  illegal_opcode  {}", self.traps_illegal_opcode);
        println!("  fec.4  divide_by_zero  {}", self.traps_divide_by_zero);
        println!("  fec.6  int_overflow    {}", self.traps_integer_overflow);
        println!("  fec.8  overflow        {}", self.traps_overflow);
        println!("  fec.10 underflow       {}", self.traps_underflow);
        println!("  fec.12 undefined_var   {}", self.traps_undefined_variable);
        println!("  fec.14 maintenance     {}", self.traps_maintenance);
        println!("  traps.total            {}", total_traps);
        println!("----------------------------------------------------------");
        println!("memory_faults            {}", self.memory_faults);
        println!("==========================================================");
    }
}
