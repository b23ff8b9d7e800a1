//! Operand addressing (component C).
//!
//! The core never touches memory directly: it resolves a PDP-11 addressing
//! mode against an [`AddressSpace`] collaborator, which owns the general
//! registers, the virtual-to-physical translation, and word-granular
//! memory transfers (§6). This module only knows how to walk the six
//! addressing modes and assemble/disassemble a multi-word FPP value; it has
//! no opinion on what backs a virtual address.

use crate::common::{Fault, FppResult, Trap};
use crate::fpp::status::{is_undefined_variable, Fps, Number};

/// General register 7 is the CPU program counter; register 6 the stack
/// pointer. Neither name is special to the addressing logic itself except
/// that PC-relative autoincrement always steps by 2 (§4.C).
pub const PC: u8 = 7;

/// The CPU/MMU/general-register collaborator the core depends on (§6).
///
/// A harness or a real CPU dispatcher implements this; the core only calls
/// through it.
pub trait AddressSpace {
    /// Reads a general register (0..=7) as a 17-bit virtual address or
    /// index value.
    fn gpr(&self, reg: u8) -> u32;

    /// Writes a general register, e.g. after auto-increment/decrement.
    fn set_gpr(&mut self, reg: u8, value: u32);

    /// Single 16-bit transfer at an I/D virtual address.
    fn read_word(&mut self, vaddr: u32) -> FppResult<u16>;

    /// Single 16-bit transfer at an I/D virtual address.
    fn write_word(&mut self, vaddr: u32, value: u16) -> FppResult<()>;

    /// Copies the 4-bit NZVC nibble into the CPU's own condition-code
    /// register (used by CFCC and by STCFI).
    fn set_cpu_flags(&mut self, nzvc: u8);

    /// Raises the named bit of the CPU's trap-mask register. Bit 3 is the
    /// FPP trap signal (§6, §7); diagnostics may use other bits.
    fn raise_trap_mask(&mut self, bit: u8);
}

/// A resolved operand location, captured once and reused for the
/// write-back half of a read-modify-write instruction (ABS, NEG). This is
/// the core's in-process stand-in for the collaborator contract's
/// `cpu.modify_register`/`cpu.modify_address` slots (§6) — returning an
/// owned value instead of mutating hidden fields on the collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Register-mode operand: one of the six FPP accumulators (0..=5).
    /// 6 and 7 are illegal and never constructed here — see
    /// [`resolve`].
    Accumulator(u8),
    /// A multi-word operand starting at the given virtual address.
    Memory(u32),
    /// The PC-relative immediate operand at the given virtual address: a
    /// single short-literal word, zero-extended into the high end of an
    /// FPP value regardless of active precision (§4.C, §9's "auto-increment
    /// quirk"). Distinct from [`Operand::Memory`] because it must never be
    /// widened into a multi-word read — only one word ever follows `(PC)+`
    /// immediate mode, no matter how many words the active precision would
    /// otherwise demand.
    Immediate(u32),
}

/// Either of the two ways resolving an addressing mode can fail: an
/// architectural trap (e.g. a register-mode operand naming AC6/AC7), or a
/// collaborator memory fault propagated from a deferred-pointer or
/// index-extension-word read (modes 3/5/6/7). The two are never
/// interchangeable (§4.C, §7): a trap latches FPS/FEC/FEA and may raise the
/// CPU trap-mask bit, while a fault aborts the instruction with FPS
/// untouched. Keeping them as one enum here, rather than collapsing a fault
/// into `Trap::IllegalOpcode`, is what lets callers tell the two apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingError {
    Trap(Trap),
    Fault(Fault),
}

impl From<Trap> for AddressingError {
    fn from(trap: Trap) -> Self {
        AddressingError::Trap(trap)
    }
}

impl From<Fault> for AddressingError {
    fn from(fault: Fault) -> Self {
        AddressingError::Fault(fault)
    }
}

/// Resolves the 6-bit addressing-mode field (3 mode bits, 3 register bits)
/// against `bus`, advancing the named general register as auto-increment
/// or auto-decrement requires. `operand_bytes` is the operand's natural
/// byte length (8 for double, 4 for float) — ignored for the PC-relative
/// immediate case, which always steps PC by 2 (§4.C, §9).
pub fn resolve(
    mode_bits: u8,
    operand_bytes: u8,
    bus: &mut impl AddressSpace,
) -> Result<Operand, AddressingError> {
    let mode = (mode_bits >> 3) & 0x7;
    let reg = mode_bits & 0x7;

    if mode == 0 {
        return if reg <= 5 {
            Ok(Operand::Accumulator(reg))
        } else {
            Err(Trap::IllegalOpcode.into())
        };
    }

    let step = |reg: u8| -> u32 {
        if reg == PC {
            2
        } else {
            operand_bytes as u32
        }
    };

    let addr = match mode {
        1 => bus.gpr(reg),
        2 => {
            let addr = bus.gpr(reg);
            bus.set_gpr(reg, addr.wrapping_add(step(reg)));
            if reg == PC {
                return Ok(Operand::Immediate(addr));
            }
            addr
        }
        3 => {
            let ptr = bus.gpr(reg);
            bus.set_gpr(reg, ptr.wrapping_add(2));
            fetch_pointer(bus, ptr)?
        }
        4 => {
            let addr = bus.gpr(reg).wrapping_sub(step(reg));
            bus.set_gpr(reg, addr);
            addr
        }
        5 => {
            let ptr = bus.gpr(reg).wrapping_sub(2);
            bus.set_gpr(reg, ptr);
            fetch_pointer(bus, ptr)?
        }
        6 => {
            let base = bus.gpr(reg);
            base.wrapping_add(fetch_index(bus)? as u32)
        }
        7 => {
            let base = bus.gpr(reg);
            let deferred = base.wrapping_add(fetch_index(bus)? as u32);
            fetch_pointer(bus, deferred)?
        }
        _ => unreachable!("mode is masked to 3 bits"),
    };

    Ok(Operand::Memory(addr))
}

/// Reads the pointer word for a deferred addressing mode (3/5/7). A failure
/// here is a collaborator memory fault, not an architectural trap — it
/// propagates as `Fault` and aborts the instruction with FPS untouched
/// (§4.C, §7), rather than being recoded into `Trap::IllegalOpcode`.
fn fetch_pointer(bus: &mut impl AddressSpace, at: u32) -> Result<u32, Fault> {
    bus.read_word(at).map(|w| w as u32)
}

/// Fetches the index extension word following the instruction at PC and
/// advances PC by 2, as every PDP-11 index-mode addressing does. Like
/// [`fetch_pointer`], a read failure here is a `Fault`, not a `Trap`.
fn fetch_index(bus: &mut impl AddressSpace) -> Result<i16, Fault> {
    let pc = bus.gpr(PC);
    let word = bus.read_word(pc)?;
    bus.set_gpr(PC, pc.wrapping_add(2));
    Ok(word as i16)
}

/// The outcome of reading an operand: the assembled value, and whether it
/// turned out to be the undefined-variable encoding (needed by ABS/NEG,
/// which still perform their side effect after an undefined-variable trap
/// fires — §4.C, §7).
pub struct ReadOutcome {
    pub value: Number,
    pub undefined_variable: bool,
}

/// Reads a `precision_words`-word operand from `operand`. For memory
/// operands this issues one `read_word` per word, most significant first;
/// for accumulators it is a direct register read (never an addressing
/// fault, but still subject to the undefined-variable check).
pub fn read_operand(
    operand: Operand,
    precision_words: usize,
    accumulators: &crate::fpp::status::AccumulatorFile,
    bus: &mut impl AddressSpace,
) -> Result<ReadOutcome, Fault> {
    let value = match operand {
        Operand::Accumulator(idx) => accumulators
            .read(idx)
            .expect("resolve() only returns accumulators 0..=5"),
        Operand::Memory(addr) => {
            let mut value = [0u16; 4];
            for i in 0..precision_words {
                value[i] = bus.read_word(addr.wrapping_add(2 * i as u32))?;
            }
            value
        }
        Operand::Immediate(addr) => {
            let mut value = [0u16; 4];
            value[0] = bus.read_word(addr)?;
            value
        }
    };
    Ok(ReadOutcome {
        undefined_variable: is_undefined_variable(&value),
        value,
    })
}

/// Checks the undefined-variable trap for a just-read operand and, if
/// FIUV is enabled and the encoding is present, raises it. Returns whether
/// the trap fired, distinct from `ReadOutcome::undefined_variable` because
/// callers need to know both ("is it UV" for ABS/NEG's post-execution
/// semantics, and "did the trap actually fire" for ordinary reads).
pub fn check_undefined_variable(outcome: &ReadOutcome, fps: &Fps) -> Option<Trap> {
    if outcome.undefined_variable && fps.fiuv() {
        Some(Trap::UndefinedVariable)
    } else {
        None
    }
}

/// Writes a `precision_words`-word value back to `operand`.
pub fn write_operand(
    operand: Operand,
    value: Number,
    precision_words: usize,
    accumulators: &mut crate::fpp::status::AccumulatorFile,
    bus: &mut impl AddressSpace,
) -> Result<(), Fault> {
    match operand {
        Operand::Accumulator(idx) => {
            accumulators
                .write(idx, value)
                .expect("resolve() only returns accumulators 0..=5");
        }
        Operand::Memory(addr) => {
            for i in 0..precision_words {
                bus.write_word(addr.wrapping_add(2 * i as u32), value[i])?;
            }
        }
        Operand::Immediate(addr) => {
            bus.write_word(addr, value[0])?;
        }
    }
    Ok(())
}

/// Convenience used by instructions that only ever name a destination
/// accumulator (register mode only — MULF/ADDF/etc name the AC as the
/// second operand and "AC" bits, not a general addressing mode).
pub fn accumulator_operand(ac: u8) -> Result<Operand, Trap> {
    if ac <= 5 {
        Ok(Operand::Accumulator(ac))
    } else {
        Err(Trap::IllegalOpcode)
    }
}
