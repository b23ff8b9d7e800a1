//! Instruction dispatch and decode (component F): the single entry point
//! the CPU calls once it has recognized an FPP opcode (§4.F, §6).
//!
//! Decode layout: bits 11–8 select the operation family (the table in
//! §4.F), bits 7–6 are the two-bit AC field reaching AC0–AC3 as the
//! implicit accumulator operand, and bits 5–0 are a PDP-11 addressing mode
//! for the explicit operand — which, via mode-0 register addressing,
//! reaches AC0–AC5 (matching the data model's claim that AC4/AC5 are only
//! reachable as that operand, not as the AC field).

use crate::common::{Fault, Trap};
use crate::fpp::addressing::{
    accumulator_operand, check_undefined_variable, read_operand, resolve, write_operand,
    AddressSpace, AddressingError, Operand, ReadOutcome, PC,
};
use crate::fpp::arithmetic::Arithmetic;
use crate::fpp::conversion::Conversion;
use crate::fpp::status::{exponent_of, Number, CANONICAL_ZERO};
use crate::fpp::Fpp;

fn family(instruction: u16) -> u16 {
    (instruction >> 8) & 0xF
}

fn ac_field(instruction: u16) -> u8 {
    ((instruction >> 6) & 0x3) as u8
}

fn low6(instruction: u16) -> u8 {
    (instruction & 0x3F) as u8
}

fn is_immediate(mode_bits: u8) -> bool {
    let mode = (mode_bits >> 3) & 0x7;
    let reg = mode_bits & 0x7;
    mode == 2 && reg == PC
}

fn raise_trap(fpp: &mut Fpp, bus: &mut impl AddressSpace, backup_pc: u32, trap: Trap) {
    fpp.fps.set_fer(true);
    fpp.fec = trap.fec();
    fpp.fea = backup_pc.wrapping_sub(2);
    if !fpp.fps.fid() {
        bus.raise_trap_mask(3);
    }
}

/// Resolves an addressing mode, splitting the two ways that can fail: an
/// architectural trap (e.g. a register-mode operand naming AC6/AC7) is
/// latched into FPS/FEC/FEA right here and reported as `Ok(None)` — nothing
/// left for the caller to do but skip the rest of the instruction — while a
/// collaborator memory fault (a deferred-pointer or index-extension-word
/// read that fails, modes 3/5/6/7) propagates untouched as `Err`, aborting
/// the instruction with FPS unchanged (§4.C, §7).
fn resolve_or_trap(
    fpp: &mut Fpp,
    bus: &mut impl AddressSpace,
    backup_pc: u32,
    low6_bits: u8,
    operand_bytes: u8,
) -> Result<Option<Operand>, Fault> {
    match resolve(low6_bits, operand_bytes, bus) {
        Ok(operand) => Ok(Some(operand)),
        Err(AddressingError::Trap(trap)) => {
            raise_trap(fpp, bus, backup_pc, trap);
            Ok(None)
        }
        Err(AddressingError::Fault(fault)) => Err(fault),
    }
}

/// Resolves and reads the explicit operand named by `low6`, without
/// checking the undefined-variable trap — callers that need the trap to
/// fire *before* using the value should call [`fetch_operand`] instead;
/// ABS/NEG call this directly and raise the trap themselves after their
/// side effect has run (§7).
fn fetch_operand_raw(
    fpp: &mut Fpp,
    bus: &mut impl AddressSpace,
    backup_pc: u32,
    low6_bits: u8,
) -> Result<Result<(Operand, Number, bool), ()>, Fault> {
    let p = fpp.fps.precision_words();
    let operand_bytes = if fpp.fps.double_mode() { 8 } else { 4 };
    let operand = match resolve_or_trap(fpp, bus, backup_pc, low6_bits, operand_bytes)? {
        Some(operand) => operand,
        None => return Ok(Err(())),
    };
    let outcome = read_operand(operand, p, &fpp.acc, bus)?;
    Ok(Ok((operand, outcome.value, outcome.undefined_variable)))
}

/// Resolves and reads the explicit operand named by `low6`, checking (and,
/// if FIUV is set, raising) the undefined-variable trap on the way, before
/// the value is used. Every family except ABS/NEG wants this ordering
/// (§7: "on all other operand reads they fire before").
fn fetch_operand(
    fpp: &mut Fpp,
    bus: &mut impl AddressSpace,
    backup_pc: u32,
    low6_bits: u8,
) -> Result<Result<(Operand, Number, bool), ()>, Fault> {
    match fetch_operand_raw(fpp, bus, backup_pc, low6_bits)? {
        Err(()) => Ok(Err(())),
        Ok((operand, value, undefined_variable)) => {
            let outcome = ReadOutcome { value, undefined_variable };
            if let Some(trap) = check_undefined_variable(&outcome, &fpp.fps) {
                // Fires before the value is used (§7): the trap is latched
                // into FPS/FEC/FEA/trap_mask same as any other architectural
                // trap, but the instruction commits nothing — unlike
                // ABS/NEG, which call `fetch_operand_raw` directly so their
                // post-execution side effect still runs.
                raise_trap(fpp, bus, backup_pc, trap);
                return Ok(Err(()));
            }
            Ok(Ok((operand, outcome.value, outcome.undefined_variable)))
        }
    }
}

fn commit(
    fpp: &mut Fpp,
    bus: &mut impl AddressSpace,
    ac: u8,
    value: Number,
    trap: Option<Trap>,
    backup_pc: u32,
) -> Result<(), Fault> {
    if let Some(trap) = trap {
        raise_trap(fpp, bus, backup_pc, trap);
    }
    let dest = accumulator_operand(ac).map_err(|_| Fault::BadAddress(backup_pc))?;
    let p = fpp.fps.precision_words();
    write_operand(dest, value, p, &mut fpp.acc, bus)
}

/// The FPP's entry point, called by the CPU once it has recognized bits
/// 15–12 of `instruction` as the FPP opcode family (§6).
pub fn execute_fpp(fpp: &mut Fpp, instruction: u16, bus: &mut impl AddressSpace) -> Result<(), Fault> {
    let backup_pc = bus.gpr(PC);
    let fam = family(instruction);
    let ac = ac_field(instruction);
    let low = low6(instruction);
    let p = fpp.fps.precision_words();

    if fpp.trace {
        eprintln!("fpp: pc={:#o} instr={:#06o} family={:#x} ac={}", backup_pc, instruction, fam, ac);
    }

    match fam {
        0x0 => match ac {
            0 => match low {
                0 => bus.set_cpu_flags(fpp.fps.condition_code_nibble()), // CFCC
                1 => fpp.fps.set_double_mode(false),                     // SETF
                2 => fpp.fps.set_long_mode(false),                       // SETI
                9 => fpp.fps.set_double_mode(true),                      // SETD
                10 => fpp.fps.set_long_mode(true),                       // SETL
                _ => raise_trap(fpp, bus, backup_pc, Trap::IllegalOpcode),
            },
            1 => {
                // LDFPS
                if let Some(operand) = resolve_or_trap(fpp, bus, backup_pc, low, 2)? {
                    if let Operand::Memory(addr) | Operand::Immediate(addr) = operand {
                        fpp.fps.0 = bus.read_word(addr)?;
                    } else {
                        raise_trap(fpp, bus, backup_pc, Trap::IllegalOpcode);
                    }
                }
            }
            2 => {
                // STFPS
                if let Some(operand) = resolve_or_trap(fpp, bus, backup_pc, low, 2)? {
                    if let Operand::Memory(addr) | Operand::Immediate(addr) = operand {
                        bus.write_word(addr, fpp.fps.raw())?;
                    } else {
                        raise_trap(fpp, bus, backup_pc, Trap::IllegalOpcode);
                    }
                }
            }
            3 => {
                // STST
                if let Some(operand) = resolve_or_trap(fpp, bus, backup_pc, low, 4)? {
                    if let Operand::Memory(addr) | Operand::Immediate(addr) = operand {
                        bus.write_word(addr, fpp.fec)?;
                        bus.write_word(addr.wrapping_add(2), fpp.fea as u16)?;
                    } else {
                        raise_trap(fpp, bus, backup_pc, Trap::IllegalOpcode);
                    }
                }
            }
            _ => unreachable!("ac_field is masked to 2 bits"),
        },

        0x1 => {
            // CLRF/TSTF/ABSF/NEGF: single-operand, addressed via low6.
            // ABS/NEG (ac 2/3) still perform their side effect on an
            // undefined-variable operand, so they fetch without the
            // premature trap check and raise it themselves afterward.
            let fetched = if ac == 2 || ac == 3 {
                fetch_operand_raw(fpp, bus, backup_pc, low)?
            } else {
                fetch_operand(fpp, bus, backup_pc, low)?
            };
            match fetched {
                Err(()) => {}
                Ok((operand, value, was_undefined)) => {
                    let result = match ac {
                        0 => CANONICAL_ZERO, // CLRF
                        1 => {
                            fpp.fps.set_negative(crate::fpp::status::sign_of(&value));
                            fpp.fps.set_zero(crate::fpp::status::has_zero_exponent(&value));
                            value // TSTF: no write-back needed, but harmless
                        }
                        2 => {
                            let mut abs = value;
                            abs[0] &= 0x7FFF;
                            abs // ABSF
                        }
                        3 => {
                            let mut neg = value;
                            neg[0] ^= 0x8000;
                            neg // NEGF
                        }
                        _ => unreachable!(),
                    };
                    if ac != 1 {
                        write_operand(operand, result, p, &mut fpp.acc, bus)?;
                    }
                    if was_undefined && fpp.fps.fiuv() && (ac == 2 || ac == 3) {
                        raise_trap(fpp, bus, backup_pc, Trap::UndefinedVariable);
                    }
                }
            }
        }

        0x2 => dual_operand(fpp, bus, backup_pc, low, ac, Arithmetic::mul)?, // MULF
        0x3 => {
            // MODF: odd AC discards the integer part; even AC writes it to AC+1.
            match fetch_operand(fpp, bus, backup_pc, low)? {
                Err(()) => {}
                Ok((_, source, _)) => {
                    let dest_value = fpp.acc.read(ac).unwrap_or(CANONICAL_ZERO);
                    let mut whole = CANONICAL_ZERO;
                    let (frac, trap) = Arithmetic::modf(
                        &dest_value,
                        &source,
                        &mut fpp.fps,
                        Some(&mut whole),
                    );
                    if ac % 2 == 0 && ac as usize + 1 < 6 {
                        let _ = fpp.acc.write(ac + 1, whole);
                    }
                    commit(fpp, bus, ac, frac, trap, backup_pc)?;
                }
            }
        }
        0x4 => dual_operand(fpp, bus, backup_pc, low, ac, Arithmetic::add)?, // ADDF
        0x5 => {
            // LDF: straight load into AC.
            match fetch_operand(fpp, bus, backup_pc, low)? {
                Err(()) => {}
                Ok((_, value, _)) => {
                    fpp.fps.set_negative(crate::fpp::status::sign_of(&value));
                    fpp.fps.set_zero(crate::fpp::status::has_zero_exponent(&value));
                    commit(fpp, bus, ac, value, None, backup_pc)?;
                }
            }
        }
        0x6 => dual_operand(fpp, bus, backup_pc, low, ac, Arithmetic::sub)?, // SUBF
        0x7 => {
            // CMPF: operand − AC sets N/Z only; nothing is written back.
            match fetch_operand(fpp, bus, backup_pc, low)? {
                Err(()) => {}
                Ok((_, source, _)) => {
                    let dest_value = fpp.acc.read(ac).unwrap_or(CANONICAL_ZERO);
                    let (_, trap) = Arithmetic::sub(&source, &dest_value, &mut fpp.fps);
                    if let Some(trap) = trap {
                        raise_trap(fpp, bus, backup_pc, trap);
                    }
                }
            }
        }
        0x8 => {
            // STF: write AC to the addressed destination.
            let value = fpp.acc.read(ac).unwrap_or(CANONICAL_ZERO);
            let operand_bytes = if fpp.fps.double_mode() { 8 } else { 4 };
            if let Some(operand) = resolve_or_trap(fpp, bus, backup_pc, low, operand_bytes)? {
                write_operand(operand, value, p, &mut fpp.acc, bus)?;
            }
        }
        0x9 => dual_operand(fpp, bus, backup_pc, low, ac, Arithmetic::div)?, // DIVF
        0xA => {
            // STEXP: store the unbiased exponent as a 16-bit integer.
            let value = fpp.acc.read(ac).unwrap_or(CANONICAL_ZERO);
            let unbiased = exponent_of(&value) as i32 - crate::fpp::pack::BIAS;
            fpp.fps.set_negative(unbiased < 0);
            fpp.fps.set_zero(unbiased == 0);
            match resolve_or_trap(fpp, bus, backup_pc, low, 2)? {
                Some(Operand::Memory(addr)) | Some(Operand::Immediate(addr)) => {
                    bus.write_word(addr, unbiased as u16)?
                }
                Some(Operand::Accumulator(_)) => raise_trap(fpp, bus, backup_pc, Trap::IllegalOpcode),
                None => {}
            }
        }
        0xB => {
            // STCFI: AC -> integer, written to the addressed destination.
            let value = fpp.acc.read(ac).unwrap_or(CANONICAL_ZERO);
            let long = fpp.fps.long_mode() && !is_immediate(low);
            let (result, trap) = Conversion::stcfi(&value, long, &mut fpp.fps);
            bus.set_cpu_flags(fpp.fps.condition_code_nibble());
            if let Some(trap) = trap {
                raise_trap(fpp, bus, backup_pc, trap);
            }
            match resolve_or_trap(fpp, bus, backup_pc, low, if long { 4 } else { 2 })? {
                Some(Operand::Memory(addr)) | Some(Operand::Immediate(addr)) => {
                    if long {
                        bus.write_word(addr, (result >> 16) as u16)?;
                        bus.write_word(addr.wrapping_add(2), result as u16)?;
                    } else {
                        bus.write_word(addr, result as u16)?;
                    }
                }
                Some(Operand::Accumulator(_)) => raise_trap(fpp, bus, backup_pc, Trap::IllegalOpcode),
                None => {}
            }
        }
        0xC => {
            // STCFD: AC (double-resident) -> float-width destination.
            let value = fpp.acc.read(ac).unwrap_or(CANONICAL_ZERO);
            let narrowed = Conversion::narrow_to_float(&value, &mut fpp.fps);
            if let Some(operand) = resolve_or_trap(fpp, bus, backup_pc, low, 4)? {
                write_operand(operand, narrowed, 2, &mut fpp.acc, bus)?;
            }
        }
        0xD => {
            // LDEXP: argument fetched as a signed 16-bit integer.
            if let Some(operand) = resolve_or_trap(fpp, bus, backup_pc, low, 2)? {
                let delta = match operand {
                    Operand::Memory(addr) | Operand::Immediate(addr) => bus.read_word(addr)? as i16,
                    Operand::Accumulator(idx) => {
                        let reg = fpp.acc.read(idx).unwrap_or(CANONICAL_ZERO);
                        reg[0] as i16
                    }
                };
                let value = fpp.acc.read(ac).unwrap_or(CANONICAL_ZERO);
                let (result, trap) = Arithmetic::ldexp(&value, delta, &mut fpp.fps);
                commit(fpp, bus, ac, result, trap, backup_pc)?;
            }
        }
        0xE => {
            // LDCIF: integer -> float.
            let long = fpp.fps.long_mode() && !is_immediate(low);
            if let Some(operand) =
                resolve_or_trap(fpp, bus, backup_pc, low, if long { 4 } else { 2 })?
            {
                let value = match operand {
                    Operand::Memory(addr) if long => {
                        let hi = bus.read_word(addr)? as u32;
                        let lo = bus.read_word(addr.wrapping_add(2))? as u32;
                        ((hi << 16) | lo) as i32
                    }
                    Operand::Memory(addr) => bus.read_word(addr)? as i16 as i32,
                    Operand::Immediate(addr) => bus.read_word(addr)? as i16 as i32,
                    Operand::Accumulator(idx) => {
                        let reg = fpp.acc.read(idx).unwrap_or(CANONICAL_ZERO);
                        reg[0] as i16 as i32
                    }
                };
                let (result, trap) = Conversion::ldcif(value, &mut fpp.fps);
                commit(fpp, bus, ac, result, trap, backup_pc)?;
            }
        }
        0xF => {
            // LDCDF: float-width source -> AC widened to double.
            match fetch_operand(fpp, bus, backup_pc, low)? {
                Err(()) => {}
                Ok((_, value, _)) => {
                    let widened = Conversion::widen_to_double(&value);
                    commit(fpp, bus, ac, widened, None, backup_pc)?;
                }
            }
        }
        _ => unreachable!("family is masked to 4 bits"),
    }

    Ok(())
}

/// Shared shape for the dual-operand families (MULF/ADDF/SUBF/DIVF): fetch
/// the explicit operand, apply `kernel` against the AC, write back.
fn dual_operand(
    fpp: &mut Fpp,
    bus: &mut impl AddressSpace,
    backup_pc: u32,
    low_bits: u8,
    ac: u8,
    kernel: fn(&Number, &Number, &mut crate::fpp::status::Fps) -> (Number, Option<Trap>),
) -> Result<(), Fault> {
    match fetch_operand(fpp, bus, backup_pc, low_bits)? {
        Err(()) => Ok(()),
        Ok((_, source, _)) => {
            let dest_value = fpp.acc.read(ac).unwrap_or(CANONICAL_ZERO);
            let (result, trap) = kernel(&dest_value, &source, &mut fpp.fps);
            commit(fpp, bus, ac, result, trap, backup_pc)
        }
    }
}
