//! Instruction-family dispatch behavior not already covered by
//! `fpu_tests.rs`'s numeric scenarios: mode toggles, illegal encodings,
//! and the ABS/NEG undefined-variable write-back exception.

use fp11_fpp::common::Trap;
use fp11_fpp::fpp::{execute_fpp, AddressSpace, Fpp};
use fp11_fpp::sim::FlatBus;

fn instr(family: u16, ac: u8, low6: u8) -> u16 {
    (family << 8) | ((ac as u16) << 6) | (low6 as u16 & 0x3F)
}

fn reg_mode(reg: u8) -> u8 {
    reg & 0x7
}

fn deferred_mode(reg: u8) -> u8 {
    0o10 | (reg & 0x7)
}

#[test]
fn setd_and_setf_toggle_double_mode() {
    let mut fpp = Fpp::new();
    let mut bus = FlatBus::new();
    assert!(!fpp.fps.double_mode());

    execute_fpp(&mut fpp, instr(0x0, 0, 0o11), &mut bus).unwrap(); // SETD
    assert!(fpp.fps.double_mode());

    execute_fpp(&mut fpp, instr(0x0, 0, 0o1), &mut bus).unwrap(); // SETF
    assert!(!fpp.fps.double_mode());
}

#[test]
fn setl_and_seti_toggle_long_mode() {
    let mut fpp = Fpp::new();
    let mut bus = FlatBus::new();
    assert!(!fpp.fps.long_mode());

    execute_fpp(&mut fpp, instr(0x0, 0, 0o12), &mut bus).unwrap(); // SETL
    assert!(fpp.fps.long_mode());

    execute_fpp(&mut fpp, instr(0x0, 0, 0o2), &mut bus).unwrap(); // SETI
    assert!(!fpp.fps.long_mode());
}

#[test]
fn cfcc_copies_condition_codes_into_cpu_flags() {
    let mut fpp = Fpp::new();
    fpp.fps.set_negative(true);
    fpp.fps.set_carry(true);
    let mut bus = FlatBus::new();

    execute_fpp(&mut fpp, instr(0x0, 0, 0), &mut bus).unwrap(); // CFCC
    assert_eq!(bus.cpu_flags, fpp.fps.condition_code_nibble());
    assert_eq!(bus.cpu_flags & 0b1001, 0b1001); // N and C set, Z and V clear
}

#[test]
fn unrecognized_family_zero_subop_is_illegal_opcode() {
    let mut fpp = Fpp::new();
    let mut bus = FlatBus::new();
    execute_fpp(&mut fpp, instr(0x0, 0, 0o77), &mut bus).unwrap();
    assert!(fpp.fps.fer());
    assert_eq!(fpp.fec, Trap::IllegalOpcode.fec());
}

#[test]
fn clrf_zeroes_the_addressed_accumulator() {
    let mut fpp = Fpp::new();
    fpp.acc.write(3, [0x4160, 0x1234, 0, 0]).unwrap();
    let mut bus = FlatBus::new();
    execute_fpp(&mut fpp, instr(0x1, 0, reg_mode(3)), &mut bus).unwrap(); // CLRF AC3
    assert_eq!(fpp.acc.read(3).unwrap(), [0, 0, 0, 0]);
    assert!(fpp.fps.zero());
}

#[test]
fn tstf_sets_condition_codes_without_writing_back() {
    let mut fpp = Fpp::new();
    let value = [0xC160, 0, 0, 0]; // negative, non-zero
    fpp.acc.write(1, value).unwrap();
    let mut bus = FlatBus::new();
    execute_fpp(&mut fpp, instr(0x1, 1, reg_mode(1)), &mut bus).unwrap(); // TSTF AC1
    assert!(fpp.fps.negative());
    assert!(!fpp.fps.zero());
    assert_eq!(fpp.acc.read(1).unwrap(), value);
}

#[test]
fn absf_clears_the_sign_bit() {
    let mut fpp = Fpp::new();
    fpp.acc.write(2, [0xC160, 0, 0, 0]).unwrap();
    let mut bus = FlatBus::new();
    execute_fpp(&mut fpp, instr(0x1, 2, reg_mode(2)), &mut bus).unwrap(); // ABSF AC2
    assert_eq!(fpp.acc.read(2).unwrap(), [0x4160, 0, 0, 0]);
}

#[test]
fn negf_flips_the_sign_bit() {
    let mut fpp = Fpp::new();
    fpp.acc.write(2, [0x4160, 0, 0, 0]).unwrap();
    let mut bus = FlatBus::new();
    execute_fpp(&mut fpp, instr(0x1, 3, reg_mode(2)), &mut bus).unwrap(); // NEGF AC2
    assert_eq!(fpp.acc.read(2).unwrap(), [0xC160, 0, 0, 0]);
}

#[test]
fn absf_on_an_undefined_variable_still_writes_back_before_trapping() {
    // ABS/NEG are the documented exception (§7): the side effect commits,
    // then the undefined-variable trap fires — unlike every other family,
    // which discards the value entirely.
    let mut fpp = Fpp::new();
    fpp.fps.set_fiuv(true);
    let mut bus = FlatBus::new();
    bus.set_gpr(1, 0o2000);
    bus.write_word(0o2000, 0x8000).unwrap(); // UV encoding, sign already set

    execute_fpp(&mut fpp, instr(0x1, 2, deferred_mode(1)), &mut bus).unwrap(); // ABSF (R1)
    assert!(fpp.fps.fer());
    assert_eq!(fpp.fec, Trap::UndefinedVariable.fec());
    assert_eq!(bus.read_word(0o2000).unwrap(), 0x0000, "ABS still clears the sign bit first");
}

#[test]
fn modf_on_an_even_accumulator_routes_the_integer_part_to_its_successor() {
    // MODF AC2,AC0: 1.5 * 7.0 = 10.5, so AC0 (even) ends up with the
    // fractional half and its successor AC1 receives the integer half.
    let mut fpp = Fpp::new();
    fpp.fps.set_double_mode(true);
    let one_point_five: [u16; 4] = [(128u16 << 7) | 0x40, 0, 0, 0];
    let seven: [u16; 4] = [0x4160, 0, 0, 0];
    fpp.acc.write(0, one_point_five).unwrap();
    fpp.acc.write(1, [0x1234, 0, 0, 0]).unwrap(); // must be overwritten by the integer half
    fpp.acc.write(2, seven).unwrap();
    let mut bus = FlatBus::new();

    execute_fpp(&mut fpp, instr(0x3, 0, reg_mode(2)), &mut bus).unwrap(); // MODF AC2,AC0
    assert!(!fpp.fps.fer());
    assert_ne!(fpp.acc.read(1).unwrap(), [0x1234, 0, 0, 0]);
    assert_ne!(fpp.acc.read(1).unwrap(), [0, 0, 0, 0], "integer part of 10.5 is nonzero");
}

#[test]
fn modf_on_an_odd_accumulator_does_not_touch_any_sibling() {
    let mut fpp = Fpp::new();
    fpp.fps.set_double_mode(true);
    let one_point_five: [u16; 4] = [(128u16 << 7) | 0x40, 0, 0, 0];
    let seven: [u16; 4] = [0x4160, 0, 0, 0];
    fpp.acc.write(1, one_point_five).unwrap();
    fpp.acc.write(0, [0x1234, 0, 0, 0]).unwrap();
    fpp.acc.write(2, seven).unwrap();
    let mut bus = FlatBus::new();

    execute_fpp(&mut fpp, instr(0x3, 1, reg_mode(2)), &mut bus).unwrap(); // MODF AC2,AC1
    assert!(!fpp.fps.fer());
    assert_eq!(fpp.acc.read(0).unwrap(), [0x1234, 0, 0, 0], "AC1 is odd: no sibling write");
}
