//! Operand addressing mode coverage, exercised directly against the
//! `resolve`/`read_operand`/`write_operand` trio rather than through a
//! full instruction dispatch.

use fp11_fpp::common::Trap;
use fp11_fpp::fpp::addressing::{
    accumulator_operand, read_operand, resolve, write_operand, AddressingError, Operand,
};
use fp11_fpp::fpp::status::AccumulatorFile;
use fp11_fpp::fpp::AddressSpace;
use fp11_fpp::sim::FlatBus;

fn mode(m: u8, reg: u8) -> u8 {
    (m << 3) | (reg & 0x7)
}

#[test]
fn register_mode_names_an_accumulator() {
    let mut bus = FlatBus::new();
    let operand = resolve(mode(0, 3), 8, &mut bus).unwrap();
    assert_eq!(operand, Operand::Accumulator(3));
}

#[test]
fn register_mode_ac6_and_ac7_are_illegal() {
    let mut bus = FlatBus::new();
    assert_eq!(
        resolve(mode(0, 6), 8, &mut bus),
        Err(AddressingError::Trap(Trap::IllegalOpcode))
    );
    assert_eq!(
        resolve(mode(0, 7), 8, &mut bus),
        Err(AddressingError::Trap(Trap::IllegalOpcode))
    );
}

#[test]
fn autoincrement_advances_by_the_operand_width() {
    let mut bus = FlatBus::new();
    bus.set_gpr(2, 0o1000);
    let operand = resolve(mode(2, 2), 8, &mut bus).unwrap();
    assert_eq!(operand, Operand::Memory(0o1000));
    assert_eq!(bus.gpr(2), 0o1000 + 8);
}

#[test]
fn autoincrement_on_pc_always_steps_by_two_and_yields_immediate() {
    let mut bus = FlatBus::new();
    bus.set_gpr(7, 0o2000);
    let operand = resolve(mode(2, 7), 8, &mut bus).unwrap();
    assert_eq!(operand, Operand::Immediate(0o2000));
    assert_eq!(bus.gpr(7), 0o2002);
}

#[test]
fn autodecrement_subtracts_before_resolving() {
    let mut bus = FlatBus::new();
    bus.set_gpr(3, 0o1010);
    let operand = resolve(mode(4, 3), 4, &mut bus).unwrap();
    assert_eq!(operand, Operand::Memory(0o1010 - 4));
    assert_eq!(bus.gpr(3), 0o1010 - 4);
}

#[test]
fn autoincrement_deferred_reads_a_pointer_then_steps_by_two() {
    let mut bus = FlatBus::new();
    bus.set_gpr(4, 0o1000);
    bus.write_word(0o1000, 0o2000).unwrap();
    let operand = resolve(mode(3, 4), 8, &mut bus).unwrap();
    assert_eq!(operand, Operand::Memory(0o2000));
    assert_eq!(bus.gpr(4), 0o1002);
}

#[test]
fn autodecrement_deferred_steps_by_two_before_the_pointer_read() {
    let mut bus = FlatBus::new();
    bus.set_gpr(5, 0o1002);
    bus.write_word(0o1000, 0o3000).unwrap();
    let operand = resolve(mode(5, 5), 8, &mut bus).unwrap();
    assert_eq!(operand, Operand::Memory(0o3000));
    assert_eq!(bus.gpr(5), 0o1000);
}

#[test]
fn indexed_mode_adds_the_extension_word_to_the_base_register() {
    let mut bus = FlatBus::new();
    bus.set_gpr(7, 0o1000); // PC, pointing at the index extension word
    bus.write_word(0o1000, 0o100);
    bus.set_gpr(1, 0o2000);
    let operand = resolve(mode(6, 1), 8, &mut bus).unwrap();
    assert_eq!(operand, Operand::Memory(0o2000 + 0o100));
    // the index extension word is consumed from PC, advancing it
    assert_eq!(bus.gpr(7), 0o1002);
}

#[test]
fn indexed_deferred_mode_reads_a_pointer_at_the_indexed_address() {
    let mut bus = FlatBus::new();
    bus.set_gpr(7, 0o1000);
    bus.write_word(0o1000, 0o10);
    bus.set_gpr(1, 0o2000);
    bus.write_word(0o2010, 0o4000);
    let operand = resolve(mode(7, 1), 8, &mut bus).unwrap();
    assert_eq!(operand, Operand::Memory(0o4000));
}

#[test]
fn memory_operand_reads_words_most_significant_first() {
    let mut bus = FlatBus::new();
    bus.write_word(0o1000, 0x1111).unwrap();
    bus.write_word(0o1002, 0x2222).unwrap();
    bus.write_word(0o1004, 0x3333).unwrap();
    bus.write_word(0o1006, 0x4444).unwrap();
    let acc = AccumulatorFile::new();
    let outcome = read_operand(Operand::Memory(0o1000), 4, &acc, &mut bus).unwrap();
    assert_eq!(outcome.value, [0x1111, 0x2222, 0x3333, 0x4444]);
}

#[test]
fn immediate_operand_only_ever_reads_one_word() {
    let mut bus = FlatBus::new();
    bus.write_word(0o1000, 0x4160).unwrap();
    bus.write_word(0o1002, 0xBEEF).unwrap(); // must not leak into the value
    let acc = AccumulatorFile::new();
    let outcome = read_operand(Operand::Immediate(0o1000), 4, &acc, &mut bus).unwrap();
    assert_eq!(outcome.value, [0x4160, 0, 0, 0]);
}

#[test]
fn immediate_operand_write_only_touches_one_word() {
    let mut bus = FlatBus::new();
    bus.write_word(0o1002, 0xBEEF).unwrap();
    let mut acc = AccumulatorFile::new();
    write_operand(Operand::Immediate(0o1000), [0x1234, 0x5678, 0, 0], 4, &mut acc, &mut bus).unwrap();
    assert_eq!(bus.read_word(0o1000).unwrap(), 0x1234);
    assert_eq!(bus.read_word(0o1002).unwrap(), 0xBEEF, "neighbouring word must be untouched");
}

#[test]
fn accumulator_operand_rejects_ac6_and_ac7() {
    assert_eq!(accumulator_operand(5), Ok(Operand::Accumulator(5)));
    assert_eq!(accumulator_operand(6), Err(Trap::IllegalOpcode));
    assert_eq!(accumulator_operand(7), Err(Trap::IllegalOpcode));
}

#[test]
fn read_operand_from_an_accumulator_is_a_direct_register_read() {
    let mut acc = AccumulatorFile::new();
    acc.write(2, [0x4160, 0, 0, 0]).unwrap();
    let mut bus = FlatBus::new();
    let outcome = read_operand(Operand::Accumulator(2), 4, &acc, &mut bus).unwrap();
    assert_eq!(outcome.value, [0x4160, 0, 0, 0]);
    assert!(!outcome.undefined_variable);
}
