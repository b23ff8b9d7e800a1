//! Trap/Fault classification: the FEC encoding and maskability rules that
//! the dispatch and pack/unpack logic both depend on.

use fp11_fpp::common::{AccessType, Fault, Trap};

#[test]
fn trap_fec_values_match_the_architectural_encoding() {
    assert_eq!(Trap::IllegalOpcode.fec(), 2);
    assert_eq!(Trap::DivideByZero.fec(), 4);
    assert_eq!(Trap::IntegerConversionOverflow.fec(), 6);
    assert_eq!(Trap::Overflow.fec(), 8);
    assert_eq!(Trap::Underflow.fec(), 10);
    assert_eq!(Trap::UndefinedVariable.fec(), 12);
    assert_eq!(Trap::Maintenance.fec(), 14);
}

#[test]
fn only_illegal_opcode_and_divide_by_zero_ignore_individual_masks() {
    assert!(!Trap::IllegalOpcode.individually_maskable());
    assert!(!Trap::DivideByZero.individually_maskable());
    assert!(Trap::IntegerConversionOverflow.individually_maskable());
    assert!(Trap::Overflow.individually_maskable());
    assert!(Trap::Underflow.individually_maskable());
    assert!(Trap::UndefinedVariable.individually_maskable());
    assert!(Trap::Maintenance.individually_maskable());
}

#[test]
fn fault_carries_the_offending_address() {
    let fault = Fault::BadAddress(0o177776);
    assert_eq!(fault, Fault::BadAddress(0o177776));
    assert_ne!(fault, Fault::BadAddress(0));
}

#[test]
fn access_type_distinguishes_read_from_write() {
    assert_ne!(AccessType::Read, AccessType::Write);
}
