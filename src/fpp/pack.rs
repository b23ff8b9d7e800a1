//! Pack/unpack (component B).
//!
//! `pack` is the single chokepoint through which every arithmetic and
//! conversion kernel commits a result: it applies the underflow/overflow
//! policy of §4.B and derives the N/Z condition codes from whatever ends up
//! actually stored. V is touched only on the overflow path, matching the
//! spec's own bullet list — pack never claims ownership of the carry flag,
//! since nothing in §4.B ever assigns it one.

use crate::common::Trap;
use crate::fpp::status::{frac0_bits, Fps, Number};

/// The FP11 exponent bias (the implementation constant referenced by
/// `ldexp`'s "add bias" and by every kernel's "− bias"/"+ bias" term).
pub const BIAS: i32 = 128;

/// Packs a result into a `Number`. `frac` must already contain the raw
/// fraction in words 1.. plus the hidden-bit-inclusive top byte in the low
/// 8 bits of word 0 (bits 15..8 of word 0 are ignored and overwritten).
/// `exp` is the fully resolved (unbiased-then-adjusted) exponent to store.
/// Returns the trap raised, if any — the caller still receives the
/// (possibly trapped) `Number` to commit, per §7's "in-progress result is
/// still committed" rule.
pub fn pack(frac: &Number, exp: i32, sign: bool, fps: &mut Fps) -> (Number, Option<Trap>) {
    let mut out = *frac;
    let mut trap = None;

    if exp <= 0 {
        let stored_exp = (exp & 0xFF) as u16;
        if fps.fiu() {
            store_word0(&mut out, sign, stored_exp, frac0_bits(frac));
            trap = Some(Trap::Underflow);
        } else {
            out = [0, 0, 0, 0];
        }
    } else if exp >= 256 {
        let stored_exp = (exp & 0xFF) as u16;
        if fps.fiv() {
            store_word0(&mut out, sign, stored_exp, frac0_bits(frac));
            trap = Some(Trap::Overflow);
        } else {
            out = [0, 0, 0, 0];
        }
        fps.set_overflow(true);
    } else {
        store_word0(&mut out, sign, exp as u16, frac0_bits(frac));
    }

    let final_sign = out[0] & 0x8000 != 0;
    let final_exp_zero = (out[0] & 0x7F80) == 0;
    fps.set_negative(final_sign);
    fps.set_zero(final_exp_zero);

    (out, trap)
}

fn store_word0(out: &mut Number, sign: bool, exp: u16, frac0: u16) {
    out[0] = ((sign as u16) << 15) | ((exp & 0xFF) << 7) | (frac0 & 0x7F);
}

/// The `ldexp` primitive (§4.B): treats `delta` as a signed exponent offset,
/// exposes the hidden bit of `n`'s current (assumed normalized, non-zero)
/// fraction, combines the offset with the bias, and re-packs.
pub fn ldexp(n: &Number, delta: i16, fps: &mut Fps) -> (Number, Option<Trap>) {
    let sign = crate::fpp::status::sign_of(n);
    let mut frac = *n;
    if crate::fpp::status::has_zero_exponent(n) {
        return (crate::fpp::status::CANONICAL_ZERO, None);
    }
    frac[0] = (frac[0] & 0x7F) | 0x80; // expose hidden bit
    let new_exp = BIAS + delta as i32;
    pack(&frac, new_exp, sign, fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_normal_sets_n_and_z() {
        let mut fps = Fps::default();
        let (out, trap) = pack(&[0x00AA, 0x1234, 0, 0], 130, true, &mut fps);
        assert!(trap.is_none());
        assert!(fps.negative());
        assert!(!fps.zero());
        assert_eq!(out[0], 0x8000 | (130u16 << 7) | 0x2A);
    }

    #[test]
    fn pack_underflow_masked_zeroes_result() {
        let mut fps = Fps::default();
        let (out, trap) = pack(&[0x00AA, 0, 0, 0], 0, true, &mut fps);
        assert!(trap.is_none());
        assert_eq!(out, [0, 0, 0, 0]);
        assert!(fps.zero());
        assert!(!fps.negative());
    }

    #[test]
    fn pack_underflow_trapped_keeps_partial_result() {
        let mut fps = Fps::default();
        fps.set_fiu(true);
        let (out, trap) = pack(&[0x00AA, 0x1234, 0, 0], -3, true, &mut fps);
        assert_eq!(trap, Some(Trap::Underflow));
        assert_ne!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn pack_overflow_masked_sets_v_and_z() {
        let mut fps = Fps::default();
        let (out, trap) = pack(&[0x00AA, 0, 0, 0], 300, false, &mut fps);
        assert!(trap.is_none());
        assert_eq!(out, [0, 0, 0, 0]);
        assert!(fps.overflow());
        assert!(fps.zero());
    }
}
