//! Arithmetic kernels (component D): add/subtract, multiply, divide, modulo
//! fraction, increment, and load-exponent.
//!
//! Every kernel takes its operands as already-unpacked `Number`s and a
//! mutable `Fps`, and returns the packed result alongside the trap it
//! raised, if any, mirroring this repository's static-struct execute-unit
//! idiom (compare `Alu::execute`, `Fpu::execute`). Internally, the
//! schoolbook multiply/divide scratch buffers described by the historical
//! algorithm are implemented as fixed-point arithmetic over `u128`
//! accumulators rather than literal word-by-word digit loops wherever the
//! two are numerically equivalent — division is the one kernel whose
//! correction step is genuinely algorithmic (the Brinch Hansen "minefield"
//! single-step correction) and is implemented digit-by-digit as specified.

use crate::common::Trap;
use crate::fpp::pack::{ldexp as ldexp_primitive, pack, BIAS};
use crate::fpp::status::{
    exponent_of, frac0_bits, has_zero_exponent, sign_of, Fps, Number, CANONICAL_ZERO,
};
use crate::fpp::words::{add_small, add_words, compare_fraction, find_first_one, shift_left, shift_right, sub_words};

pub struct Arithmetic;

fn expose_hidden(n: &Number) -> Number {
    let mut m = *n;
    m[0] = (m[0] & 0x7F) | 0x80;
    m
}

fn set_cc_only(fps: &mut Fps, n: &Number) {
    fps.set_negative(sign_of(n));
    fps.set_zero(has_zero_exponent(n));
}

/// Bit-length of a normalized P-word fraction value (hidden bit plus
/// explicit fraction bits): `8 + 16*(P-1)`.
fn frac_width_bits(p: usize) -> u32 {
    (16 * p - 8) as u32
}

fn frac_value(n: &Number, p: usize) -> u128 {
    let mut v: u128 = ((n[0] & 0x7F) as u128) | 0x80;
    for word in n.iter().take(p).skip(1) {
        v = (v << 16) | (*word as u128);
    }
    v
}

fn frac_from_value(v: u128, p: usize) -> Number {
    let mut out = [0u16; 4];
    let mut vv = v;
    for i in (0..p).rev() {
        out[i] = (vv & 0xFFFF) as u16;
        vv >>= 16;
    }
    out
}

impl Arithmetic {
    /// ADD: `n ← n + m` (§4.D).
    pub fn add(n: &Number, m: &Number, fps: &mut Fps) -> (Number, Option<Trap>) {
        if has_zero_exponent(n) && has_zero_exponent(m) {
            set_cc_only(fps, &CANONICAL_ZERO);
            return (CANONICAL_ZERO, None);
        }
        if has_zero_exponent(n) {
            set_cc_only(fps, m);
            return (*m, None);
        }
        if has_zero_exponent(m) {
            set_cc_only(fps, n);
            return (*n, None);
        }

        let p = fps.precision_words();
        let sign_n = sign_of(n);
        let sign_m = sign_of(m);
        let exp_n = exponent_of(n) as i32;
        let exp_m = exponent_of(m) as i32;

        let mut big = expose_hidden(n);
        let mut small = expose_hidden(m);
        let (mut exp, swapped) = if exp_n >= exp_m {
            (exp_n, false)
        } else {
            std::mem::swap(&mut big, &mut small);
            (exp_m, true)
        };
        let delta = (exp_n - exp_m).unsigned_abs();
        let truncate = fps.truncate();
        let guard = shift_right(&mut small[..p], delta);
        let guard_in = !truncate && guard != 0;

        if sign_n == sign_m {
            let sign = sign_n;
            let mut result = big;
            add_words(&mut result[..p], &small[..p], guard_in);
            if result[0] & 0x100 != 0 {
                if !truncate && result[p - 1] & 1 != 0 {
                    add_small(&mut result[..p], 1);
                }
                shift_right(&mut result[..p], 1);
                exp += 1;
            }
            let (out, trap) = pack(&result, exp, sign, fps);
            (out, trap)
        } else {
            let (bigger, smaller, sign) = match compare_fraction(&big[..p], &small[..p]) {
                std::cmp::Ordering::Equal => {
                    set_cc_only(fps, &CANONICAL_ZERO);
                    return (CANONICAL_ZERO, None);
                }
                std::cmp::Ordering::Greater => {
                    let sign = if swapped { sign_m } else { sign_n };
                    (big, small, sign)
                }
                std::cmp::Ordering::Less => {
                    let sign = if swapped { sign_n } else { sign_m };
                    (small, big, sign)
                }
            };
            let mut result = bigger;
            sub_words(&mut result[..p], &smaller[..p], false);
            // The normal point/hidden-bit position sits at absolute bit 8
            // (word0 bit 7, the same `0x80` `expose_hidden` or's in); an
            // already-normalized subtract result has its MSB right there,
            // so the scan must start at 8, not 9, or a result that needs no
            // shift at all is misread as having no set bit and collapses to
            // zero.
            match find_first_one(&result[..p], 8) {
                -1 => {
                    let (out, trap) = pack(&[0, 0, 0, 0], 0, false, fps);
                    (out, trap)
                }
                pos => {
                    let shift = (pos as u32).saturating_sub(8);
                    shift_left(&mut result[..p], shift);
                    exp -= shift as i32;
                    let (out, trap) = pack(&result, exp, sign, fps);
                    (out, trap)
                }
            }
        }
    }

    /// SUB: `n ← n − m`, implemented as add with `m`'s sign inverted (§4.D).
    pub fn sub(n: &Number, m: &Number, fps: &mut Fps) -> (Number, Option<Trap>) {
        let mut negated = *m;
        negated[0] ^= 0x8000;
        Self::add(n, &negated, fps)
    }

    fn multiply_raw(n: &Number, m: &Number, fps: &Fps) -> (bool, i32, u128, usize) {
        let p = fps.precision_words();
        let sign = sign_of(n) ^ sign_of(m);
        let base_exp = exponent_of(n) as i32 + exponent_of(m) as i32 - BIAS;
        let wb = frac_width_bits(p);
        let product = frac_value(n, p) * frac_value(m, p);
        let threshold = 1u128 << (2 * wb - 1);

        let (shift, exp_adj) = if product < threshold {
            (wb - 1, 0i32)
        } else {
            (wb, 1i32)
        };
        let mut frac_pre = product >> shift;
        let guard = if shift > 0 {
            (product >> (shift - 1)) & 1
        } else {
            0
        };
        let mut exp_adj = exp_adj;
        if !fps.truncate() && guard == 1 {
            frac_pre += 1;
            if frac_pre >= (1u128 << wb) {
                frac_pre >>= 1;
                exp_adj += 1;
            }
        }
        (sign, base_exp + exp_adj, frac_pre, p)
    }

    /// MUL: `n ← n × m` (§4.D).
    pub fn mul(n: &Number, m: &Number, fps: &mut Fps) -> (Number, Option<Trap>) {
        if has_zero_exponent(n) || has_zero_exponent(m) {
            set_cc_only(fps, &CANONICAL_ZERO);
            return (CANONICAL_ZERO, None);
        }
        let (sign, exp, frac_pre, p) = Self::multiply_raw(n, m, fps);
        let frac = frac_from_value(frac_pre, p);
        pack(&frac, exp, sign, fps)
    }

    /// DIV: `n ← n / m` via the Brinch Hansen "minefield" algorithm (§4.D).
    pub fn div(n: &Number, m: &Number, fps: &mut Fps) -> (Number, Option<Trap>) {
        if has_zero_exponent(m) {
            fps.set_fer(true);
            return (*n, Some(Trap::DivideByZero));
        }
        if has_zero_exponent(n) {
            set_cc_only(fps, &CANONICAL_ZERO);
            return (CANONICAL_ZERO, None);
        }

        let p = fps.precision_words();
        let sign = sign_of(n) ^ sign_of(m);
        let mut exp = exponent_of(n) as i32 - exponent_of(m) as i32 + BIAS;

        let frac_n = expose_hidden(n);
        let frac_m = expose_hidden(m);
        let m_val = frac_value(m, p);

        let mut result = [0u16; 8];
        for i in 0..p {
            result[i] = frac_n[i];
        }
        if compare_fraction(&frac_n[..p], &frac_m[..p]) == std::cmp::Ordering::Less {
            shift_left(&mut result[..2 * p], 8);
        } else {
            shift_left(&mut result[..2 * p], 7);
            exp += 1;
        }

        let d = ((frac_m[0] as u32) << 16) | frac_m[1] as u32;
        let mut quotient = [0u16; 4];

        for o in 0..p {
            let num: u64 = if o == 0 {
                ((result[0] as u64) << 16) | result[1] as u64
            } else {
                (((result[o - 1] as u64) << 16 | result[o] as u64) << 16) | result[o + 1] as u64
            };
            let mut qhat = (num / d as u64).min(0xFFFF) as u32;

            let borrow = subtract_product(&mut result, o, p, qhat as u128 * m_val);
            if borrow {
                qhat = qhat.saturating_sub(1);
                add_back(&mut result, o, p, m_val);
            }
            quotient[o] = qhat as u16;
        }

        if !fps.truncate() {
            let round_num: u64 = (((result[p - 1] as u64) << 16 | result[p] as u64) << 16)
                | result[(p + 1).min(2 * p - 1)] as u64;
            let qhat_round = (round_num / d as u64).min(0xFFFF) as u32;
            if qhat_round & 0x8000 != 0 {
                add_small(&mut quotient[..p], 1);
            }
        }

        pack(&quotient, exp, sign, fps)
    }

    /// MODF: computes `n × m`, writes the integer part to `whole` (if
    /// `Some`) and the fractional part to the returned `Number` (§4.D).
    /// Rounding is applied only when the integer part occupies fewer than
    /// 8 bits beyond the normal point, matching the historical FP11's
    /// limited guard-bit budget for this instruction.
    pub fn modf(
        n: &Number,
        m: &Number,
        fps: &mut Fps,
        whole: Option<&mut Number>,
    ) -> (Number, Option<Trap>) {
        if has_zero_exponent(n) || has_zero_exponent(m) {
            if let Some(w) = whole {
                *w = CANONICAL_ZERO;
            }
            set_cc_only(fps, &CANONICAL_ZERO);
            return (CANONICAL_ZERO, None);
        }

        let p = fps.precision_words();
        let wb = frac_width_bits(p) as i64;
        let sign = sign_of(n) ^ sign_of(m);
        let base_exp = exponent_of(n) as i32 + exponent_of(m) as i32 - BIAS;
        let product = frac_value(n, p) * frac_value(m, p);
        let threshold = 1u128 << (2 * wb as u32 - 1);
        let (shift, exp_adj) = if product < threshold {
            (wb as u32 - 1, 0i32)
        } else {
            (wb as u32, 1i32)
        };
        let round_eligible = exp_adj < 8;
        let mut frac_pre = product >> shift;
        if round_eligible && !fps.truncate() && shift > 0 && (product >> (shift - 1)) & 1 == 1 {
            frac_pre += 1;
        }
        let exp = base_exp + exp_adj;
        let k = exp - BIAS; // number of integer bits beyond the normal point

        if let Some(w) = whole {
            if k <= 0 {
                *w = CANONICAL_ZERO;
            } else {
                let int_shift = (wb as i64 - 1 - k as i64).max(0) as u32;
                let int_val = frac_pre >> int_shift;
                *w = normalize_integer(int_val, sign, fps);
            }
        }

        if k <= 0 {
            let frac = frac_from_value(frac_pre, p);
            return pack(&frac, exp, sign, fps);
        }

        let int_shift = (wb as i64 - 1 - k as i64).max(0) as u32;
        let frac_mask = if int_shift >= 128 {
            u128::MAX
        } else {
            (1u128 << int_shift) - 1
        };
        let frac_bits = frac_pre & frac_mask;
        if frac_bits == 0 || int_shift == 0 {
            return pack(&[0, 0, 0, 0], 0, false, fps);
        }

        let leading = 127 - frac_bits.leading_zeros();
        let renorm_shift = int_shift - 1 - leading;
        let new_exp = exp - k - renorm_shift as i32;
        let mut normalized = frac_bits << renorm_shift;
        normalized &= (1u128 << wb) - 1;
        let frac = frac_from_value(normalized, p);
        pack(&frac, new_exp, sign, fps)
    }

    /// INCR: adds 1 to the fraction and re-normalizes by one right shift if
    /// the hidden-bit region overflowed (§4.D).
    pub fn increment(n: &Number, fps: &mut Fps) -> (Number, Option<Trap>) {
        if has_zero_exponent(n) {
            set_cc_only(fps, &CANONICAL_ZERO);
            return (CANONICAL_ZERO, None);
        }
        let p = fps.precision_words();
        let sign = sign_of(n);
        let mut exp = exponent_of(n) as i32;
        let mut frac = expose_hidden(n);
        add_small(&mut frac[..p], 1);
        if frac[0] & 0x100 != 0 {
            shift_right(&mut frac[..p], 1);
            exp += 1;
        }
        pack(&frac, exp, sign, fps)
    }

    /// LDEXP: combines the signed argument with the current exponent bias
    /// and re-packs with the accumulator's existing fraction (§4.D, §4.B).
    pub fn ldexp(n: &Number, delta: i16, fps: &mut Fps) -> (Number, Option<Trap>) {
        ldexp_primitive(n, delta, fps)
    }
}

fn subtract_product(result: &mut [u16; 8], offset: usize, p: usize, product: u128) -> bool {
    let mut window: u128 = 0;
    for i in 0..p {
        window = (window << 16) | result[offset + i] as u128;
    }
    let modulus = 1u128 << (16 * p as u32);
    let (new_window, borrow) = if window >= product {
        (window - product, false)
    } else {
        (window + modulus - product, true)
    };
    let mut w = new_window;
    for i in (0..p).rev() {
        result[offset + i] = (w & 0xFFFF) as u16;
        w >>= 16;
    }
    borrow
}

fn add_back(result: &mut [u16; 8], offset: usize, p: usize, m_val: u128) {
    let mut window: u128 = 0;
    for i in 0..p {
        window = (window << 16) | result[offset + i] as u128;
    }
    let modulus = 1u128 << (16 * p as u32);
    let new_window = (window + m_val) % modulus;
    let mut w = new_window;
    for i in (0..p).rev() {
        result[offset + i] = (w & 0xFFFF) as u16;
        w >>= 16;
    }
}

/// Builds a normalized FPP number from an unsigned integer magnitude
/// (used by MODF's integer-part write-back).
fn normalize_integer(val: u128, sign: bool, fps: &mut Fps) -> Number {
    if val == 0 {
        return CANONICAL_ZERO;
    }
    let p = fps.precision_words();
    let wb = frac_width_bits(p);
    let top_bit = 127 - val.leading_zeros();
    let exp = BIAS + top_bit as i32 + 1;
    let shift = top_bit as i32 - (wb as i32 - 1);
    let mantissa = if shift >= 0 {
        val >> shift
    } else {
        val << (-shift)
    };
    let frac = frac_from_value(mantissa & ((1u128 << wb) - 1), p);
    let (out, _) = pack(&frac, exp, sign, fps);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fps_double() -> Fps {
        let mut fps = Fps::default();
        fps.set_double_mode(true);
        fps
    }

    #[test]
    fn add_cancels_to_canonical_zero() {
        let mut fps = fps_double();
        let plus_seven: Number = [0x4044, 0x0000, 0, 0];
        let minus_seven: Number = [0xC044, 0x0000, 0, 0];
        let (out, trap) = Arithmetic::add(&plus_seven, &minus_seven, &mut fps);
        assert!(trap.is_none());
        assert_eq!(out, CANONICAL_ZERO);
        assert!(fps.zero());
    }

    #[test]
    fn add_with_zero_operand_returns_other() {
        let mut fps = fps_double();
        let value: Number = [0x4044, 0, 0, 0];
        let (out, trap) = Arithmetic::add(&value, &CANONICAL_ZERO, &mut fps);
        assert!(trap.is_none());
        assert_eq!(out, value);
    }

    #[test]
    fn divide_by_zero_traps() {
        let mut fps = fps_double();
        let n: Number = [0x4044, 0, 0, 0];
        let (out, trap) = Arithmetic::div(&n, &CANONICAL_ZERO, &mut fps);
        assert_eq!(trap, Some(Trap::DivideByZero));
        assert_eq!(out, n);
        assert!(fps.fer());
    }

    #[test]
    fn multiply_by_zero_is_canonical_zero() {
        let mut fps = fps_double();
        let n: Number = [0x4044, 0, 0, 0];
        let (out, trap) = Arithmetic::mul(&n, &CANONICAL_ZERO, &mut fps);
        assert!(trap.is_none());
        assert_eq!(out, CANONICAL_ZERO);
    }

    #[test]
    fn multiply_then_divide_round_trips_approximately() {
        let mut fps = fps_double();
        let n: Number = [0x4044, 0x0000, 0, 0]; // 7.0-ish encoding as used above
        let d: Number = [0x4010, 0x0000, 0, 0]; // 2.0-ish encoding
        let (product, trap1) = Arithmetic::mul(&n, &d, &mut fps);
        let (back, trap2) = Arithmetic::div(&product, &d, &mut fps);
        assert!(trap1.is_none());
        assert!(trap2.is_none());
        assert_eq!(exponent_of(&back), exponent_of(&n));
    }
}
