//! Conversion kernels (component E): integer↔float and precision toggling.
//!
//! Unlike the arithmetic kernels these never read FEC 8/10/12 — per §7 the
//! only trap this family can raise is FEC 6 (integer-conversion overflow),
//! and only from [`Conversion::stcfi`]. Fetching the source integer at the
//! right width (16 vs. 32 bits, with the immediate-mode-is-always-short
//! override) and the actual memory access at a toggled precision are both
//! dispatch's job (§6); these functions only transform already-fetched
//! values.

use crate::common::Trap;
use crate::fpp::pack::{pack, BIAS};
use crate::fpp::status::{exponent_of, has_zero_exponent, sign_of, Fps, Number, CANONICAL_ZERO};

pub struct Conversion;

impl Conversion {
    /// LDCIF: integer → float (§4.E). `value` is the already sign-extended
    /// two's-complement source integer (16- or 32-bit per the caller's
    /// fetch width).
    pub fn ldcif(value: i32, fps: &mut Fps) -> (Number, Option<Trap>) {
        if value == 0 {
            fps.set_negative(false);
            fps.set_zero(true);
            return (CANONICAL_ZERO, None);
        }
        let sign = value < 0;
        let mag = value.unsigned_abs();
        let top = 31 - mag.leading_zeros() as i32;
        let shift = 31 - top;
        let normalized = mag << shift; // bit 31 is now the hidden 1

        let exp = BIAS + top + 1;
        let word0_frac = ((normalized >> 24) & 0x7F) as u16;
        let word1 = ((normalized >> 8) & 0xFFFF) as u16;
        let mut word2 = ((normalized << 8) & 0xFF00) as u16;
        let mut out = [word0_frac, word1, word2, 0];

        if !fps.double_mode() {
            if !fps.truncate() && word2 & 0x8000 != 0 {
                let carried = (out[1] as u32) + 1;
                out[1] = carried as u16;
                if carried > 0xFFFF {
                    out[0] += 1;
                }
            }
            word2 = 0;
            out[2] = 0;
            out[3] = 0;
        }
        let _ = word2;

        pack(&out, exp, sign, fps)
    }

    /// STCFI: float → integer (§4.E). `long` selects a 32- vs. 16-bit
    /// target width (dispatch resolves the immediate-mode-always-short
    /// override before calling in). Returns the integer and the trap, if
    /// any; copying FPS condition codes into the CPU flag register is the
    /// caller's job (it owns the `AddressSpace` collaborator).
    pub fn stcfi(n: &Number, long: bool, fps: &mut Fps) -> (i32, Option<Trap>) {
        let shift = exponent_of(n) as i32 - BIAS;
        if shift <= 0 {
            fps.set_negative(false);
            fps.set_zero(true);
            return (0, None);
        }

        let sign = sign_of(n);
        let mantissa: u32 = (0x80u32 << 24)
            | (((n[0] & 0x7F) as u32) << 24)
            | ((n[1] as u32) << 8)
            | ((n[2] as u32) >> 8);

        let raw_shift = 32 - shift;
        let value: u64 = if raw_shift >= 0 {
            if raw_shift >= 64 {
                0
            } else {
                (mantissa as u64) >> raw_shift
            }
        } else {
            (mantissa as u64) << (-raw_shift).min(63)
        };

        let limit: u64 = if long { 1u64 << 31 } else { 1u64 << 15 };
        let overflow = if sign { value > limit } else { value >= limit };

        if overflow {
            fps.set_overflow(true);
            fps.set_carry(true);
            let trap = if fps.fic() {
                Some(Trap::IntegerConversionOverflow)
            } else {
                None
            };
            return (0, trap);
        }

        let magnitude = value as i64;
        let result = if sign { -magnitude } else { magnitude } as i32;
        fps.set_negative(result < 0);
        fps.set_zero(result == 0);
        (result, None)
    }

    /// LDCDF half of the precision toggle: widen a float-precision operand
    /// to double by zero-extending the low two words (§4.E).
    pub fn widen_to_double(n: &Number) -> Number {
        [n[0], n[1], 0, 0]
    }

    /// STCFD half of the precision toggle: narrow a double-precision
    /// operand to float, rounding when bit 15 of the first discarded word
    /// is set and FT is clear (§4.E). Leaves V untouched — per the
    /// documented source ambiguity (§9 open question a), a write fault
    /// after this rounding step may leave a stale V bit from a prior
    /// operation, and that is the behavior being preserved rather than
    /// papered over.
    pub fn narrow_to_float(n: &Number, fps: &mut Fps) -> Number {
        let mut out = [n[0], n[1], 0, 0];
        if !has_zero_exponent(n) && !fps.truncate() && n[2] & 0x8000 != 0 {
            let carried = (out[1] as u32) + 1;
            out[1] = carried as u16;
            if carried > 0xFFFF {
                out[0] = out[0].wrapping_add(1);
            }
        }
        fps.set_negative(sign_of(&out));
        fps.set_zero(has_zero_exponent(&out));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ldcif_zero_sets_z() {
        let mut fps = Fps::default();
        let (out, trap) = Conversion::ldcif(0, &mut fps);
        assert!(trap.is_none());
        assert_eq!(out, CANONICAL_ZERO);
        assert!(fps.zero());
    }

    #[test]
    fn ldcif_then_stcfi_round_trips_long_power_of_two() {
        let mut fps = Fps::default();
        fps.set_double_mode(true);
        fps.set_long_mode(true);
        let (encoded, trap) = Conversion::ldcif(0x0001_0000, &mut fps);
        assert!(trap.is_none());
        assert_eq!(exponent_of(&encoded), (BIAS + 17) as u16);
        let (back, trap2) = Conversion::stcfi(&encoded, true, &mut fps);
        assert!(trap2.is_none());
        assert_eq!(back, 0x0001_0000);
    }

    #[test]
    fn stcfi_overflow_traps_when_fic_set() {
        let mut fps = Fps::default();
        fps.set_fic(true);
        fps.set_double_mode(true);
        let (huge, _) = Conversion::ldcif(i32::MIN, &mut fps);
        let (result, trap) = Conversion::stcfi(&huge, false, &mut fps);
        assert_eq!(result, 0);
        assert_eq!(trap, Some(Trap::IntegerConversionOverflow));
        assert!(fps.overflow());
        assert!(fps.carry());
    }

    #[test]
    fn widen_then_narrow_preserves_exact_value() {
        let mut fps = Fps::default();
        let value: Number = [0x4044, 0x0000, 0, 0];
        let widened = Conversion::widen_to_double(&value);
        let narrowed = Conversion::narrow_to_float(&widened, &mut fps);
        assert_eq!(narrowed, value);
    }
}
