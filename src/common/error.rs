//! Trap and fault classification shared by the FPP core and its harness.
//!
//! Two distinct failure channels exist, and keeping them as separate types
//! is the point: an architectural `Trap` is a *result* of floating-point
//! arithmetic (e.g. divide by zero) and still commits the instruction's
//! in-progress side effects before being reported, while a `Fault` comes
//! from the addressing collaborator (a bad virtual address, an illegal
//! register) and aborts the instruction with nothing written back.

/// One of the seven FP11 floating error codes, stored verbatim into FEC.
///
/// The numeric values are the FEC encoding itself, not an arbitrary
/// discriminant — `Trap::DivideByZero as u16 == 4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Trap {
    /// No matching decode, or a register-mode operand named AC6/AC7.
    IllegalOpcode = 2,
    /// DIVF with a zero-exponent divisor.
    DivideByZero = 4,
    /// STCFI result does not fit the target integer width.
    IntegerConversionOverflow = 6,
    /// `pack` saw an exponent of 256 or greater.
    Overflow = 8,
    /// `pack` saw a non-positive exponent on a would-be non-zero result.
    Underflow = 10,
    /// An operand read encountered the reserved undefined-variable encoding.
    UndefinedVariable = 12,
    /// Diagnostic-only maintenance trap; never raised by arithmetic kernels.
    Maintenance = 14,
}

impl Trap {
    /// Returns the FEC value this trap kind stores.
    pub fn fec(self) -> u16 {
        self as u16
    }

    /// Whether this trap kind can be suppressed by FID (the master disable).
    ///
    /// Illegal opcode and divide-by-zero are not individually maskable by
    /// the FIUV/FIU/FIV/FIC bits — only the global FID bit defers them.
    pub fn individually_maskable(self) -> bool {
        !matches!(self, Trap::IllegalOpcode | Trap::DivideByZero)
    }
}

/// A failure reported by the addressing/memory collaborator (§4.C, §6).
///
/// Faults are not recorded in FPS/FEC/FEA at all; they unwind the current
/// instruction with no state change, as distinct from an architectural
/// [`Trap`]. A register-mode operand naming AC6/AC7 is *not* a `Fault` —
/// that is an architectural illegal-opcode trap (FEC=2), raised before the
/// collaborator is ever consulted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The resolved virtual address is outside anything the collaborator
    /// backs.
    BadAddress(u32),
}

/// Convenience alias: every core operation that can touch memory or
/// registers through the `AddressSpace` collaborator returns this.
pub type FppResult<T> = Result<T, Fault>;
