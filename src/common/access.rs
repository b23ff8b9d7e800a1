//! Operand access classification for the addressing collaborator.

/// Direction of an operand access through the `AddressSpace` collaborator.
///
/// Distinguishes a read (which must check for the undefined-variable
/// encoding) from a write (which never does).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Operand is being fetched into the core (checked for undefined
    /// variable when `FIUV` is set).
    Read,
    /// Operand is being stored from the core.
    Write,
}
