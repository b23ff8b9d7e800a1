//! Common types shared by the FPP core and its diagnostic harness.
//!
//! Provides the access-direction enum consumed by the addressing
//! collaborator and the trap/fault types that separate architectural FPP
//! exceptions from collaborator-side addressing failures.

/// Operand access direction (read/write).
pub mod access;

/// Trap (FEC) and fault (collaborator) classification.
pub mod error;

pub use access::AccessType;
pub use error::{Fault, FppResult, Trap};
