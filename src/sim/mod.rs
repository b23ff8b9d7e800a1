//! Diagnostic harness: tape loading and the `FlatBus` collaborator.

pub mod loader;

pub use loader::{load_tape, FlatBus, TapeRecord};
