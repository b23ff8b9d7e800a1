//! FP11 Floating-Point Coprocessor Emulator.
//!
//! A pure, deterministic arithmetic engine reproducing the FP11
//! floating-point coprocessor of a PDP-11/70-class system bit-for-bit, as
//! exercised by the KFPA/KFPB/KFPC diagnostic suites. The hard core — the
//! multi-precision word-array arithmetic kernel — lives entirely in
//! [`fpp`]; everything else in this crate is the diagnostic harness that
//! drives it (the CPU instruction dispatcher, the MMU, and the rest of a
//! real PDP-11 are explicitly out of scope — see `SPEC_FULL.md`).
//!
//! # Modules
//!
//! * `common`: Shared trap/fault types and the read/write access direction
//!   the addressing collaborator distinguishes between.
//! * `config`: Diagnostic-harness configuration (TOML, via serde).
//! * `fpp`: The FP11 core itself — word-array primitives, pack/unpack,
//!   operand addressing, the arithmetic and conversion kernels, and
//!   instruction dispatch.
//! * `sim`: The diagnostic tape loader and the harness's `AddressSpace`
//!   collaborator implementation (`FlatBus`).
//! * `stats`: Diagnostic-replay statistics collection and reporting.

/// Shared trap/fault types and operand access-direction classification.
pub mod common;

/// Diagnostic-harness configuration (TOML via serde).
pub mod config;

/// The FP11 floating-point coprocessor core.
pub mod fpp;

/// Diagnostic tape loading and the harness's `AddressSpace` collaborator.
pub mod sim;

/// Diagnostic-replay statistics collection and reporting.
pub mod stats;
