//! # APF Wire-Format Definitions
//!
//! This crate defines the core types and encoding rules for APF (Android
//! Packet Filter) bytecode, a small program format executed by an in-kernel
//! interpreter to decide whether incoming packets are dropped or passed to
//! the host.
//!
//! ## Overview
//!
//! APF instructions are variable-length:
//! - One leading byte packing a 5-bit opcode, a 2-bit width field and a
//!   1-bit register selector
//! - Zero or more big-endian immediates, most of which are encoded at the
//!   minimum byte width able to hold their value
//! - An optional raw byte payload (byte-sequence compares, the data region)
//!
//! The types here describe the format only; program construction lives in
//! the `apf-assembler` crate.
//!
//! ## Example
//!
//! ```rust
//! use apf_spec::{Immediate, Opcode, Register};
//!
//! let imm = Immediate::unsigned_indeterminate(256);
//! assert_eq!(imm.indeterminate_width(), 2);
//! assert_eq!(Opcode::Ldb.code(), 1);
//! assert_eq!(Register::R1.value(), 1);
//! ```

pub mod error;
pub mod immediate;
pub mod opcode;
pub mod register;

pub use error::SpecError;
pub use immediate::{Immediate, ImmediateKind};
pub use opcode::{ExtendedOpcode, Opcode};
pub use register::Register;

/// Number of 32-bit scratch slots the interpreter manages for APF loads
/// from and stores to memory. Slots are numbered 0 to `MEMORY_SLOTS` - 1.
/// Must be kept in sync with the APF interpreter.
pub const MEMORY_SLOTS: u32 = 16;

/// Memory slot prefilled with the IPv4 header length. A program that
/// stores to this slot overwrites the prefilled value.
pub const IPV4_HEADER_SIZE_MEMORY_SLOT: u32 = 13;

/// Memory slot prefilled with the size in bytes of the packet being
/// filtered. May be overwritten by program stores.
pub const PACKET_SIZE_MEMORY_SLOT: u32 = 14;

/// Memory slot prefilled with the age of the filter in seconds, i.e. the
/// time since the filter was installed. May be overwritten by program
/// stores.
pub const FILTER_AGE_MEMORY_SLOT: u32 = 15;

/// First memory slot containing prefilled values, for range comparisons.
pub const FIRST_PREFILLED_MEMORY_SLOT: u32 = IPV4_HEADER_SIZE_MEMORY_SLOT;

/// Last memory slot containing prefilled values, for range comparisons.
pub const LAST_PREFILLED_MEMORY_SLOT: u32 = FILTER_AGE_MEMORY_SLOT;

/// Minimum interpreter version the assembler can target. Syncs up with
/// APF_VERSION in the interpreter sources.
pub const MIN_APF_VERSION: u32 = 2;

/// Interpreter version that introduced data-memory access (LDDW/STDW).
pub const APF_VERSION_4: u32 = 4;

/// In-development interpreter version required for counters on PASS/DROP,
/// the output buffer lifecycle (ALLOCATE/TRANSMIT/DISCARD), writes and
/// copies into the output buffer, and a leading data region.
pub const MIN_APF_VERSION_IN_DEV: u32 = 5;
