//! # APF Assembler
//!
//! A programmatic bytecode generator for the APF (Android Packet Filter)
//! interpreter. Programs are composed by appending typed instructions to
//! an [`ApfGenerator`]; generation resolves symbolic branch labels,
//! iterates branch-offset widths down to a fixed point and emits the
//! final bytecode.
//!
//! ## Example
//!
//! ```rust
//! use apf_assembler::{ApfGenerator, DROP_LABEL, PASS_LABEL};
//! use apf_spec::{Register, MIN_APF_VERSION};
//!
//! # fn main() -> Result<(), apf_assembler::AssemblerError> {
//! // Drop ARP packets, pass everything else.
//! let mut gen = ApfGenerator::new(MIN_APF_VERSION)?;
//! gen.add_load16(Register::R0, 12)?
//!     .add_jump_if_r0_not_equals(0x0806, PASS_LABEL)?
//!     .add_jump(DROP_LABEL)?;
//! let program = gen.generate()?;
//! assert!(!program.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
mod instruction;

pub use error::{AssemblerError, Result};
pub use generator::{ApfGenerator, DROP_LABEL, PASS_LABEL};
