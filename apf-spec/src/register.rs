//! Register definitions for the APF machine (two registers, R0 and R1).

use serde::{Deserialize, Serialize};
use std::fmt;

/// APF register selector.
///
/// Every instruction carries exactly one register bit in its leading byte.
/// Opcode pairs that share a numeric code (PASS/DROP, TRANSMIT/DISCARD)
/// are disambiguated by this bit, so the legal pairings are enforced where
/// instructions are appended, not here.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Register {
    R0 = 0,
    R1 = 1,
}

impl Register {
    /// The register bit as encoded in the instruction's leading byte.
    #[inline]
    pub const fn value(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::R0 => write!(f, "r0"),
            Register::R1 => write!(f, "r1"),
        }
    }
}
