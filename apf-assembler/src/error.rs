//! Error types for the APF assembler.

use apf_spec::SpecError;
use thiserror::Error;

/// Raised when an attempt is made to assemble an illegal instruction or to
/// finalize a program that cannot be laid out.
#[derive(Debug, Error)]
pub enum AssemblerError {
    /// Operand outside the opcode's declared domain
    #[error("{name}: {value}, must be in range [{min}, {max}]")]
    ValueOutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Opcode needs a newer interpreter than this generator targets
    #[error("requires APF version >= {required}, generator targets version {version}")]
    UnsupportedVersion { version: u32, required: u32 },

    /// Memory slot index outside [0, MEMORY_SLOTS)
    #[error("illegal memory slot number: {0}")]
    IllegalMemorySlot(u32),

    /// Label defined more than once
    #[error("duplicate label {0}")]
    DuplicateLabel(String),

    /// Branch target with no defining anchor; detected during generation
    #[error("label not found: {0}")]
    LabelNotFound(String),

    /// The data region must be declared before any other instruction
    #[error("data instruction has to come first")]
    DataInstructionMustBeFirst,

    /// Output-buffer writes handle 1, 2 or 4 bytes only
    #[error("write length must be 1, 2 or 4, got {0}")]
    InvalidWriteWidth(u8),

    /// Write value too large for the requested width
    #[error("value {value} does not fit into {width} byte(s)")]
    ValueUnfitForWidth { value: u32, width: u8 },

    /// Append or re-emission after generate() already ran
    #[error("program already generated")]
    AlreadyGenerated,

    /// Immediate construction failure from the wire-format layer
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Result type for assembler operations.
pub type Result<T> = std::result::Result<T, AssemblerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_out_of_range_display() {
        let err = AssemblerError::ValueOutOfRange {
            name: "counter number",
            value: 0,
            min: 1,
            max: 1000,
        };
        assert_eq!(
            err.to_string(),
            "counter number: 0, must be in range [1, 1000]"
        );
    }

    #[test]
    fn test_unsupported_version_display() {
        let err = AssemblerError::UnsupportedVersion {
            version: 2,
            required: 5,
        };
        assert_eq!(
            err.to_string(),
            "requires APF version >= 5, generator targets version 2"
        );
    }

    #[test]
    fn test_memory_slot_display() {
        let err = AssemblerError::IllegalMemorySlot(16);
        assert_eq!(err.to_string(), "illegal memory slot number: 16");
    }

    #[test]
    fn test_label_errors_display() {
        assert_eq!(
            AssemblerError::DuplicateLabel("next_filter".to_string()).to_string(),
            "duplicate label next_filter"
        );
        assert_eq!(
            AssemblerError::LabelNotFound("missing".to_string()).to_string(),
            "label not found: missing"
        );
    }

    #[test]
    fn test_spec_error_from() {
        let spec_err = SpecError::ValueOutOfRange {
            name: "unsigned indeterminate immediate",
            value: -3,
            min: 0,
            max: u32::MAX as i64,
        };
        let err: AssemblerError = spec_err.into();
        assert!(err.to_string().contains("unsigned indeterminate immediate"));
    }
}
