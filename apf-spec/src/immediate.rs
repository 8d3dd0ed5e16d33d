//! Variable-width immediate values.
//!
//! Most APF operands are encoded as big-endian immediates whose byte width
//! the assembler picks per instruction: the two *indeterminate* kinds take
//! the smallest of {0, 1, 2, 4} bytes able to hold the value, while the
//! six *determinate* kinds always occupy their declared width. All
//! indeterminate immediates of one instruction share a single width,
//! advertised in the instruction's 2-bit width field.

use serde::{Deserialize, Serialize};

use crate::error::{check_range, SpecError};

const U32_MAX: i64 = u32::MAX as i64;
const I32_MIN: i64 = i32::MIN as i64;

/// Width/signedness discipline of an [`Immediate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImmediateKind {
    /// Width chosen by the layout pass; value interpreted as signed.
    IndeterminateSigned,
    /// Width chosen by the layout pass; value interpreted as unsigned.
    IndeterminateUnsigned,
    Signed8,
    Unsigned8,
    SignedBe16,
    UnsignedBe16,
    SignedBe32,
    UnsignedBe32,
}

/// A 32-bit operand payload tagged with its encoding discipline.
///
/// The payload is a raw 32-bit pattern: an indeterminate immediate can be
/// constructed from any value in [i32::MIN, 2^32 - 1] and represents
/// either the signed or the unsigned reading of the same bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Immediate {
    kind: ImmediateKind,
    value: i32,
}

impl Immediate {
    /// Signed value whose width the layout pass chooses.
    pub fn signed_indeterminate(value: i32) -> Self {
        Immediate {
            kind: ImmediateKind::IndeterminateSigned,
            value,
        }
    }

    /// Unsigned value whose width the layout pass chooses.
    pub fn unsigned_indeterminate(value: u32) -> Self {
        Immediate {
            kind: ImmediateKind::IndeterminateUnsigned,
            value: value as i32,
        }
    }

    /// Signed indeterminate accepting the full two's-complement input
    /// range [i32::MIN, 2^32 - 1]; values above i32::MAX are reinterpreted
    /// as the equivalent 32-bit pattern.
    pub fn twos_complement_signed(value: i64) -> Result<Self, SpecError> {
        check_range("signed indeterminate immediate", value, I32_MIN, U32_MAX)?;
        Ok(Immediate {
            kind: ImmediateKind::IndeterminateSigned,
            value: value as i32,
        })
    }

    /// Unsigned indeterminate accepting the full two's-complement input
    /// range [i32::MIN, 2^32 - 1]; negative values are reinterpreted as
    /// the equivalent 32-bit pattern.
    pub fn twos_complement_unsigned(value: i64) -> Result<Self, SpecError> {
        check_range("unsigned indeterminate immediate", value, I32_MIN, U32_MAX)?;
        Ok(Immediate {
            kind: ImmediateKind::IndeterminateUnsigned,
            value: value as i32,
        })
    }

    pub fn signed8(value: i8) -> Self {
        Immediate {
            kind: ImmediateKind::Signed8,
            value: value as i32,
        }
    }

    pub fn unsigned8(value: u8) -> Self {
        Immediate {
            kind: ImmediateKind::Unsigned8,
            value: value as i32,
        }
    }

    pub fn signed_be16(value: i16) -> Self {
        Immediate {
            kind: ImmediateKind::SignedBe16,
            value: value as i32,
        }
    }

    pub fn unsigned_be16(value: u16) -> Self {
        Immediate {
            kind: ImmediateKind::UnsignedBe16,
            value: value as i32,
        }
    }

    pub fn signed_be32(value: i32) -> Self {
        Immediate {
            kind: ImmediateKind::SignedBe32,
            value,
        }
    }

    pub fn unsigned_be32(value: u32) -> Self {
        Immediate {
            kind: ImmediateKind::UnsignedBe32,
            value: value as i32,
        }
    }

    #[inline]
    pub fn kind(&self) -> ImmediateKind {
        self.kind
    }

    /// The raw 32-bit payload.
    #[inline]
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Minimum encodable width of an indeterminate immediate. Determinate
    /// kinds report 0 so callers can fold widths with `max()`.
    pub fn indeterminate_width(&self) -> u8 {
        match self.kind {
            ImmediateKind::IndeterminateSigned => minimum_width(self.value, true),
            ImmediateKind::IndeterminateUnsigned => minimum_width(self.value, false),
            _ => 0,
        }
    }

    /// Encoded width once the instruction's shared `field_width` is
    /// chosen: determinate kinds keep their declared width, indeterminate
    /// kinds stretch to the shared field.
    ///
    /// # Panics
    ///
    /// Panics if `field_width` cannot hold an indeterminate value. The
    /// layout fixed point never shrinks a field below an immediate's
    /// minimum, so this firing means the assembler itself is broken.
    pub fn encoded_width(&self, field_width: u8) -> u8 {
        match self.kind {
            ImmediateKind::Signed8 | ImmediateKind::Unsigned8 => 1,
            ImmediateKind::SignedBe16 | ImmediateKind::UnsignedBe16 => 2,
            ImmediateKind::SignedBe32 | ImmediateKind::UnsignedBe32 => 4,
            ImmediateKind::IndeterminateSigned | ImmediateKind::IndeterminateUnsigned => {
                let min = self.indeterminate_width();
                if min > field_width {
                    panic!(
                        "immediate field of {} bytes is too small to encode value {}",
                        field_width, self.value
                    );
                }
                field_width
            }
        }
    }

    /// Write this immediate at `offset`, returning the offset just past
    /// the written bytes.
    pub fn write(&self, code: &mut [u8], offset: usize, field_width: u8) -> usize {
        write_be(self.value, code, offset, self.encoded_width(field_width))
    }
}

/// Minimum number of bytes able to losslessly hold `value` under the
/// given signedness: 0 (value is zero), 1, 2 or 4.
pub fn minimum_width(value: i32, signed: bool) -> u8 {
    if value == 0 {
        return 0;
    }
    if signed && (-128..=127).contains(&value) || !signed && (0..=255).contains(&value) {
        return 1;
    }
    if signed && (-32768..=32767).contains(&value) || !signed && (0..=65535).contains(&value) {
        return 2;
    }
    4
}

/// Write the low `width` bytes of `value` big-endian at `offset`,
/// returning the offset just past the written bytes. The value is treated
/// as a plain 32-bit pattern: truncation throws away the upper bytes,
/// which are all-zero for in-range unsigned values and all-ones for
/// in-range negative values.
pub fn write_be(value: i32, code: &mut [u8], mut offset: usize, width: u8) -> usize {
    for i in (0..width).rev() {
        code[offset] = (value >> (i * 8)) as u8;
        offset += 1;
    }
    offset
}
