//! In-flight instruction representation.
//!
//! An [`Instruction`] is one entry of the program under construction:
//! either a real opcode with its operands or a zero-size label anchor.
//! Branch targets stay symbolic until the layout pass resolves them; the
//! generator computes each branch's distance and passes it in, so sizing,
//! shrinking and encoding are local operations here.

use apf_spec::immediate::{minimum_width, write_be};
use apf_spec::{ExtendedOpcode, Immediate, Opcode, Register};

/// Width reserved for a branch target before the first layout pass. The
/// fixed point may only shrink it.
const INITIAL_TARGET_WIDTH: u8 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
enum InstructionKind {
    Op(Opcode),
    /// Zero-size pseudo-instruction anchoring a label name.
    Anchor(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Instruction {
    kind: InstructionKind,
    register: Register,
    imms: Vec<Immediate>,
    target_label: Option<String>,
    /// Bytes currently reserved for the target offset; never grows.
    target_width: u8,
    bytes: Option<Vec<u8>>,
    /// Byte offset from program start, assigned by the layout pass.
    pub(crate) offset: usize,
}

impl Instruction {
    pub(crate) fn new(opcode: Opcode, register: Register) -> Self {
        Instruction {
            kind: InstructionKind::Op(opcode),
            register,
            imms: Vec::new(),
            target_label: None,
            target_width: 0,
            bytes: None,
            offset: 0,
        }
    }

    /// An EXT-prefixed instruction; the extended opcode rides in the first
    /// unsigned immediate.
    pub(crate) fn ext(extended: ExtendedOpcode, register: Register) -> Self {
        Instruction::new(Opcode::Ext, register)
            .imm(Immediate::unsigned_indeterminate(extended.code() as u32))
    }

    /// A label anchor: occupies no space, resolves to the offset of
    /// whatever follows it.
    pub(crate) fn anchor(name: &str) -> Self {
        Instruction {
            kind: InstructionKind::Anchor(name.to_string()),
            register: Register::R0,
            imms: Vec::new(),
            target_label: None,
            target_width: 0,
            bytes: None,
            offset: 0,
        }
    }

    pub(crate) fn imm(mut self, imm: Immediate) -> Self {
        self.imms.push(imm);
        self
    }

    pub(crate) fn target(mut self, label: &str) -> Self {
        self.target_label = Some(label.to_string());
        self.target_width = INITIAL_TARGET_WIDTH;
        self
    }

    pub(crate) fn payload(mut self, bytes: Vec<u8>) -> Self {
        self.bytes = Some(bytes);
        self
    }

    pub(crate) fn target_label(&self) -> Option<&str> {
        self.target_label.as_deref()
    }

    /// Shared width of this instruction's indeterminate immediates: the
    /// maximum of the reserved target width and every indeterminate
    /// immediate's minimum width.
    fn shared_width(&self) -> u8 {
        let mut width = self.target_width;
        for imm in &self.imms {
            width = width.max(imm.indeterminate_width());
        }
        width
    }

    /// Encoded length in bytes. Anchors occupy no space.
    pub(crate) fn size(&self) -> usize {
        if matches!(self.kind, InstructionKind::Anchor(_)) {
            return 0;
        }
        let shared = self.shared_width();
        let mut size = 1;
        if self.target_label.is_some() {
            size += shared as usize;
        }
        for imm in &self.imms {
            size += imm.encoded_width(shared) as usize;
        }
        if let Some(bytes) = &self.bytes {
            size += bytes.len();
        }
        size
    }

    /// Re-reserve the target offset field for `distance`, the signed
    /// distance from the end of this instruction to its target under the
    /// current layout. Returns true if the reservation shrank.
    ///
    /// # Panics
    ///
    /// Panics if the field would have to grow: offsets only move down as
    /// instructions shrink, so growth means the layout pass is broken.
    pub(crate) fn shrink(&mut self, distance: i32) -> bool {
        let old_width = self.target_width;
        let new_width = minimum_width(distance, false);
        assert!(
            new_width <= old_width,
            "instruction grew from {} to {} target bytes",
            old_width,
            new_width
        );
        self.target_width = new_width;
        new_width < old_width
    }

    /// Encode this instruction into `code` at its cached offset.
    /// `target_offset` must carry the resolved branch distance exactly
    /// when a target label is present.
    ///
    /// # Panics
    ///
    /// Panics if the written byte count disagrees with [`size`](Self::size).
    pub(crate) fn write(&self, code: &mut [u8], target_offset: Option<i32>) {
        let opcode = match &self.kind {
            InstructionKind::Anchor(_) => return,
            InstructionKind::Op(opcode) => opcode.code(),
        };
        let shared = self.shared_width();
        // Width field squeezes {0,1,2,4} into 2 bits: 0->0, 1->1, 2->2, 4->3.
        let width_field = if shared == 4 { 3 } else { shared };
        let mut pos = self.offset;
        code[pos] = (opcode << 3) | (width_field << 1) | self.register.value();
        pos += 1;
        if let Some(distance) = target_offset {
            pos = write_be(distance, code, pos, shared);
        }
        for imm in &self.imms {
            pos = imm.write(code, pos, shared);
        }
        if let Some(bytes) = &self.bytes {
            code[pos..pos + bytes.len()].copy_from_slice(bytes);
            pos += bytes.len();
        }
        let written = pos - self.offset;
        assert_eq!(
            written,
            self.size(),
            "wrote {} bytes but size() claims {}",
            written,
            self.size()
        );
    }
}
