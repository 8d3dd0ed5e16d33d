//! APF program builder.
//!
//! [`ApfGenerator`] accumulates typed instructions in append order, then
//! lays the program out and emits interpreter-compatible bytecode. Branch
//! targets are symbolic label names resolved at emission; because branch
//! offsets are themselves variable-width immediates, emission iterates a
//! shrink pass to a fixed point so every branch uses the smallest offset
//! encoding that still reaches its target.

use std::collections::HashMap;

use apf_spec::{
    ExtendedOpcode, Immediate, Opcode, Register, APF_VERSION_4, MEMORY_SLOTS, MIN_APF_VERSION,
    MIN_APF_VERSION_IN_DEV,
};

use crate::error::{AssemblerError, Result};
use crate::instruction::Instruction;

/// Jump to this label to terminate the program and drop the packet.
pub const DROP_LABEL: &str = "__DROP__";

/// Jump to this label to terminate the program and pass the packet to the
/// host.
pub const PASS_LABEL: &str = "__PASS__";

/// Safety bound on layout iterations. Convergence normally takes two or
/// three passes; an unresolved 10th pass stops with the current widths,
/// which are always valid to emit.
const MAX_SHRINK_ITERATIONS: u32 = 10;

/// Append-only assembler for one APF program.
///
/// Call the `add_*` methods to append instructions, then
/// [`generate`](Self::generate) exactly once for the bytecode. A failed
/// append commits nothing; the builder stays usable.
#[derive(Debug)]
pub struct ApfGenerator {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    version: u32,
    generated: bool,
    /// Offsets of the synthetic end-of-program anchors, refreshed by every
    /// layout pass: PASS resolves to the program length, DROP to one past
    /// it.
    pass_offset: usize,
    drop_offset: usize,
}

impl ApfGenerator {
    /// Create a generator emitting instructions for the given interpreter
    /// `version`. Fails if the version is below the supported floor.
    pub fn new(version: u32) -> Result<Self> {
        let generator = ApfGenerator {
            instructions: Vec::new(),
            labels: HashMap::new(),
            version,
            generated: false,
            pass_offset: 0,
            drop_offset: 0,
        };
        generator.require_version(MIN_APF_VERSION)?;
        Ok(generator)
    }

    /// Whether programs can be generated for interpreter `version`.
    pub fn supports_version(version: u32) -> bool {
        version >= MIN_APF_VERSION
    }

    fn require_version(&self, required: u32) -> Result<()> {
        if self.version < required {
            return Err(AssemblerError::UnsupportedVersion {
                version: self.version,
                required,
            });
        }
        Ok(())
    }

    fn append(&mut self, instruction: Instruction) -> Result<&mut Self> {
        if self.generated {
            return Err(AssemblerError::AlreadyGenerated);
        }
        self.instructions.push(instruction);
        Ok(self)
    }

    fn ext_slot(extended: ExtendedOpcode, slot: u32, register: Register) -> Result<Instruction> {
        if slot >= MEMORY_SLOTS {
            return Err(AssemblerError::IllegalMemorySlot(slot));
        }
        Ok(Instruction::new(Opcode::Ext, register)
            .imm(Immediate::unsigned_indeterminate(extended.code() as u32 + slot)))
    }

    /// Define a label at the current end of the program. Labels are their
    /// own zero-size instructions, so a label may carry no code at all,
    /// e.g. a "next_filter" target at the very end of a filter:
    ///
    /// ```text
    /// load from packet
    /// compare, jump if not equal to "next_filter"
    /// jump to __DROP__
    /// define "next_filter" here
    /// ```
    ///
    /// The names `__PASS__` and `__DROP__` are resolved as the built-in
    /// termination targets before the label table is consulted, so labels
    /// with those names are never reachable as branch targets.
    pub fn define_label(&mut self, name: &str) -> Result<&mut Self> {
        if self.generated {
            return Err(AssemblerError::AlreadyGenerated);
        }
        if self.labels.contains_key(name) {
            return Err(AssemblerError::DuplicateLabel(name.to_string()));
        }
        self.labels
            .insert(name.to_string(), self.instructions.len());
        self.append(Instruction::anchor(name))
    }

    /// Append an unconditional jump to `target`.
    pub fn add_jump(&mut self, target: &str) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Jmp, Register::R0).target(target))
    }

    /// Append a load of the packet byte at `offset` into `register`.
    pub fn add_load8(&mut self, register: Register, offset: u32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Ldb, register).imm(Immediate::unsigned_indeterminate(offset)),
        )
    }

    /// Append a load of the 16 bits at packet offset `offset` into
    /// `register`.
    pub fn add_load16(&mut self, register: Register, offset: u32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Ldh, register).imm(Immediate::unsigned_indeterminate(offset)),
        )
    }

    /// Append a load of the 32 bits at packet offset `offset` into
    /// `register`.
    pub fn add_load32(&mut self, register: Register, offset: u32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Ldw, register).imm(Immediate::unsigned_indeterminate(offset)),
        )
    }

    /// Append a load of the packet byte at `offset` plus the value of R1
    /// into `register`.
    pub fn add_load8_indexed(&mut self, register: Register, offset: u32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Ldbx, register).imm(Immediate::unsigned_indeterminate(offset)),
        )
    }

    /// Append a load of the 16 bits at packet offset `offset` plus the
    /// value of R1 into `register`.
    pub fn add_load16_indexed(&mut self, register: Register, offset: u32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Ldhx, register).imm(Immediate::unsigned_indeterminate(offset)),
        )
    }

    /// Append a load of the 32 bits at packet offset `offset` plus the
    /// value of R1 into `register`.
    pub fn add_load32_indexed(&mut self, register: Register, offset: u32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Ldwx, register).imm(Immediate::unsigned_indeterminate(offset)),
        )
    }

    /// Append an add of `value` to R0. Accepts the full 32-bit pattern
    /// range [i32::MIN, 2^32 - 1].
    pub fn add_add(&mut self, value: i64) -> Result<&mut Self> {
        let imm = Immediate::twos_complement_unsigned(value)?;
        self.append(Instruction::new(Opcode::Add, Register::R0).imm(imm))
    }

    /// Append a multiply of R0 by `value`.
    pub fn add_mul(&mut self, value: u32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Mul, Register::R0)
                .imm(Immediate::unsigned_indeterminate(value)),
        )
    }

    /// Append a divide of R0 by `value`.
    pub fn add_div(&mut self, value: u32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Div, Register::R0)
                .imm(Immediate::unsigned_indeterminate(value)),
        )
    }

    /// Append a bitwise and of R0 with `value`. Accepts the full 32-bit
    /// pattern range [i32::MIN, 2^32 - 1].
    pub fn add_and(&mut self, value: i64) -> Result<&mut Self> {
        let imm = Immediate::twos_complement_unsigned(value)?;
        self.append(Instruction::new(Opcode::And, Register::R0).imm(imm))
    }

    /// Append a bitwise or of R0 with `value`. Accepts the full 32-bit
    /// pattern range [i32::MIN, 2^32 - 1].
    pub fn add_or(&mut self, value: i64) -> Result<&mut Self> {
        let imm = Immediate::twos_complement_unsigned(value)?;
        self.append(Instruction::new(Opcode::Or, Register::R0).imm(imm))
    }

    /// Append a left shift of R0 by `value` bits.
    pub fn add_left_shift(&mut self, value: i32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Sh, Register::R0).imm(Immediate::signed_indeterminate(value)),
        )
    }

    /// Append a right shift of R0 by `value` bits.
    pub fn add_right_shift(&mut self, value: i32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Sh, Register::R0)
                .imm(Immediate::signed_indeterminate(value.wrapping_neg())),
        )
    }

    /// Append an add of R1 to R0.
    pub fn add_add_r1(&mut self) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Add, Register::R1))
    }

    /// Append a multiply of R0 by R1.
    pub fn add_mul_r1(&mut self) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Mul, Register::R1))
    }

    /// Append a divide of R0 by R1.
    pub fn add_div_r1(&mut self) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Div, Register::R1))
    }

    /// Append a bitwise and of R0 with R1.
    pub fn add_and_r1(&mut self) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::And, Register::R1))
    }

    /// Append a bitwise or of R0 with R1.
    pub fn add_or_r1(&mut self) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Or, Register::R1))
    }

    /// Append a left shift of R0 by the value in R1.
    pub fn add_left_shift_r1(&mut self) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Sh, Register::R1))
    }

    /// Append a load of the signed immediate `value` into `register`.
    pub fn add_load_immediate(&mut self, register: Register, value: i32) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Li, register).imm(Immediate::signed_indeterminate(value)),
        )
    }

    /// Append a branch to `target` if R0 equals `value`.
    pub fn add_jump_if_r0_equals(&mut self, value: i64, target: &str) -> Result<&mut Self> {
        let imm = Immediate::twos_complement_unsigned(value)?;
        self.append(Instruction::new(Opcode::Jeq, Register::R0).imm(imm).target(target))
    }

    /// Append a branch to `target` if R0 does not equal `value`.
    pub fn add_jump_if_r0_not_equals(&mut self, value: i64, target: &str) -> Result<&mut Self> {
        let imm = Immediate::twos_complement_unsigned(value)?;
        self.append(Instruction::new(Opcode::Jne, Register::R0).imm(imm).target(target))
    }

    /// Append a branch to `target` if R0 is greater than `value`.
    pub fn add_jump_if_r0_greater_than(&mut self, value: u32, target: &str) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Jgt, Register::R0)
                .imm(Immediate::unsigned_indeterminate(value))
                .target(target),
        )
    }

    /// Append a branch to `target` if R0 is less than `value`.
    pub fn add_jump_if_r0_less_than(&mut self, value: u32, target: &str) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Jlt, Register::R0)
                .imm(Immediate::unsigned_indeterminate(value))
                .target(target),
        )
    }

    /// Append a branch to `target` if R0 has any bits set that are also
    /// set in `value`.
    pub fn add_jump_if_r0_any_bits_set(&mut self, value: i64, target: &str) -> Result<&mut Self> {
        let imm = Immediate::twos_complement_unsigned(value)?;
        self.append(Instruction::new(Opcode::Jset, Register::R0).imm(imm).target(target))
    }

    /// Append a branch to `target` if R0 equals R1.
    pub fn add_jump_if_r0_equals_r1(&mut self, target: &str) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Jeq, Register::R1).target(target))
    }

    /// Append a branch to `target` if R0 does not equal R1.
    pub fn add_jump_if_r0_not_equals_r1(&mut self, target: &str) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Jne, Register::R1).target(target))
    }

    /// Append a branch to `target` if R0 is greater than R1.
    pub fn add_jump_if_r0_greater_than_r1(&mut self, target: &str) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Jgt, Register::R1).target(target))
    }

    /// Append a branch to `target` if R0 is less than R1.
    pub fn add_jump_if_r0_less_than_r1(&mut self, target: &str) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Jlt, Register::R1).target(target))
    }

    /// Append a branch to `target` if R0 has any bits set that are also
    /// set in R1.
    pub fn add_jump_if_r0_any_bits_set_r1(&mut self, target: &str) -> Result<&mut Self> {
        self.append(Instruction::new(Opcode::Jset, Register::R1).target(target))
    }

    /// Append a branch to `target` if the packet bytes starting at the
    /// offset in R0 do not match `bytes`.
    pub fn add_jump_if_bytes_at_r0_not_equal(
        &mut self,
        bytes: &[u8],
        target: &str,
    ) -> Result<&mut Self> {
        self.append(
            Instruction::new(Opcode::Jnebs, Register::R0)
                .imm(Immediate::unsigned_indeterminate(bytes.len() as u32))
                .target(target)
                .payload(bytes.to_vec()),
        )
    }

    /// Append a load of memory slot `slot` into `register`.
    pub fn add_load_from_memory(&mut self, register: Register, slot: u32) -> Result<&mut Self> {
        let instruction = Self::ext_slot(ExtendedOpcode::Ldm, slot, register)?;
        self.append(instruction)
    }

    /// Append a store of `register` into memory slot `slot`.
    pub fn add_store_to_memory(&mut self, register: Register, slot: u32) -> Result<&mut Self> {
        let instruction = Self::ext_slot(ExtendedOpcode::Stm, slot, register)?;
        self.append(instruction)
    }

    /// Append a bitwise not of `register`.
    pub fn add_not(&mut self, register: Register) -> Result<&mut Self> {
        self.append(Instruction::ext(ExtendedOpcode::Not, register))
    }

    /// Append a negation of `register`.
    pub fn add_neg(&mut self, register: Register) -> Result<&mut Self> {
        self.append(Instruction::ext(ExtendedOpcode::Neg, register))
    }

    /// Append a swap of R0 and R1.
    pub fn add_swap(&mut self) -> Result<&mut Self> {
        self.append(Instruction::ext(ExtendedOpcode::Swap, Register::R0))
    }

    /// Append a move of the other register's value into `register`.
    pub fn add_move(&mut self, register: Register) -> Result<&mut Self> {
        self.append(Instruction::ext(ExtendedOpcode::Move, register))
    }

    /// Append an instruction that immediately terminates with PASS.
    pub fn add_pass(&mut self) -> Result<&mut Self> {
        // PASS shares its opcode with DROP and is selected by R0.
        self.append(Instruction::new(Opcode::Pass, Register::R0))
    }

    /// Append an instruction that increments counter `counter` and
    /// immediately terminates with PASS.
    pub fn add_count_and_pass(&mut self, counter: u32) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        check_range("counter number", counter as i64, 1, 1000)?;
        self.append(
            Instruction::new(Opcode::Pass, Register::R0)
                .imm(Immediate::unsigned_indeterminate(counter)),
        )
    }

    /// Append an instruction that immediately terminates with DROP.
    pub fn add_drop(&mut self) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        // DROP shares its opcode with PASS and is selected by R1.
        self.append(Instruction::new(Opcode::Drop, Register::R1))
    }

    /// Append an instruction that increments counter `counter` and
    /// immediately terminates with DROP.
    pub fn add_count_and_drop(&mut self, counter: u32) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        check_range("counter number", counter as i64, 1, 1000)?;
        self.append(
            Instruction::new(Opcode::Drop, Register::R1)
                .imm(Immediate::unsigned_indeterminate(counter)),
        )
    }

    /// Append an allocation of the output buffer with the length taken
    /// from R0.
    pub fn add_allocate_r0(&mut self) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        self.append(Instruction::ext(ExtendedOpcode::Allocate, Register::R0))
    }

    /// Append an allocation of an output buffer of `size` bytes.
    pub fn add_allocate(&mut self, size: u16) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        // R1 selects the form with the trailing u16 length.
        self.append(
            Instruction::ext(ExtendedOpcode::Allocate, Register::R1)
                .imm(Immediate::unsigned_be16(size)),
        )
    }

    /// Declare the data region: a JMP with the register bit set whose
    /// immediate is the payload length, which the interpreter skips over.
    /// Must be the first instruction of the program.
    pub fn add_data(&mut self, data: Vec<u8>) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        if !self.instructions.is_empty() {
            return Err(AssemblerError::DataInstructionMustBeFirst);
        }
        self.append(
            Instruction::new(Opcode::Jmp, Register::R1)
                .imm(Immediate::unsigned_indeterminate(data.len() as u32))
                .payload(data),
        )
    }

    /// Append a transmit-and-deallocate of the output buffer.
    pub fn add_transmit(&mut self) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        // TRANSMIT shares its extended opcode with DISCARD and uses R0.
        self.append(Instruction::ext(ExtendedOpcode::Transmit, Register::R0))
    }

    /// Append a discard-and-deallocate of the output buffer.
    pub fn add_discard(&mut self) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        // DISCARD shares its extended opcode with TRANSMIT and uses R1.
        self.append(Instruction::ext(ExtendedOpcode::Discard, Register::R1))
    }

    /// Append a write of `value` to the output buffer as a `width`-byte
    /// big-endian quantity, `width` being 1, 2 or 4.
    pub fn add_write(&mut self, value: u32, width: u8) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        let imm = match width {
            1 if value <= 0xFF => Immediate::unsigned8(value as u8),
            2 if value <= 0xFFFF => Immediate::unsigned_be16(value as u16),
            4 => Immediate::unsigned_be32(value),
            1 | 2 => return Err(AssemblerError::ValueUnfitForWidth { value, width }),
            _ => return Err(AssemblerError::InvalidWriteWidth(width)),
        };
        self.append(Instruction::new(Opcode::Write, Register::R0).imm(imm))
    }

    /// Append a write of the low `width` bytes of `register` to the
    /// output buffer, `width` being 1, 2 or 4.
    pub fn add_write_from(&mut self, register: Register, width: u8) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        let extended = match width {
            1 => ExtendedOpcode::Ewrite1,
            2 => ExtendedOpcode::Ewrite2,
            4 => ExtendedOpcode::Ewrite4,
            _ => return Err(AssemblerError::InvalidWriteWidth(width)),
        };
        self.append(Instruction::ext(extended, register))
    }

    /// Append a copy of `length` bytes from packet offset `src_offset`
    /// into the output buffer.
    pub fn add_packet_copy(&mut self, src_offset: u32, length: u32) -> Result<&mut Self> {
        self.add_mem_copy(src_offset, length, Register::R0)
    }

    /// Append a copy of `length` bytes from data-region offset
    /// `src_offset` into the output buffer.
    pub fn add_data_copy(&mut self, src_offset: u32, length: u32) -> Result<&mut Self> {
        self.add_mem_copy(src_offset, length, Register::R1)
    }

    fn add_mem_copy(&mut self, src_offset: u32, length: u32, register: Register) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        check_copy_length(length)?;
        let instruction = Instruction::new(Opcode::MemCopy, register)
            .imm(copy_offset_imm(src_offset))
            .imm(Immediate::unsigned8(length as u8));
        self.append(instruction)
    }

    /// Append a copy of `length` bytes into the output buffer from the
    /// packet at the offset in `register` plus `offset`.
    pub fn add_packet_copy_indexed(
        &mut self,
        register: Register,
        offset: u32,
        length: u32,
    ) -> Result<&mut Self> {
        self.add_ext_copy(ExtendedOpcode::EpktCopy, register, offset, length)
    }

    /// Append a copy of `length` bytes into the output buffer from the
    /// data region at the offset in `register` plus `offset`.
    pub fn add_data_copy_indexed(
        &mut self,
        register: Register,
        offset: u32,
        length: u32,
    ) -> Result<&mut Self> {
        self.add_ext_copy(ExtendedOpcode::EdataCopy, register, offset, length)
    }

    fn add_ext_copy(
        &mut self,
        extended: ExtendedOpcode,
        register: Register,
        offset: u32,
        length: u32,
    ) -> Result<&mut Self> {
        self.require_version(MIN_APF_VERSION_IN_DEV)?;
        check_copy_length(length)?;
        let instruction = Instruction::ext(extended, register)
            .imm(copy_offset_imm(offset))
            .imm(Immediate::unsigned8(length as u8));
        self.append(instruction)
    }

    /// Append a load of 32 bits from data memory into `register`; the
    /// source address is the other register plus the signed `offset`.
    /// Requires APF v4 or greater.
    pub fn add_load_data(&mut self, register: Register, offset: i32) -> Result<&mut Self> {
        self.require_version(APF_VERSION_4)?;
        self.append(
            Instruction::new(Opcode::Lddw, register).imm(Immediate::signed_indeterminate(offset)),
        )
    }

    /// Append a store of 32 bits from `register` into data memory; the
    /// destination address is the other register plus the signed `offset`.
    /// Requires APF v4 or greater.
    pub fn add_store_data(&mut self, register: Register, offset: i32) -> Result<&mut Self> {
        self.require_version(APF_VERSION_4)?;
        self.append(
            Instruction::new(Opcode::Stdw, register).imm(Immediate::signed_indeterminate(offset)),
        )
    }

    /// Assign every instruction its offset under the current widths;
    /// returns the resulting program length.
    fn update_instruction_offsets(&mut self) -> usize {
        let mut offset = 0;
        for instruction in &mut self.instructions {
            instruction.offset = offset;
            offset += instruction.size();
        }
        offset
    }

    /// Run one layout pass and return the program length. An overestimate:
    /// [`generate`](Self::generate) may shrink branches further. Does not
    /// finalize the builder.
    pub fn program_length_overestimate(&mut self) -> usize {
        self.update_instruction_offsets()
    }

    /// Signed distance from the end of `instructions[index]` to its
    /// branch target under the current layout, or `None` for non-branch
    /// instructions.
    fn target_distance(&self, index: usize) -> Result<Option<i32>> {
        let instruction = &self.instructions[index];
        let label = match instruction.target_label() {
            Some(label) => label,
            None => return Ok(None),
        };
        // The sentinels win over user labels of the same name.
        let target_offset = if label == DROP_LABEL {
            self.drop_offset
        } else if label == PASS_LABEL {
            self.pass_offset
        } else {
            match self.labels.get(label) {
                Some(&anchor) => self.instructions[anchor].offset,
                None => return Err(AssemblerError::LabelNotFound(label.to_string())),
            }
        };
        let end = instruction.offset + instruction.size();
        Ok(Some(target_offset as i32 - end as i32))
    }

    /// Assemble the program and return its bytecode.
    ///
    /// Runs the layout fixed point: shrinking one branch moves later
    /// instructions closer, which can let other branches shrink, so the
    /// pass repeats until nothing changes (bounded by
    /// [`MAX_SHRINK_ITERATIONS`]). Emission is one-shot: widths only ever
    /// shrink, and appending more code would push the PASS/DROP anchors
    /// back out of reach of the narrowed offsets.
    pub fn generate(&mut self) -> Result<Vec<u8>> {
        if self.generated {
            return Err(AssemblerError::AlreadyGenerated);
        }
        self.generated = true;
        let mut total_size;
        let mut iterations_remaining = MAX_SHRINK_ITERATIONS;
        loop {
            total_size = self.update_instruction_offsets();
            self.pass_offset = total_size;
            self.drop_offset = total_size + 1;
            if iterations_remaining == 0 {
                break;
            }
            iterations_remaining -= 1;
            let mut shrunk = false;
            for index in 0..self.instructions.len() {
                if let Some(distance) = self.target_distance(index)? {
                    if self.instructions[index].shrink(distance) {
                        shrunk = true;
                    }
                }
            }
            if !shrunk {
                break;
            }
        }
        let mut bytecode = vec![0u8; total_size];
        for index in 0..self.instructions.len() {
            let distance = self.target_distance(index)?;
            self.instructions[index].write(&mut bytecode, distance);
        }
        Ok(bytecode)
    }
}

fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if value >= min && value <= max {
        return Ok(());
    }
    Err(AssemblerError::ValueOutOfRange {
        name,
        value,
        min,
        max,
    })
}

fn check_copy_length(length: u32) -> Result<()> {
    check_range("copy length", length as i64, 0, 255)
}

/// A zero copy-source offset is still encoded in one byte.
fn copy_offset_imm(offset: u32) -> Immediate {
    if offset == 0 {
        Immediate::unsigned8(0)
    } else {
        Immediate::unsigned_indeterminate(offset)
    }
}
