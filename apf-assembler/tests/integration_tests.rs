//! Integration tests for the APF assembler.
//!
//! Expected byte sequences are written out against the interpreter's
//! encoding: leading byte `(opcode << 3) | (width_field << 1) | register`,
//! then the branch offset at the shared width, then immediates, then any
//! raw payload, everything big-endian.

use apf_assembler::{ApfGenerator, DROP_LABEL, PASS_LABEL};
use apf_spec::{Register, APF_VERSION_4, MIN_APF_VERSION, MIN_APF_VERSION_IN_DEV};

// ============================================================================
// Termination
// ============================================================================

#[test]
fn test_empty_program() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    assert_eq!(gen.generate().unwrap(), Vec::<u8>::new());
}

#[test]
fn test_single_pass() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_pass().unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x00]);
}

#[test]
fn test_single_drop() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_drop().unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x01]);
}

#[test]
fn test_count_and_pass() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_count_and_pass(5).unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x02, 0x05]);
}

#[test]
fn test_count_and_drop_wide_counter() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_count_and_drop(1000).unwrap();
    // Counter 1000 needs a 2-byte immediate.
    assert_eq!(gen.generate().unwrap(), vec![0x05, 0x03, 0xE8]);
}

// ============================================================================
// Loads and arithmetic
// ============================================================================

#[test]
fn test_load_immediate() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_load_immediate(Register::R0, 5).unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x6A, 0x05]);
}

#[test]
fn test_load_immediate_negative_one_is_one_byte() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_load_immediate(Register::R0, -1).unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x6A, 0xFF]);
}

#[test]
fn test_load_immediate_128_needs_two_signed_bytes() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_load_immediate(Register::R0, 128).unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x6C, 0x00, 0x80]);
}

#[test]
fn test_packet_loads() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_load8(Register::R0, 12).unwrap();
    // A zero offset collapses to zero immediate bytes.
    gen.add_load32(Register::R1, 0).unwrap();
    gen.add_load16_indexed(Register::R1, 256).unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0x0A, 0x0C, 0x19, 0x2D, 0x01, 0x00]
    );
}

#[test]
fn test_arithmetic_immediates() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_add(10).unwrap();
    gen.add_mul(3).unwrap();
    gen.add_left_shift(4).unwrap();
    gen.add_right_shift(3).unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0x3A, 0x0A, 0x42, 0x03, 0x62, 0x04, 0x62, 0xFD]
    );
}

#[test]
fn test_add_negative_uses_full_width() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_add(-1).unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x3E, 0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn test_register_register_arithmetic() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_add_r1().unwrap();
    gen.add_and_r1().unwrap();
    gen.add_left_shift_r1().unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x39, 0x51, 0x61]);
}

// ============================================================================
// Branches and labels
// ============================================================================

#[test]
fn test_jump_over_single_pass() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_jump("target").unwrap();
    gen.add_pass().unwrap();
    gen.define_label("target").unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0x72, 0x01, 0x00]);
}

#[test]
fn test_jump_to_pass_sentinel() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_jump_if_r0_equals(5, PASS_LABEL).unwrap();
    // The branch lands exactly at program end: the offset field is written
    // as zero at the shared one-byte width the immediate demands.
    assert_eq!(gen.generate().unwrap(), vec![0x7A, 0x00, 0x05]);
}

#[test]
fn test_jump_to_drop_sentinel() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_jump(DROP_LABEL).unwrap();
    // DROP resolves one byte past the program end.
    assert_eq!(gen.generate().unwrap(), vec![0x72, 0x01]);
}

#[test]
fn test_backward_jump_keeps_four_byte_offset() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.define_label("start").unwrap();
    gen.add_pass().unwrap();
    gen.add_jump("start").unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0x00, 0x76, 0xFF, 0xFF, 0xFF, 0xFA]
    );
}

#[test]
fn test_branch_over_jump_to_sentinels() {
    // Pass everything that is not ARP, drop ARP.
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_load16(Register::R0, 12)
        .unwrap()
        .add_jump_if_r0_not_equals(0x0806, PASS_LABEL)
        .unwrap()
        .add_jump(DROP_LABEL)
        .unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0x12, 0x0C, 0x84, 0x00, 0x02, 0x08, 0x06, 0x72, 0x01]
    );
}

#[test]
fn test_bytes_at_r0_compare() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_jump_if_bytes_at_r0_not_equal(&[0x01, 0x02], "next")
        .unwrap();
    gen.define_label("next").unwrap();
    gen.add_pass().unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0xA2, 0x00, 0x02, 0x01, 0x02, 0x00]
    );
}

#[test]
fn test_branch_shrink_convergence() {
    // A JEQ whose target starts out >255 bytes away, over a run of jumps
    // that themselves shrink until the target is in one-byte reach.
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_jump_if_r0_equals(0, "end").unwrap();
    for _ in 0..80 {
        gen.add_jump("end").unwrap();
    }
    gen.define_label("end").unwrap();

    let estimate = gen.program_length_overestimate();
    assert_eq!(estimate, 409);

    let program = gen.generate().unwrap();
    // Everything settles at one-byte offsets (the final jump at zero).
    assert_eq!(program.len(), 162);
    assert!(program.len() < estimate);
    // JEQ leading byte: opcode 15, width field 1, register 0.
    assert_eq!(program[0], 0x7A);
}

#[test]
fn test_program_offsets_sum_to_length() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_load8(Register::R0, 23).unwrap();
    gen.add_jump_if_r0_not_equals(17, "no_udp").unwrap();
    gen.add_count_and_drop(7).unwrap();
    gen.define_label("no_udp").unwrap();
    gen.add_pass().unwrap();
    let program = gen.generate().unwrap();
    // ldb (2) + jne (1 + 1 + 1) + drop-with-counter (2) + pass (1)
    assert_eq!(program.len(), 8);
}

// ============================================================================
// Memory slots and register-only operations
// ============================================================================

#[test]
fn test_memory_slot_access() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_load_from_memory(Register::R1, 5).unwrap();
    gen.add_store_to_memory(Register::R0, 13).unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0xAB, 0x05, 0xAA, 0x1D]);
}

#[test]
fn test_register_only_operations() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION).unwrap();
    gen.add_not(Register::R0).unwrap();
    gen.add_neg(Register::R1).unwrap();
    gen.add_swap().unwrap();
    gen.add_move(Register::R1).unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0xAA, 0x20, 0xAB, 0x21, 0xAA, 0x22, 0xAB, 0x23]
    );
}

// ============================================================================
// Output buffer lifecycle
// ============================================================================

#[test]
fn test_allocate_from_r0() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_allocate_r0().unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0xAA, 0x24]);
}

#[test]
fn test_allocate_with_immediate_size() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_allocate(1500).unwrap();
    // R1 selects the immediate form; the size is a fixed u16.
    assert_eq!(gen.generate().unwrap(), vec![0xAB, 0x24, 0x05, 0xDC]);
}

#[test]
fn test_transmit_and_discard() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_transmit().unwrap();
    gen.add_discard().unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0xAA, 0x25, 0xAB, 0x25]);
}

#[test]
fn test_write_immediates() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_write(0xFF, 1).unwrap();
    gen.add_write(0x1234, 2).unwrap();
    gen.add_write(0xDEADBEEF, 4).unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0xC0, 0xFF, 0xC0, 0x12, 0x34, 0xC0, 0xDE, 0xAD, 0xBE, 0xEF]
    );
}

#[test]
fn test_write_from_register() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_write_from(Register::R1, 2).unwrap();
    gen.add_write_from(Register::R0, 4).unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0xAB, 0x27, 0xAA, 0x28]);
}

#[test]
fn test_packet_and_data_copies() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_packet_copy(4, 10).unwrap();
    // A zero source offset is still encoded in one byte.
    gen.add_data_copy(0, 10).unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0xCA, 0x04, 0x0A, 0xC9, 0x00, 0x0A]
    );
}

#[test]
fn test_indexed_copies() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_packet_copy_indexed(Register::R1, 5, 10).unwrap();
    gen.add_data_copy_indexed(Register::R0, 0, 255).unwrap();
    assert_eq!(
        gen.generate().unwrap(),
        vec![0xAB, 0x29, 0x05, 0x0A, 0xAA, 0x2A, 0x00, 0xFF]
    );
}

// ============================================================================
// Data region and data memory
// ============================================================================

#[test]
fn test_data_region_comes_first() {
    let mut gen = ApfGenerator::new(MIN_APF_VERSION_IN_DEV).unwrap();
    gen.add_data(vec![0x01, 0x02, 0x03]).unwrap();
    gen.add_pass().unwrap();
    // JMP with R=1 carrying the data length, then the raw bytes.
    assert_eq!(
        gen.generate().unwrap(),
        vec![0x73, 0x03, 0x01, 0x02, 0x03, 0x00]
    );
}

#[test]
fn test_data_memory_access() {
    let mut gen = ApfGenerator::new(APF_VERSION_4).unwrap();
    gen.add_load_data(Register::R0, -4).unwrap();
    gen.add_store_data(Register::R1, 4).unwrap();
    assert_eq!(gen.generate().unwrap(), vec![0xB2, 0xFC, 0xBB, 0x04]);
}
