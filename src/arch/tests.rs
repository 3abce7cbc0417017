//! Opcode table dispatch tests

use crate::arch::{Context, DecodeError, OpcodeTable, Result};
use crate::ast::{Instruction, Operand};
use crate::memory::Buffer;

fn bare(ctx: &Context<'_, u8>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![]))
}

fn low_nibble(ctx: &Context<'_, u8>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![Operand::imm(ctx.unit & 0x0F)]))
}

fn wide(ctx: &Context<'_, u8>) -> Result<Instruction> {
    let operand = ctx.next_unit(1)?;

    Ok(ctx.instruction(2, vec![Operand::imm(operand)]))
}

fn table() -> OpcodeTable<u8> {
    let mut table = OpcodeTable::new();

    table
        .register(0xF0, 0x10, "general", low_nibble)
        .register(0xFF, 0x1F, "special", bare)
        .register(0xF0, 0x10, "shadowed", bare)
        .register(0xFF, 0x20, "wide", wide);

    table
}

#[test]
fn most_specific_entry_wins() {
    let table = table();

    assert_eq!(table.lookup(0x1F).map(|e| e.mnemonic()), Some("special"));
    assert_eq!(table.lookup(0x13).map(|e| e.mnemonic()), Some("general"));
    assert!(table.lookup(0x30).is_none());
}

#[test]
fn first_registered_wins_ties() {
    let table = table();

    for unit in 0x10..0x1F {
        assert_eq!(table.lookup(unit).map(|e| e.mnemonic()), Some("general"));
    }
}

#[test]
fn registration_order_does_not_affect_specificity() {
    let mut table = OpcodeTable::<u8>::new();
    table
        .register(0xFF, 0x1F, "special", bare)
        .register(0xF0, 0x10, "general", low_nibble);

    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup(0x1F).map(|e| e.mnemonic()), Some("special"));
    assert_eq!(table.lookup(0x1E).map(|e| e.mnemonic()), Some("general"));
}

#[test]
fn decode_dispatches_to_callback() {
    let table = table();
    let buffer = Buffer::flat(vec![0x13, 0x20, 0x7F, 0x20], 0x100);

    let general = table.decode(&buffer, 0x100).unwrap();
    assert_eq!(general.mnemonic(), "general");
    assert_eq!(general.operand(0), Some(&Operand::Immediate(3)));

    let wide = table.decode(&buffer, 0x101).unwrap();
    assert_eq!(wide.size(), 2);
    assert_eq!(wide.operand(0), Some(&Operand::Immediate(0x7F)));

    assert_eq!(
        table.decode(&buffer, 0x102),
        Err(DecodeError::invalid_opcode(0x102, 0x7F))
    );
    assert_eq!(
        table.decode(&buffer, 0x103),
        Err(DecodeError::truncated(0x103, 2, 1))
    );
    assert_eq!(
        table.decode(&buffer, 0x104),
        Err(DecodeError::truncated(0x104, 1, 0))
    );
}

#[test]
fn empty_table_rejects_everything() {
    let table = OpcodeTable::<u16>::default();
    let buffer = Buffer::flat(vec![0x00, 0x00], 0);

    assert!(table.is_empty());
    assert!(matches!(
        table.decode(&buffer, 0),
        Err(DecodeError::InvalidOpcode { unit: 0, .. })
    ));
}
