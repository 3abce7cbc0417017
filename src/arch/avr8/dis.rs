//! AVR8 opcode table and operand decoders

use crate::arch::{Context, DecodeError, OpcodeTable, Result};
use crate::ast::{Instruction, InstructionFlags as Flags, Operand as op};
use crate::Address;

type Ctx<'a> = Context<'a, u16>;

fn reg(n: u16) -> op {
    op::Register(format!("r{}", n))
}

/// 5-bit destination register, bits 8..4.
fn rd5(unit: u16) -> u16 {
    (unit >> 4) & 0x1F
}

/// 5-bit source register, bit 9 and bits 3..0.
fn rr5(unit: u16) -> u16 {
    (unit & 0x0F) | ((unit >> 5) & 0x10)
}

/// Upper-half register (r16-r31) used by the immediate forms.
fn rd4(unit: u16) -> u16 {
    16 + ((unit >> 4) & 0x0F)
}

/// 8-bit immediate split around the register field.
fn k8(unit: u16) -> u16 {
    ((unit >> 4) & 0xF0) | (unit & 0x0F)
}

/// 6-bit I/O port number used by `in` and `out`.
fn io6(unit: u16) -> u16 {
    ((unit >> 5) & 0x30) | (unit & 0x0F)
}

fn sign_extend(value: u16, bits: u32) -> i64 {
    let shift = 16 - bits;

    (((value << shift) as i16) >> shift) as i64
}

/// Byte size of the 22-bit program counter's address space.
const PC_SPACE: Address = 1 << 23;

/// Resolve a word displacement against the following instruction.
///
/// The program counter wraps within flash, so a branch back past address 0
/// lands at the top of the segment holding the branch.
fn relative(ctx: &Ctx<'_>, words: i64) -> op {
    let offset = words * 2;
    let target = ctx.address as i64 + 2 + offset;

    let target = if target < 0 {
        let flash = ctx
            .buffer
            .segment_containing(ctx.address)
            .map_or(PC_SPACE, |segment| segment.end_address());

        target.rem_euclid(flash as i64) as Address
    } else {
        target as Address
    };

    op::rel(offset, target)
}

/// 22-bit word address of `jmp` and `call`, as a byte address.
fn long_target(ctx: &Ctx<'_>) -> Result<Address> {
    let high = (((ctx.unit >> 3) & 0x3E) | (ctx.unit & 0x01)) as Address;
    let low = ctx.next_unit(1)? as Address;

    Ok(((high << 16) | low) * 2)
}

/// Pointer register operand of the indirect load/store group.
fn pointer(ctx: &Ctx<'_>) -> Result<op> {
    match ctx.unit & 0x0F {
        0x1 => Ok(op::post_inc("Z")),
        0x2 => Ok(op::pre_dec("Z")),
        0x4 | 0x6 => Ok(op::based("Z", 0)),
        0x5 | 0x7 => Ok(op::post_inc("Z")),
        0x9 => Ok(op::post_inc("Y")),
        0xA => Ok(op::pre_dec("Y")),
        0xC => Ok(op::based("X", 0)),
        0xD => Ok(op::post_inc("X")),
        0xE => Ok(op::pre_dec("X")),
        _ => Err(DecodeError::invalid_opcode(ctx.address, ctx.unit as u64)),
    }
}

/// `Y+q` or `Z+q`, where bit 3 selects Y.
fn displaced(unit: u16) -> op {
    let base = if unit & 0x0008 != 0 { "Y" } else { "Z" };
    let q = ((unit >> 8) & 0x20) | ((unit >> 7) & 0x18) | (unit & 0x07);

    op::based(base, q as i64)
}

fn implied(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![]))
}

fn ret(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![]).with_flags(Flags::RETURN))
}

fn icall(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![]).with_flags(Flags::CALL))
}

fn ijmp(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![]).with_flags(Flags::JUMP))
}

fn rd(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd5(ctx.unit))]))
}

fn rd_rr(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd5(ctx.unit)), reg(rr5(ctx.unit))]))
}

fn rd_k(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd4(ctx.unit)), op::imm(k8(ctx.unit))]))
}

fn ser(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd4(ctx.unit))]))
}

fn movw(ctx: &Ctx<'_>) -> Result<Instruction> {
    let d = ((ctx.unit >> 4) & 0x0F) * 2;
    let r = (ctx.unit & 0x0F) * 2;

    Ok(ctx.instruction(1, vec![reg(d), reg(r)]))
}

fn muls(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd4(ctx.unit)), reg(16 + (ctx.unit & 0x0F))]))
}

/// `mulsu` and the fractional multiplies: r16-r23 only.
fn fmul(ctx: &Ctx<'_>) -> Result<Instruction> {
    let d = 16 + ((ctx.unit >> 4) & 0x07);
    let r = 16 + (ctx.unit & 0x07);

    Ok(ctx.instruction(1, vec![reg(d), reg(r)]))
}

/// `adiw`/`sbiw` on the r24-r31 register pairs.
fn word_k(ctx: &Ctx<'_>) -> Result<Instruction> {
    let d = 24 + ((ctx.unit >> 4) & 0x03) * 2;
    let k = ((ctx.unit >> 2) & 0x30) | (ctx.unit & 0x0F);

    Ok(ctx.instruction(1, vec![reg(d), op::imm(k)]))
}

fn io_bit(ctx: &Ctx<'_>) -> Result<Instruction> {
    let port = (ctx.unit >> 3) & 0x1F;
    let bit = ctx.unit & 0x07;

    Ok(ctx.instruction(1, vec![op::imm(port), op::imm(bit)]))
}

fn input(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd5(ctx.unit)), op::imm(io6(ctx.unit))]))
}

fn output(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![op::imm(io6(ctx.unit)), reg(rd5(ctx.unit))]))
}

fn rjmp(ctx: &Ctx<'_>) -> Result<Instruction> {
    let words = sign_extend(ctx.unit & 0x0FFF, 12);

    Ok(ctx.instruction(1, vec![relative(ctx, words)]).with_flags(Flags::JUMP))
}

fn rcall(ctx: &Ctx<'_>) -> Result<Instruction> {
    let words = sign_extend(ctx.unit & 0x0FFF, 12);

    Ok(ctx.instruction(1, vec![relative(ctx, words)]).with_flags(Flags::CALL))
}

/// `brbs`/`brbc`: the status bit is an explicit operand.
fn branch_status(ctx: &Ctx<'_>) -> Result<Instruction> {
    let words = sign_extend((ctx.unit >> 3) & 0x7F, 7);

    Ok(ctx
        .instruction(1, vec![op::imm(ctx.unit & 0x07), relative(ctx, words)])
        .with_flags(Flags::JUMP | Flags::CONDITIONAL))
}

/// Named branches, where the mnemonic implies the status bit.
fn branch(ctx: &Ctx<'_>) -> Result<Instruction> {
    let words = sign_extend((ctx.unit >> 3) & 0x7F, 7);

    Ok(ctx
        .instruction(1, vec![relative(ctx, words)])
        .with_flags(Flags::JUMP | Flags::CONDITIONAL))
}

fn jmp(ctx: &Ctx<'_>) -> Result<Instruction> {
    let target = long_target(ctx)?;

    Ok(ctx.instruction(2, vec![op::cptr(target)]).with_flags(Flags::JUMP))
}

fn call(ctx: &Ctx<'_>) -> Result<Instruction> {
    let target = long_target(ctx)?;

    Ok(ctx.instruction(2, vec![op::cptr(target)]).with_flags(Flags::CALL))
}

fn lds(ctx: &Ctx<'_>) -> Result<Instruction> {
    let k = ctx.next_unit(1)?;

    Ok(ctx.instruction(2, vec![reg(rd5(ctx.unit)), op::mem(k as Address)]))
}

fn sts(ctx: &Ctx<'_>) -> Result<Instruction> {
    let k = ctx.next_unit(1)?;

    Ok(ctx.instruction(2, vec![op::mem(k as Address), reg(rd5(ctx.unit))]))
}

fn load(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd5(ctx.unit)), pointer(ctx)?]))
}

fn store(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![pointer(ctx)?, reg(rd5(ctx.unit))]))
}

fn load_displaced(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd5(ctx.unit)), displaced(ctx.unit)]))
}

fn store_displaced(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![displaced(ctx.unit), reg(rd5(ctx.unit))]))
}

/// Atomic read-modify-write through Z.
fn exchange(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![op::based("Z", 0), reg(rd5(ctx.unit))]))
}

fn status_bit(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![op::imm((ctx.unit >> 4) & 0x07)]))
}

fn reg_bit(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![reg(rd5(ctx.unit)), op::imm(ctx.unit & 0x07)]))
}

fn des(ctx: &Ctx<'_>) -> Result<Instruction> {
    Ok(ctx.instruction(1, vec![op::imm((ctx.unit >> 4) & 0x0F)]))
}

lazy_static! {
    /// The AVR8 instruction set.
    ///
    /// Aliases that fix more bits than their general form (`ser` over `ldi`,
    /// `breq` over `brbs`, `sei` over `bset`) win by specificity, so their
    /// position in the table does not matter.
    pub static ref OPCODES: OpcodeTable<u16> = opcodes();
}

fn opcodes() -> OpcodeTable<u16> {
    let mut table = OpcodeTable::new();

    table
        .register(0xFFFF, 0x0000, "nop", implied)
        .register(0xFF00, 0x0100, "movw", movw)
        .register(0xFF00, 0x0200, "muls", muls)
        .register(0xFF88, 0x0300, "mulsu", fmul)
        .register(0xFF88, 0x0308, "fmul", fmul)
        .register(0xFF88, 0x0380, "fmuls", fmul)
        .register(0xFF88, 0x0388, "fmulsu", fmul)
        .register(0xFC00, 0x0400, "cpc", rd_rr)
        .register(0xFC00, 0x0800, "sbc", rd_rr)
        .register(0xFC00, 0x0C00, "add", rd_rr)
        .register(0xFC00, 0x1000, "cpse", rd_rr)
        .register(0xFC00, 0x1400, "cp", rd_rr)
        .register(0xFC00, 0x1800, "sub", rd_rr)
        .register(0xFC00, 0x1C00, "adc", rd_rr)
        .register(0xFC00, 0x2000, "and", rd_rr)
        .register(0xFC00, 0x2400, "eor", rd_rr)
        .register(0xFC00, 0x2800, "or", rd_rr)
        .register(0xFC00, 0x2C00, "mov", rd_rr)
        .register(0xF000, 0x3000, "cpi", rd_k)
        .register(0xF000, 0x4000, "sbci", rd_k)
        .register(0xF000, 0x5000, "subi", rd_k)
        .register(0xF000, 0x6000, "ori", rd_k)
        .register(0xF000, 0x7000, "andi", rd_k)
        .register(0xFE0F, 0x8000, "ld", load_displaced)
        .register(0xFE0F, 0x8008, "ld", load_displaced)
        .register(0xFE0F, 0x8200, "st", store_displaced)
        .register(0xFE0F, 0x8208, "st", store_displaced)
        .register(0xD208, 0x8000, "ldd", load_displaced)
        .register(0xD208, 0x8008, "ldd", load_displaced)
        .register(0xD208, 0x8200, "std", store_displaced)
        .register(0xD208, 0x8208, "std", store_displaced)
        .register(0xFE0F, 0x9000, "lds", lds)
        .register(0xFE0F, 0x9001, "ld", load)
        .register(0xFE0F, 0x9002, "ld", load)
        .register(0xFE0F, 0x9004, "lpm", load)
        .register(0xFE0F, 0x9005, "lpm", load)
        .register(0xFE0F, 0x9006, "elpm", load)
        .register(0xFE0F, 0x9007, "elpm", load)
        .register(0xFE0F, 0x9009, "ld", load)
        .register(0xFE0F, 0x900A, "ld", load)
        .register(0xFE0F, 0x900C, "ld", load)
        .register(0xFE0F, 0x900D, "ld", load)
        .register(0xFE0F, 0x900E, "ld", load)
        .register(0xFE0F, 0x900F, "pop", rd)
        .register(0xFE0F, 0x9200, "sts", sts)
        .register(0xFE0F, 0x9201, "st", store)
        .register(0xFE0F, 0x9202, "st", store)
        .register(0xFE0F, 0x9204, "xch", exchange)
        .register(0xFE0F, 0x9205, "las", exchange)
        .register(0xFE0F, 0x9206, "lac", exchange)
        .register(0xFE0F, 0x9207, "lat", exchange)
        .register(0xFE0F, 0x9209, "st", store)
        .register(0xFE0F, 0x920A, "st", store)
        .register(0xFE0F, 0x920C, "st", store)
        .register(0xFE0F, 0x920D, "st", store)
        .register(0xFE0F, 0x920E, "st", store)
        .register(0xFE0F, 0x920F, "push", rd)
        .register(0xFE0F, 0x9400, "com", rd)
        .register(0xFE0F, 0x9401, "neg", rd)
        .register(0xFE0F, 0x9402, "swap", rd)
        .register(0xFE0F, 0x9403, "inc", rd)
        .register(0xFE0F, 0x9405, "asr", rd)
        .register(0xFE0F, 0x9406, "lsr", rd)
        .register(0xFE0F, 0x9407, "ror", rd)
        .register(0xFE0F, 0x940A, "dec", rd)
        .register(0xFF8F, 0x9408, "bset", status_bit)
        .register(0xFF8F, 0x9488, "bclr", status_bit)
        .register(0xFFFF, 0x9408, "sec", implied)
        .register(0xFFFF, 0x9488, "clc", implied)
        .register(0xFFFF, 0x9478, "sei", implied)
        .register(0xFFFF, 0x94F8, "cli", implied)
        .register(0xFF0F, 0x940B, "des", des)
        .register(0xFFFF, 0x9409, "ijmp", ijmp)
        .register(0xFFFF, 0x9419, "eijmp", ijmp)
        .register(0xFE0E, 0x940C, "jmp", jmp)
        .register(0xFE0E, 0x940E, "call", call)
        .register(0xFFFF, 0x9508, "ret", ret)
        .register(0xFFFF, 0x9518, "reti", ret)
        .register(0xFFFF, 0x9509, "icall", icall)
        .register(0xFFFF, 0x9519, "eicall", icall)
        .register(0xFFFF, 0x9588, "sleep", implied)
        .register(0xFFFF, 0x9598, "break", implied)
        .register(0xFFFF, 0x95A8, "wdr", implied)
        .register(0xFFFF, 0x95C8, "lpm", implied)
        .register(0xFFFF, 0x95D8, "elpm", implied)
        .register(0xFFFF, 0x95E8, "spm", implied)
        .register(0xFF00, 0x9600, "adiw", word_k)
        .register(0xFF00, 0x9700, "sbiw", word_k)
        .register(0xFF00, 0x9800, "cbi", io_bit)
        .register(0xFF00, 0x9900, "sbic", io_bit)
        .register(0xFF00, 0x9A00, "sbi", io_bit)
        .register(0xFF00, 0x9B00, "sbis", io_bit)
        .register(0xFC00, 0x9C00, "mul", rd_rr)
        .register(0xF800, 0xB000, "in", input)
        .register(0xF800, 0xB800, "out", output)
        .register(0xF000, 0xC000, "rjmp", rjmp)
        .register(0xF000, 0xD000, "rcall", rcall)
        .register(0xF000, 0xE000, "ldi", rd_k)
        .register(0xFF0F, 0xEF0F, "ser", ser)
        .register(0xFC00, 0xF000, "brbs", branch_status)
        .register(0xFC00, 0xF400, "brbc", branch_status)
        .register(0xFC07, 0xF000, "brcs", branch)
        .register(0xFC07, 0xF001, "breq", branch)
        .register(0xFC07, 0xF002, "brmi", branch)
        .register(0xFC07, 0xF004, "brlt", branch)
        .register(0xFC07, 0xF400, "brcc", branch)
        .register(0xFC07, 0xF401, "brne", branch)
        .register(0xFC07, 0xF402, "brpl", branch)
        .register(0xFC07, 0xF404, "brge", branch)
        .register(0xFE08, 0xF800, "bld", reg_bit)
        .register(0xFE08, 0xFA00, "bst", reg_bit)
        .register(0xFE08, 0xFC00, "sbrc", reg_bit)
        .register(0xFE08, 0xFE00, "sbrs", reg_bit);

    table
}
