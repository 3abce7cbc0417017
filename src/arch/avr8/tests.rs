//! AVR8 test suite

use crate::arch::avr8::{Avr8, OPCODES};
use crate::arch::{Assembler, DecodeError};
use crate::ast::{Instruction, InstructionFlags as Flags, Operand as op};
use crate::memory::Buffer;

fn decode_at(data: Vec<u8>, address: u64) -> Result<Instruction, DecodeError> {
    let mut padded = vec![0; address as usize];
    padded.extend(data);

    Avr8.decode(&Buffer::flat(padded, 0), address)
}

macro_rules! assert_avr {
    ($data: expr, $mnemonic: expr, $size: expr, [$($operand: expr),*]) => {
        assert_avr_at!($data, 0, $mnemonic, $size, [$($operand),*])
    };
}

macro_rules! assert_avr_at {
    ($data: expr, $address: expr, $mnemonic: expr, $size: expr, [$($operand: expr),*]) => {{
        let instr = decode_at($data, $address).unwrap();
        let expected: Vec<op> = vec![$($operand),*];

        assert_eq!(instr.mnemonic(), $mnemonic);
        assert_eq!(instr.size(), $size);
        assert_eq!(instr.iter_operands().cloned().collect::<Vec<_>>(), expected);

        instr
    }};
}

macro_rules! assert_avr_err {
    ($data: expr, $error: pat) => {
        assert!(matches!(decode_at($data, 0).unwrap_err(), $error))
    };
}

fn r(n: u16) -> op {
    op::Register(format!("r{}", n))
}

#[test]
fn avr8_implied() {
    let ret = assert_avr!(vec![0x08, 0x95], "ret", 2, []);
    assert_eq!(ret.address(), 0);
    assert!(ret.is_return());
    assert!(!ret.falls_through());

    assert_avr!(vec![0x00, 0x00], "nop", 2, []);
    assert_avr!(vec![0x18, 0x95], "reti", 2, []);
    assert_avr!(vec![0x88, 0x95], "sleep", 2, []);
    assert_avr!(vec![0xA8, 0x95], "wdr", 2, []);
    assert_avr!(vec![0xC8, 0x95], "lpm", 2, []);

    let icall = assert_avr!(vec![0x09, 0x95], "icall", 2, []);
    assert!(icall.is_call());
    assert_eq!(icall.target(), None);

    let ijmp = assert_avr!(vec![0x09, 0x94], "ijmp", 2, []);
    assert!(ijmp.is_jump());
    assert!(!ijmp.falls_through());
}

#[test]
fn avr8_alu() {
    assert_avr!(vec![0x12, 0x0C], "add", 2, [r(1), r(2)]);
    assert_avr!(vec![0xFF, 0x0F], "add", 2, [r(31), r(31)]);
    assert_avr!(vec![0x11, 0x24], "eor", 2, [r(1), r(1)]);
    assert_avr!(vec![0xCF, 0x01], "movw", 2, [r(24), r(30)]);
    assert_avr!(vec![0x02, 0xE1], "ldi", 2, [r(16), op::Immediate(0x12)]);
    assert_avr!(vec![0x8F, 0x3F], "cpi", 2, [r(24), op::Immediate(0xFF)]);
    assert_avr!(vec![0x01, 0x96], "adiw", 2, [r(24), op::Immediate(1)]);
    assert_avr!(vec![0x83, 0x95], "inc", 2, [r(24)]);
}

#[test]
fn avr8_aliases_win_by_specificity() {
    // ldi r16, 0xFF
    assert_avr!(vec![0x0F, 0xEF], "ser", 2, [r(16)]);
    assert_avr!(vec![0x1F, 0xEF], "ser", 2, [r(17)]);
    assert_avr!(vec![0x0F, 0xE0], "ldi", 2, [r(16), op::Immediate(0x0F)]);

    assert_avr!(vec![0x78, 0x94], "sei", 2, []);
    assert_avr!(vec![0x38, 0x94], "bset", 2, [op::Immediate(3)]);
    assert_avr!(vec![0xB8, 0x94], "bclr", 2, [op::Immediate(3)]);

    assert_avr!(vec![0x03, 0xF0], "brbs", 2, [op::Immediate(3), op::rel(0, 2)]);
}

#[test]
fn avr8_memory() {
    let ldd = assert_avr!(vec![0x8B, 0x81], "ldd", 2, [r(24), op::based("Y", 3)]);
    assert_eq!(ldd.to_string(), "ldd r24, [Y+0x3]");

    assert_avr!(vec![0x88, 0x81], "ld", 2, [r(24), op::based("Y", 0)]);
    assert_avr!(vec![0x80, 0x83], "st", 2, [op::based("Z", 0), r(24)]);
    assert_avr!(vec![0x0D, 0x90], "ld", 2, [r(0), op::post_inc("X")]);
    assert_avr!(vec![0x0E, 0x92], "st", 2, [op::pre_dec("X"), r(0)]);
    assert_avr!(vec![0x05, 0x90], "lpm", 2, [r(0), op::post_inc("Z")]);
    assert_avr!(vec![0xCF, 0x93], "push", 2, [r(28)]);
    assert_avr!(vec![0xCF, 0x91], "pop", 2, [r(28)]);

    assert_avr!(
        vec![0x80, 0x91, 0x00, 0x01],
        "lds",
        4,
        [r(24), op::mem(0x100)]
    );
    assert_avr!(
        vec![0x80, 0x93, 0x00, 0x01],
        "sts",
        4,
        [op::mem(0x100), r(24)]
    );
}

#[test]
fn avr8_io() {
    assert_avr!(vec![0x0F, 0xBE], "out", 2, [op::Immediate(0x3F), r(0)]);
    assert_avr!(vec![0x0F, 0xB6], "in", 2, [r(0), op::Immediate(0x3F)]);
    assert_avr!(vec![0x2D, 0x9A], "sbi", 2, [op::Immediate(5), op::Immediate(5)]);
}

#[test]
fn avr8_control_flow() {
    let rjmp = assert_avr!(vec![0xFF, 0xCF], "rjmp", 2, [op::rel(-2, 0)]);
    assert!(!rjmp.falls_through());
    assert_eq!(rjmp.target(), Some(0));

    let rcall = assert_avr_at!(vec![0x04, 0xD0], 0x10, "rcall", 2, [op::rel(8, 0x1A)]);
    assert!(rcall.is_call());
    assert!(rcall.falls_through());

    let call = assert_avr!(vec![0x0E, 0x94, 0x80, 0x00], "call", 4, [op::cptr(0x100)]);
    assert_eq!(call.target(), Some(0x100));
    assert_eq!(call.end_address(), 4);

    let jmp = assert_avr!(vec![0x0C, 0x94, 0x00, 0x00], "jmp", 4, [op::cptr(0)]);
    assert!(!jmp.falls_through());

    let breq = assert_avr!(vec![0x09, 0xF0], "breq", 2, [op::rel(2, 4)]);
    assert_eq!(breq.flags(), Flags::JUMP | Flags::CONDITIONAL);
    assert!(breq.falls_through());

    assert_avr!(vec![0xF9, 0xF7], "brne", 2, [op::rel(-2, 0)]);
}

#[test]
fn avr8_backward_branch_wraps_within_flash() {
    // rjmp .-4 at 0 in an 8-byte image
    let rjmp = assert_avr!(
        vec![0xFE, 0xCF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        "rjmp",
        2,
        [op::rel(-4, 6)]
    );
    assert_eq!(rjmp.target(), Some(6));

    // brne .-6 at 2
    let brne = assert_avr_at!(vec![0xE1, 0xF7, 0x00, 0x00], 2, "brne", 2, [op::rel(-6, 4)]);
    assert_eq!(brne.target(), Some(4));
}

#[test]
fn avr8_errors() {
    assert_avr_err!(
        vec![0xFF, 0xFF],
        DecodeError::InvalidOpcode {
            address: 0,
            unit: 0xFFFF
        }
    );
    assert_avr_err!(vec![0x01, 0x00], DecodeError::InvalidOpcode { unit: 0x0001, .. });
    assert_avr_err!(vec![0x03, 0x90], DecodeError::InvalidOpcode { unit: 0x9003, .. });

    assert_avr_err!(
        vec![0x0C, 0x94],
        DecodeError::TruncatedInstruction {
            address: 0,
            needed: 4,
            available: 2
        }
    );
    assert_avr_err!(
        vec![0x08],
        DecodeError::TruncatedInstruction {
            needed: 2,
            available: 1,
            ..
        }
    );
    assert_avr_err!(vec![], DecodeError::TruncatedInstruction { available: 0, .. });
}

#[test]
fn avr8_decoding_is_deterministic() {
    let buffer = Buffer::flat(vec![0x0E, 0x94, 0x80, 0x00, 0x08, 0x95], 0);

    for address in [0, 2, 4] {
        assert_eq!(Avr8.decode(&buffer, address), Avr8.decode(&buffer, address));
    }

    assert_eq!(Avr8.decode(&buffer, 0), OPCODES.decode(&buffer, 0));
}
