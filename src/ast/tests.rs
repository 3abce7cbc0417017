use crate::ast::{Instruction, InstructionFlags as Flags, Operand};

#[test]
fn fallthrough() {
    let call = Instruction::new(0, 4, "call", vec![Operand::cptr(0x100)]).with_flags(Flags::CALL);
    let jmp = Instruction::new(0, 2, "rjmp", vec![Operand::rel(4, 6)]).with_flags(Flags::JUMP);
    let breq = Instruction::new(0, 2, "breq", vec![Operand::rel(4, 6)])
        .with_flags(Flags::JUMP | Flags::CONDITIONAL);
    let ret = Instruction::new(0, 2, "ret", vec![]).with_flags(Flags::RETURN);

    assert!(call.falls_through());
    assert!(!jmp.falls_through());
    assert!(breq.falls_through());
    assert!(!ret.falls_through());

    assert_eq!(call.target(), Some(0x100));
    assert_eq!(breq.target(), Some(6));
    assert_eq!(ret.target(), None);
}

#[test]
fn immediate_operands_are_not_targets() {
    let push = Instruction::new(0x10, 5, "push", vec![Operand::imm(0x8048000u32)]);

    assert_eq!(push.target(), None);
}

#[test]
fn rip_relative_memory() {
    let lea = Instruction::new(
        0x1000,
        7,
        "lea",
        vec![Operand::reg("rdi"), Operand::based("rip", 0x20)],
    );

    let operand = lea.operand(1).unwrap();
    assert_eq!(lea.memory_address(operand), Some(0x1027));
    assert_eq!(lea.memory_address(&Operand::mem(0x4000)), Some(0x4000));
    assert_eq!(lea.memory_address(&Operand::based("rbx", 8)), None);
}

#[test]
fn comments_are_deduplicated() {
    let mut nop = Instruction::new(0, 2, "nop", vec![]);

    nop.add_comment("padding");
    nop.add_comment("padding");

    assert_eq!(nop.comments(), &["padding".to_string()][..]);
}

#[test]
fn display() {
    let ldd = Instruction::new(
        0,
        2,
        "ldd",
        vec![Operand::reg("r24"), Operand::based("Y", 3)],
    );

    assert_eq!(format!("{}", ldd), "ldd r24, [Y+0x3]");
}
