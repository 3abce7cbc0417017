//! Instruction AST type

use crate::ast::Operand;
use crate::Address;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::{fmt, slice};

bitflags! {
    /// Control flow properties of a decoded instruction.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct InstructionFlags: u8 {
        const CALL = 0b0000_0001;
        const JUMP = 0b0000_0010;
        const CONDITIONAL = 0b0000_0100;
        const RETURN = 0b0000_1000;

        /// Execution does not continue past this instruction (e.g. `hlt`).
        const STOP = 0b0001_0000;
    }
}

/// One decoded machine instruction.
///
/// Everything except the comment list is fixed at decode time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    address: Address,
    size: usize,
    mnemonic: String,
    operands: Vec<Operand>,
    flags: InstructionFlags,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    comments: Vec<String>,
}

impl Instruction {
    pub fn new(address: Address, size: usize, mnemonic: &str, operands: Vec<Operand>) -> Self {
        Instruction {
            address,
            size,
            mnemonic: mnemonic.to_string(),
            operands,
            flags: InstructionFlags::empty(),
            comments: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: InstructionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The address of the next sequential instruction.
    pub fn end_address(&self) -> Address {
        self.address + self.size as Address
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn iter_operands(&self) -> slice::Iter<'_, Operand> {
        self.operands.iter()
    }

    pub fn operand(&self, index: usize) -> Option<&Operand> {
        self.operands.get(index)
    }

    pub fn flags(&self) -> InstructionFlags {
        self.flags
    }

    pub fn is_call(&self) -> bool {
        self.flags.contains(InstructionFlags::CALL)
    }

    pub fn is_jump(&self) -> bool {
        self.flags.contains(InstructionFlags::JUMP)
    }

    pub fn is_conditional(&self) -> bool {
        self.flags.contains(InstructionFlags::CONDITIONAL)
    }

    pub fn is_return(&self) -> bool {
        self.flags.contains(InstructionFlags::RETURN)
    }

    /// Whether execution may continue at `end_address` after this
    /// instruction.
    pub fn falls_through(&self) -> bool {
        if self.flags.intersects(InstructionFlags::RETURN | InstructionFlags::STOP) {
            return false;
        }

        !self.is_jump() || self.is_conditional()
    }

    /// The statically known code address this instruction transfers control
    /// to, if any.
    pub fn target(&self) -> Option<Address> {
        if !self.flags.intersects(InstructionFlags::CALL | InstructionFlags::JUMP) {
            return None;
        }

        self.operands.iter().find_map(Operand::target)
    }

    /// Resolve a memory operand of this instruction to an absolute address.
    ///
    /// Only absolute and PC-relative operands can be resolved statically.
    pub fn memory_address(&self, operand: &Operand) -> Option<Address> {
        match operand {
            Operand::Memory {
                base: None,
                displacement,
                ..
            } => Some(*displacement as Address),
            Operand::Memory {
                base: Some(base),
                displacement,
                ..
            } if base == "rip" || base == "pc" => {
                Some((self.end_address() as i64).wrapping_add(*displacement) as Address)
            }
            _ => None,
        }
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn add_comment(&mut self, comment: &str) {
        if !self.comments.iter().any(|c| c == comment) {
            self.comments.push(comment.to_string());
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;

        for (i, operand) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " {}", operand)?;
            } else {
                write!(f, ", {}", operand)?;
            }
        }

        Ok(())
    }
}
