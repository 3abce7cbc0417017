//! Decoded instruction representation shared by every architecture

mod instr;
mod operand;

pub use instr::{Instruction, InstructionFlags};
pub use operand::{Operand, Update};

#[cfg(test)]
mod tests;
