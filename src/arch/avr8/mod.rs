//! Atmel AVR 8-bit microcontrollers
//!
//! Instructions are one or two little-endian 16-bit words. Program memory is
//! word addressed on the chip, but every address handled here is a byte
//! address, so branch and call targets are doubled on decode.

mod dis;

pub use dis::OPCODES;

use crate::arch::{Assembler, Result};
use crate::ast::Instruction;
use crate::memory::Buffer;
use crate::Address;

/// Identity string of the AVR8 assembler.
pub const ID: &str = "avr8";

#[derive(Copy, Clone, Debug, Default)]
pub struct Avr8;

impl Assembler for Avr8 {
    fn id(&self) -> &str {
        ID
    }

    fn decode(&self, buffer: &Buffer, address: Address) -> Result<Instruction> {
        OPCODES.decode(buffer, address)
    }

    fn min_instruction_size(&self) -> usize {
        2
    }

    fn max_instruction_size(&self) -> usize {
        4
    }

    /// SRAM and program flash are separate buses.
    fn is_harvard(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests;
