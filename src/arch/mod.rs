//! Instruction decoders for the architectures this engine can analyze.
//!
//! Each architecture is implemented as a child module to this one and exposes
//! a type implementing `Assembler`. Decoders are pure: they read the buffer
//! and produce an `Instruction`, leaving the listing untouched. Most of them
//! are expected to be built on an `OpcodeTable`, which matches the leading
//! code unit of an instruction against masked bit patterns and hands the
//! operand fields to a per-opcode callback.

pub mod avr8;

mod error;
mod table;
mod traits;

pub use error::{DecodeError, Result};
pub use table::{Context, DecodeFn, Entry, OpcodeTable};
pub use traits::Assembler;

#[cfg(test)]
mod tests;
