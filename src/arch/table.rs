//! Masked opcode dispatch tables

use crate::arch::{DecodeError, Result};
use crate::ast::{Instruction, Operand};
use crate::memory::Buffer;
use crate::Address;
use num_traits::{PrimInt, Unsigned};
use std::mem;

/// Everything an opcode callback needs to finish decoding an instruction.
pub struct Context<'a, U> {
    pub buffer: &'a Buffer,

    /// Address of the instruction's first code unit.
    pub address: Address,

    /// The leading code unit, already matched against the entry.
    pub unit: U,

    /// Mnemonic of the matched entry.
    pub mnemonic: &'static str,
}

impl<'a, U> Context<'a, U>
where
    U: PrimInt + Unsigned,
{
    /// Read the code unit `index` units past the leading one.
    ///
    /// Instructions longer than one unit fail with `TruncatedInstruction` if
    /// the buffer runs out first.
    pub fn next_unit(&self, index: usize) -> Result<U> {
        let width = mem::size_of::<U>();
        let needed = width * (index + 1);

        self.buffer
            .read_unit(self.address + (width * index) as Address)
            .ok_or_else(|| {
                let available = self
                    .buffer
                    .window(self.address, needed)
                    .map_or(0, <[u8]>::len);

                DecodeError::truncated(self.address, needed, available)
            })
    }

    /// Start an instruction of `units` code units with this entry's mnemonic.
    pub fn instruction(&self, units: usize, operands: Vec<Operand>) -> Instruction {
        Instruction::new(
            self.address,
            units * mem::size_of::<U>(),
            self.mnemonic,
            operands,
        )
    }
}

/// Opcode callback: decodes operand fields for one table entry.
pub type DecodeFn<U> = fn(&Context<'_, U>) -> Result<Instruction>;

/// A single bit pattern in an opcode table.
pub struct Entry<U> {
    mask: U,
    value: U,
    mnemonic: &'static str,
    decode: DecodeFn<U>,
}

impl<U> Entry<U>
where
    U: PrimInt + Unsigned,
{
    pub fn mask(&self) -> U {
        self.mask
    }

    pub fn value(&self) -> U {
        self.value
    }

    pub fn mnemonic(&self) -> &'static str {
        self.mnemonic
    }

    pub fn matches(&self, unit: U) -> bool {
        unit & self.mask == self.value
    }

    /// Number of fixed bits in the pattern.
    pub fn specificity(&self) -> u32 {
        self.mask.count_ones()
    }
}

/// An immutable mapping from masked bit patterns to decode callbacks.
///
/// When several entries match a code unit, the entry with the most fixed mask
/// bits wins. Among equally specific entries the one registered first wins.
/// Both rules are part of each architecture's observable behavior.
pub struct OpcodeTable<U> {
    entries: Vec<Entry<U>>,
}

impl<U> Default for OpcodeTable<U>
where
    U: PrimInt + Unsigned,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<U> OpcodeTable<U>
where
    U: PrimInt + Unsigned,
{
    pub fn new() -> Self {
        OpcodeTable {
            entries: Vec::new(),
        }
    }

    /// Append an entry matching units where `unit & mask == value`.
    pub fn register(
        &mut self,
        mask: U,
        value: U,
        mnemonic: &'static str,
        decode: DecodeFn<U>,
    ) -> &mut Self {
        debug_assert!(
            value & !mask == U::zero(),
            "opcode {} has value bits outside its mask",
            mnemonic
        );

        self.entries.push(Entry {
            mask,
            value,
            mnemonic,
            decode,
        });

        self
    }

    /// Entries in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry<U>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry responsible for decoding `unit`.
    pub fn lookup(&self, unit: U) -> Option<&Entry<U>> {
        let mut best: Option<&Entry<U>> = None;

        for entry in self.entries.iter().filter(|e| e.matches(unit)) {
            match best {
                Some(current) if current.specificity() >= entry.specificity() => {}
                _ => best = Some(entry),
            }
        }

        best
    }

    /// Decode the instruction at `address` by dispatching on its leading
    /// code unit.
    pub fn decode(&self, buffer: &Buffer, address: Address) -> Result<Instruction> {
        let width = mem::size_of::<U>();
        let unit = buffer.read_unit::<U>(address).ok_or_else(|| {
            let available = buffer.window(address, width).map_or(0, <[u8]>::len);

            DecodeError::truncated(address, width, available)
        })?;

        let entry = self.lookup(unit).ok_or_else(|| {
            DecodeError::invalid_opcode(address, unit.to_u64().unwrap_or_default())
        })?;

        (entry.decode)(&Context {
            buffer,
            address,
            unit,
            mnemonic: entry.mnemonic,
        })
    }
}
