//! Locate `main` through the C runtime startup routine

use crate::analysis::{Analyzer, Outcome, Reference, ReferenceKind, ReferenceTable};
use crate::ast::{Instruction, Operand};
use crate::listing::{ListingDocument, SymbolKind};
use crate::memory::Buffer;
use crate::Address;
use log::{debug, warn};

/// Name of the glibc routine that `_start` hands `main` to.
pub const LIBC_START_MAIN: &str = "__libc_start_main";

/// How `_start` passes the address of `main` to the startup routine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Convention {
    /// i386: pushed on the stack as the routine's first argument.
    X86,

    /// x86-64 System V: loaded into `rdi`.
    X86_64,
}

/// Whether `name` spells the startup routine, including `@plt` stubs and
/// versioned imports such as `__libc_start_main@GLIBC_2.34`.
fn is_startup_name(name: &str) -> bool {
    name.split('@').next() == Some(LIBC_START_MAIN)
}

/// The straight-line run of instructions starting at `entry`, up to and
/// including the first one that does not fall through.
fn entry_block(document: &ListingDocument, entry: Address) -> Vec<&Instruction> {
    let mut block = Vec::new();
    let mut expected = entry;

    for instr in document.instructions_from(entry) {
        if instr.address() != expected {
            break;
        }

        block.push(instr);
        expected = instr.end_address();

        if !instr.falls_through() {
            break;
        }
    }

    block
}

/// Whether the code at `address` is a PLT-style trampoline: an unconditional
/// jump through a memory slot.
fn is_trampoline(document: &ListingDocument, address: Address) -> bool {
    document.instruction(address).map_or(false, |instr| {
        instr.is_jump()
            && !instr.is_conditional()
            && instr.operand(0).map_or(false, Operand::is_memory)
    })
}

/// Finds `main` by recognizing the call `_start` makes to
/// `__libc_start_main` and reading the argument it passes.
///
/// The routine is found by name first. When the binary carries no such
/// symbol, a call from the entry block to a trampoline is assumed to be it and
/// the trampoline is named after it. A listing that already has `main` is
/// left untouched.
#[derive(Copy, Clone, Debug)]
pub struct LibcMainAnalyzer {
    convention: Convention,
}

impl LibcMainAnalyzer {
    pub fn new(convention: Convention) -> Self {
        LibcMainAnalyzer { convention }
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    /// Code or import-slot address a call instruction goes through.
    fn call_destination(instr: &Instruction) -> Option<Address> {
        instr
            .target()
            .or_else(|| instr.memory_address(instr.operand(0)?))
    }

    /// Index into `block` of the call to the startup routine, and the
    /// routine's address.
    fn find_startup_call(
        document: &ListingDocument,
        block: &[&Instruction],
    ) -> Option<(usize, Address, bool)> {
        let named = block.iter().enumerate().find_map(|(i, instr)| {
            let destination = Self::call_destination(instr).filter(|_| instr.is_call())?;
            let symbol = document.symbol(destination)?;

            if is_startup_name(symbol.name()) {
                Some((i, destination, true))
            } else {
                None
            }
        });

        named.or_else(|| {
            block.iter().enumerate().find_map(|(i, instr)| {
                let target = instr.target().filter(|_| instr.is_call())?;

                if is_trampoline(document, target) {
                    Some((i, target, false))
                } else {
                    None
                }
            })
        })
    }

    /// The instruction that passes `main` and the address it passes.
    fn main_argument(
        &self,
        buffer: &Buffer,
        setup: &[&Instruction],
    ) -> Option<(Address, Address)> {
        match self.convention {
            Convention::X86 => {
                let push = setup.iter().rev().find(|instr| instr.mnemonic() == "push")?;
                let main = push.operand(0)?.immediate()?;

                Some((push.address(), main))
            }
            Convention::X86_64 => {
                let load = setup.iter().rev().find(|instr| {
                    matches!(instr.mnemonic(), "mov" | "lea")
                        && matches!(instr.operand(0).and_then(Operand::register), Some("rdi" | "edi"))
                })?;
                let source = load.operand(1)?;

                let main = match (load.mnemonic(), source) {
                    (_, Operand::Immediate(value)) => *value,
                    ("lea", _) => load.memory_address(source)?,

                    // A load through the GOT: the slot holds the address.
                    (_, _) => buffer.read_unit::<u64>(load.memory_address(source)?)?,
                };

                Some((load.address(), main))
            }
        }
    }
}

impl Analyzer for LibcMainAnalyzer {
    fn name(&self) -> &str {
        "libc main"
    }

    fn analyze(
        &self,
        document: &mut ListingDocument,
        buffer: &Buffer,
        references: &mut ReferenceTable,
    ) -> Outcome {
        if let Some(main) = document.symbol_by_name("main") {
            debug!("main is already known at {:#x}", main.address());
            return Outcome::Found(main.address());
        }

        let entry = match document.entry_point() {
            Some(entry) => entry,
            None => return Outcome::NotFound,
        };

        let block = entry_block(document, entry);
        let (index, stub, named) = match Self::find_startup_call(document, &block) {
            Some(found) => found,
            None => {
                debug!("No call to {} from {:#x}", LIBC_START_MAIN, entry);
                return Outcome::NotFound;
            }
        };

        let (from, main) = match self.main_argument(buffer, &block[..index]) {
            Some(found) => found,
            None => {
                debug!(
                    "Cannot find the main argument to the call at {:#x}",
                    block[index].address()
                );
                return Outcome::NotFound;
            }
        };

        if let Err(e) = document.rename_symbol(main, "main", SymbolKind::Function) {
            warn!("Cannot name main at {:#x}: {}", main, e);
            return Outcome::NotFound;
        }

        if !named {
            if let Err(e) = document.rename_symbol(stub, LIBC_START_MAIN, SymbolKind::Import) {
                warn!("Cannot name startup stub at {:#x}: {}", stub, e);
            }
        }

        references.insert(Reference::new(from, main, ReferenceKind::Read));

        Outcome::Found(main)
    }
}
