//! Decode loops that populate a listing from raw bytes

use crate::analysis::{Reference, ReferenceKind, ReferenceTable};
use crate::arch::Assembler;
use crate::ast::Instruction;
use crate::listing::{self, ListingDocument, SymbolKind};
use crate::memory::Buffer;
use crate::Address;
use log::debug;
use std::ops::Range;

/// Add a decoded instruction to the listing along with the references it
/// makes.
///
/// Call targets are named `sub_XXXX` and jump targets `loc_XXXX` unless
/// something already names them. Unless code and data live in separate
/// address spaces, statically resolvable memory operands also become `Read`
/// references to `data_XXXX`, or `Write` references when the operand is the
/// destination of a multi-operand instruction.
fn record(
    assembler: &dyn Assembler,
    document: &mut ListingDocument,
    references: &mut ReferenceTable,
    instr: Instruction,
) -> listing::Result<()> {
    let from = instr.address();
    let flow = instr.target().map(|target| (target, instr.is_call()));
    let data: Vec<_> = if assembler.is_harvard() {
        Vec::new()
    } else {
        let count = instr.iter_operands().count();

        instr
            .iter_operands()
            .enumerate()
            .filter_map(|(i, operand)| {
                let to = instr.memory_address(operand)?;
                let kind = if i == 0 && count > 1 {
                    ReferenceKind::Write
                } else {
                    ReferenceKind::Read
                };

                Some((to, kind))
            })
            .collect()
    };

    document.insert_instruction(instr)?;

    if let Some((target, is_call)) = flow {
        let (kind, symbol) = if is_call {
            (ReferenceKind::Call, SymbolKind::Function)
        } else {
            (ReferenceKind::Jump, SymbolKind::Label)
        };

        references.insert(Reference::new(from, target, kind));
        document.insert_placeholder(target, symbol);
    }

    for (to, kind) in data {
        references.insert(Reference::new(from, to, kind));
        document.insert_placeholder(to, SymbolKind::Data);
    }

    Ok(())
}

/// Mark the bytes at a rejected address as unexplored and return where to
/// resume.
fn reject(
    assembler: &dyn Assembler,
    buffer: &Buffer,
    document: &mut ListingDocument,
    address: Address,
) -> Address {
    let step = assembler.min_instruction_size().max(1);
    let size = buffer
        .window(address, step)
        .map_or(step, |window| window.len().max(1));

    document.mark_unexplored(address, size);

    address + size as Address
}

/// Whether `address` is already covered by code or data.
fn is_claimed(document: &ListingDocument, address: Address) -> bool {
    document
        .item_at(address)
        .map_or(false, |(_, item)| !item.is_unexplored())
}

/// Decode every address in `range` front to back.
///
/// Bytes that do not decode, or whose instruction would overlap one already
/// in the listing, become unexplored entries one minimum instruction step wide
/// and the sweep resumes after them. Returns the number of instructions
/// added.
pub fn disassemble_linear(
    assembler: &dyn Assembler,
    buffer: &Buffer,
    document: &mut ListingDocument,
    references: &mut ReferenceTable,
    range: Range<Address>,
) -> usize {
    let mut address = range.start;
    let mut decoded = 0;

    while address < range.end {
        if let Some((start, item)) = document.item_at(address) {
            if !item.is_unexplored() {
                address = start + item.size() as Address;
                continue;
            }
        }

        let failure = match assembler.decode(buffer, address) {
            Ok(instr) => {
                let next = instr.end_address();

                match record(assembler, document, references, instr) {
                    Ok(()) => {
                        decoded += 1;
                        address = next;
                        continue;
                    }
                    Err(e) => e.to_string(),
                }
            }
            Err(e) => e.to_string(),
        };

        debug!("Leaving {:#x} unexplored: {}", address, failure);
        address = reject(assembler, buffer, document, address);
    }

    decoded
}

/// Decode the code reachable from `start`.
///
/// Each flow is followed until it leaves the image, runs into code already in
/// the listing, or ends in an unconditional jump or return. Statically known
/// call and jump targets are queued as new flows. Returns the number of
/// instructions added.
pub fn disassemble_from(
    assembler: &dyn Assembler,
    buffer: &Buffer,
    document: &mut ListingDocument,
    references: &mut ReferenceTable,
    start: Address,
) -> usize {
    let mut pending = vec![start];
    let mut decoded = 0;

    while let Some(flow) = pending.pop() {
        if !buffer.is_mapped(flow) || is_claimed(document, flow) {
            continue;
        }

        debug!("Tracing code at {:#x}", flow);

        let mut address = flow;

        while buffer.is_mapped(address) && !is_claimed(document, address) {
            let instr = match assembler.decode(buffer, address) {
                Ok(instr) => instr,
                Err(e) => {
                    debug!("Leaving {:#x} unexplored: {}", address, e);
                    reject(assembler, buffer, document, address);
                    break;
                }
            };

            let next = instr.end_address();
            let falls_through = instr.falls_through();
            let target = instr.target();

            if let Err(e) = record(assembler, document, references, instr) {
                debug!("Flow at {:#x} collides with the listing: {}", address, e);
                break;
            }

            decoded += 1;
            pending.extend(target);

            if !falls_through {
                break;
            }

            address = next;
        }
    }

    decoded
}
