//! Tools for analysis of disassembled program code
//!
//! Decoding fills a `ListingDocument` and `ReferenceTable` from the raw
//! image; analyzer passes then refine both. Nothing here fails outright:
//! bytes that do not decode become unexplored entries and heuristics that do
//! not apply report `Outcome::NotFound`.

mod calls;
mod disasm;
mod libc;
mod pipeline;
mod reference;

pub use calls::CallTargetAnalyzer;
pub use disasm::{disassemble_from, disassemble_linear};
pub use libc::{Convention, LibcMainAnalyzer, LIBC_START_MAIN};
pub use pipeline::{Analyzer, Outcome, Pipeline};
pub use reference::{Reference, ReferenceKind, ReferenceTable};
