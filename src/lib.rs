//! Retargetable disassembly engine.
//!
//! A `Loader` maps an executable into a `Buffer`, an `Assembler` decodes
//! instructions out of it into a `ListingDocument` and `ReferenceTable`, and a
//! `Pipeline` of analyzer passes refines the result. The whole `Session` can
//! be written to and restored from a compact database file.

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate serde_plain;

pub mod analysis;
pub mod arch;
pub mod ast;
pub mod database;
pub mod listing;
pub mod memory;
pub mod platform;
pub mod registry;
pub mod session;

/// An absolute address within a loaded image.
pub type Address = u64;

pub use analysis::{Analyzer, Outcome, Pipeline, Reference, ReferenceKind, ReferenceTable};
pub use arch::{Assembler, DecodeError};
pub use ast::{Instruction, InstructionFlags, Operand};
pub use listing::{ListingDocument, ListingItem, Symbol, SymbolKind};
pub use memory::{Buffer, Segment};
pub use platform::{LoadRequest, Loader};
pub use registry::Registry;
pub use session::Session;
