//! Executable formats and the loaders that map them into memory.

mod binary;
mod traits;

pub use binary::{BinaryLoader, ID as BINARY};
pub use traits::{LoadRequest, Loader};
