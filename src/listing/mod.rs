//! The listing: decoded instructions, data, and symbols keyed by address.

mod document;
mod error;
mod symbol;

pub use document::{ListingDocument, ListingItem};
pub use error::{Error, Result};
pub use symbol::{Symbol, SymbolKind, Visibility};
