//! Error type for listing edits

use crate::Address;
use std::result;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The new entry would share bytes with decoded code or data.
    #[error("{start:#x}..{end:#x} overlaps existing entry at {existing:#x}")]
    Overlap {
        start: Address,
        end: Address,
        existing: Address,
    },

    #[error("zero-sized entry at {0:#x}")]
    Empty(Address),

    /// Another address already carries this name.
    #[error("symbol {name} is already defined at {address:#x}")]
    NameTaken { name: String, address: Address },
}

pub type Result<T> = result::Result<T, Error>;
